// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Regex-driven sanitizers and header removal.

use super::condition::{allows, ApplyCondition};
use super::{compile_regex, Component, RecordEntry, Sanitizer};
use crate::args::Args;
use crate::catalog::{ComponentDescriptor, Namespace, ParamDefault, ParamKind, ParameterSpec};
use crate::error::BuildError;
use hyper::header::HeaderValue;
use hyper::HeaderMap;
use regex::{Captures, NoExpand, Regex};
use std::sync::Arc;

const REGEX_PARAMS: &[ParameterSpec] = &[
    ParameterSpec::required("regex", ParamKind::String),
    ParameterSpec::required("value", ParamKind::String),
    ParameterSpec::optional("groupForReplace", ParamKind::String, ParamDefault::Null),
    ParameterSpec::optional(
        "condition",
        ParamKind::Object("ApplyCondition"),
        ParamDefault::Null,
    ),
];

pub static HEADER_REGEX: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Sanitizer,
    type_name: "HeaderRegex",
    params: &[
        ParameterSpec::required("regex", ParamKind::String),
        ParameterSpec::required("value", ParamKind::String),
        ParameterSpec::optional("key", ParamKind::String, ParamDefault::Null),
        ParameterSpec::optional("groupForReplace", ParamKind::String, ParamDefault::Null),
        ParameterSpec::optional(
            "condition",
            ParamKind::Object("ApplyCondition"),
            ParamDefault::Null,
        ),
    ],
    construct: construct_header_regex,
};

pub static URI_REGEX: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Sanitizer,
    type_name: "UriRegex",
    params: REGEX_PARAMS,
    construct: |args| construct_regex(args, Target::URI),
};

pub static BODY_REGEX: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Sanitizer,
    type_name: "BodyRegex",
    params: REGEX_PARAMS,
    construct: |args| construct_regex(args, Target::BODIES),
};

pub static GENERAL_REGEX: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Sanitizer,
    type_name: "GeneralRegex",
    params: REGEX_PARAMS,
    construct: |args| construct_regex(args, Target::ALL),
};

pub static REMOVE_HEADER: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Sanitizer,
    type_name: "RemoveHeader",
    params: &[
        ParameterSpec::required("headersForRemoval", ParamKind::String),
        ParameterSpec::optional(
            "condition",
            ParamKind::Object("ApplyCondition"),
            ParamDefault::Null,
        ),
    ],
    construct: construct_remove_header,
};

/// Which parts of an entry a regex sanitizer rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    uri: bool,
    headers: bool,
    bodies: bool,
}

impl Target {
    const URI: Target = Target {
        uri: true,
        headers: false,
        bodies: false,
    };
    const HEADERS: Target = Target {
        uri: false,
        headers: true,
        bodies: false,
    };
    const BODIES: Target = Target {
        uri: false,
        headers: false,
        bodies: true,
    };
    const ALL: Target = Target {
        uri: true,
        headers: true,
        bodies: true,
    };
}

#[derive(Debug)]
pub struct RegexSanitizer {
    target: Target,
    regex: Regex,
    value: String,
    group: Option<String>,
    header_key: Option<String>,
    condition: Option<ApplyCondition>,
}

fn construct_header_regex(args: &Args) -> anyhow::Result<Component> {
    let mut sanitizer = RegexSanitizer::from_args(args, Target::HEADERS)?;
    sanitizer.header_key = args.opt_str("key")?.map(str::to_ascii_lowercase);
    Ok(Component::Sanitizer(Arc::new(sanitizer)))
}

fn construct_regex(args: &Args, target: Target) -> anyhow::Result<Component> {
    Ok(Component::Sanitizer(Arc::new(RegexSanitizer::from_args(
        args, target,
    )?)))
}

impl RegexSanitizer {
    fn from_args(args: &Args, target: Target) -> anyhow::Result<Self> {
        let regex = compile_regex("regex", args.str("regex")?)?;
        let group = args.opt_str("groupForReplace")?.map(str::to_string);
        if let Some(g) = &group {
            if !has_group(&regex, g) {
                return Err(BuildError::invalid(format!(
                    "Group \"{}\" for parameter \"groupForReplace\" does not exist in expression {}.",
                    g,
                    regex.as_str()
                ))
                .into());
            }
        }
        Ok(Self {
            target,
            regex,
            value: args.str("value")?.to_string(),
            group,
            header_key: None,
            condition: args.condition("condition")?,
        })
    }

    fn replace(&self, input: &str) -> String {
        replace_value(&self.regex, input, &self.value, self.group.as_deref())
    }

    fn rewrite_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in headers.iter_mut() {
            if let Some(key) = &self.header_key {
                if name.as_str() != key {
                    continue;
                }
            }
            let Ok(current) = value.to_str() else {
                continue;
            };
            let replaced = self.replace(current);
            if replaced != current {
                if let Ok(v) = HeaderValue::from_str(&replaced) {
                    *value = v;
                }
            }
        }
    }
}

impl Sanitizer for RegexSanitizer {
    fn sanitize(&self, entry: &mut RecordEntry) {
        if !allows(&self.condition, entry) {
            return;
        }
        if self.target.uri {
            entry.request_uri = self.replace(&entry.request_uri);
        }
        if self.target.headers {
            self.rewrite_headers(&mut entry.request_headers);
            self.rewrite_headers(&mut entry.response_headers);
        }
        if self.target.bodies {
            for body in [&mut entry.request_body, &mut entry.response_body]
                .into_iter()
                .flatten()
            {
                *body = self.replace(body);
            }
        }
    }
}

/// True when `group` is a capture group name in `regex`, or the index of one.
fn has_group(regex: &Regex, group: &str) -> bool {
    regex.capture_names().flatten().any(|n| n == group)
        || group
            .parse::<usize>()
            .is_ok_and(|i| i < regex.captures_len())
}

/// Replace every match of `regex` with `value`. When `group` names or numbers
/// a capture group, only that group inside each match is replaced.
pub(crate) fn replace_value(regex: &Regex, input: &str, value: &str, group: Option<&str>) -> String {
    let Some(group) = group else {
        return regex.replace_all(input, NoExpand(value)).into_owned();
    };
    regex
        .replace_all(input, |caps: &Captures| {
            let Some(whole) = caps.get(0) else {
                return String::new();
            };
            let target = caps
                .name(group)
                .or_else(|| group.parse::<usize>().ok().and_then(|i| caps.get(i)));
            match target {
                Some(m) => {
                    let text = whole.as_str();
                    let start = m.start() - whole.start();
                    let end = m.end() - whole.start();
                    format!("{}{}{}", &text[..start], value, &text[end..])
                }
                None => whole.as_str().to_string(),
            }
        })
        .into_owned()
}

#[derive(Debug)]
pub struct RemoveHeaderSanitizer {
    headers: Vec<String>,
    condition: Option<ApplyCondition>,
}

fn construct_remove_header(args: &Args) -> anyhow::Result<Component> {
    let headers: Vec<String> = args
        .str("headersForRemoval")?
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    if headers.is_empty() {
        return Err(BuildError::invalid(
            "Parameter \"headersForRemoval\" must name at least one header.",
        )
        .into());
    }
    Ok(Component::Sanitizer(Arc::new(RemoveHeaderSanitizer {
        headers,
        condition: args.condition("condition")?,
    })))
}

impl Sanitizer for RemoveHeaderSanitizer {
    fn sanitize(&self, entry: &mut RecordEntry) {
        if !allows(&self.condition, entry) {
            return;
        }
        for name in &self.headers {
            entry.request_headers.remove(name.as_str());
            entry.response_headers.remove(name.as_str());
        }
    }
}
