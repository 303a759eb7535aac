// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Request matchers used during playback.

use super::{Component, Matcher, RecordEntry};
use crate::args::Args;
use crate::catalog::{ComponentDescriptor, Namespace, ParamDefault, ParamKind, ParameterSpec};
use hyper::HeaderMap;
use std::sync::Arc;

pub static CUSTOM_DEFAULT_MATCHER: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Matcher,
    type_name: "CustomDefaultMatcher",
    params: &[
        ParameterSpec::optional("compareBodies", ParamKind::Bool, ParamDefault::Bool(true)),
        ParameterSpec::optional("excludedHeaders", ParamKind::String, ParamDefault::Str("")),
        ParameterSpec::optional("ignoredHeaders", ParamKind::String, ParamDefault::Str("")),
        ParameterSpec::optional(
            "ignoredQueryParameters",
            ParamKind::String,
            ParamDefault::Str(""),
        ),
        ParameterSpec::optional(
            "ignoreQueryOrdering",
            ParamKind::Bool,
            ParamDefault::Bool(false),
        ),
    ],
    construct: construct_custom_default,
};

pub static BODILESS_MATCHER: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Matcher,
    type_name: "BodilessMatcher",
    params: &[],
    construct: |_| {
        Ok(Component::Matcher(Arc::new(RecordMatcher {
            compare_bodies: false,
            ..RecordMatcher::default()
        })))
    },
};

pub static HEADERLESS_MATCHER: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Matcher,
    type_name: "HeaderlessMatcher",
    params: &[],
    construct: |_| {
        Ok(Component::Matcher(Arc::new(RecordMatcher {
            compare_headers: false,
            ..RecordMatcher::default()
        })))
    },
};

/// Compares method, URI, headers and optionally bodies.
///
/// Excluded headers are not looked at. Ignored headers must be present on
/// both sides but their values may differ.
#[derive(Debug, Clone)]
pub struct RecordMatcher {
    compare_bodies: bool,
    compare_headers: bool,
    excluded_headers: Vec<String>,
    ignored_headers: Vec<String>,
    ignored_query_parameters: Vec<String>,
    ignore_query_ordering: bool,
}

impl Default for RecordMatcher {
    fn default() -> Self {
        Self {
            compare_bodies: true,
            compare_headers: true,
            excluded_headers: Vec::new(),
            ignored_headers: Vec::new(),
            ignored_query_parameters: Vec::new(),
            ignore_query_ordering: false,
        }
    }
}

fn split_list(raw: Option<&str>, lowercase: bool) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if lowercase {
                s.to_ascii_lowercase()
            } else {
                s.to_string()
            }
        })
        .collect()
}

fn construct_custom_default(args: &Args) -> anyhow::Result<Component> {
    Ok(Component::Matcher(Arc::new(RecordMatcher {
        compare_bodies: args.bool("compareBodies")?,
        compare_headers: true,
        excluded_headers: split_list(args.opt_str("excludedHeaders")?, true),
        ignored_headers: split_list(args.opt_str("ignoredHeaders")?, true),
        ignored_query_parameters: split_list(args.opt_str("ignoredQueryParameters")?, false),
        ignore_query_ordering: args.bool("ignoreQueryOrdering")?,
    })))
}

impl RecordMatcher {
    fn normalize_uri(&self, uri: &str) -> String {
        let Some((base, query)) = uri.split_once('?') else {
            return uri.to_string();
        };
        let mut pairs: Vec<&str> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split_once('=').map_or(*p, |(k, _)| k);
                !self.ignored_query_parameters.iter().any(|i| i == key)
            })
            .collect();
        if self.ignore_query_ordering {
            pairs.sort_unstable();
        }
        if pairs.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, pairs.join("&"))
        }
    }

    fn headers_match(&self, request: &HeaderMap, recorded: &HeaderMap) -> bool {
        let considered = |name: &str| !self.excluded_headers.iter().any(|h| h == name);
        let names = request
            .keys()
            .chain(recorded.keys())
            .map(|n| n.as_str())
            .filter(|n| considered(*n));
        for name in names {
            if !request.contains_key(name) || !recorded.contains_key(name) {
                return false;
            }
            if self.ignored_headers.iter().any(|h| h == name) {
                continue;
            }
            // Every value counts, in order.
            if !request
                .get_all(name)
                .iter()
                .eq(recorded.get_all(name).iter())
            {
                return false;
            }
        }
        true
    }
}

impl Matcher for RecordMatcher {
    fn is_match(&self, request: &RecordEntry, recorded: &RecordEntry) -> bool {
        if !request
            .request_method
            .eq_ignore_ascii_case(&recorded.request_method)
        {
            return false;
        }
        if self.normalize_uri(&request.request_uri) != self.normalize_uri(&recorded.request_uri) {
            return false;
        }
        if self.compare_headers
            && !self.headers_match(&request.request_headers, &recorded.request_headers)
        {
            return false;
        }
        !self.compare_bodies || request.request_body == recorded.request_body
    }
}
