// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! `ApplyCondition`: restricts a sanitizer or transform to matching URIs.

use super::{compile_regex, Component, RecordEntry};
use crate::args::Args;
use crate::catalog::{ComponentDescriptor, Namespace, ParamKind, ParameterSpec};
use regex::Regex;

pub static APPLY_CONDITION: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Argument,
    type_name: "ApplyCondition",
    params: &[ParameterSpec::required("uriRegex", ParamKind::String)],
    construct: ApplyCondition::construct,
};

#[derive(Debug, Clone)]
pub struct ApplyCondition {
    uri_regex: Regex,
}

impl ApplyCondition {
    fn construct(args: &Args) -> anyhow::Result<Component> {
        let uri_regex = compile_regex("uriRegex", args.str("uriRegex")?)?;
        Ok(Component::Condition(Self { uri_regex }))
    }

    pub fn applies(&self, entry: &RecordEntry) -> bool {
        self.uri_regex.is_match(&entry.request_uri)
    }
}

/// True when there is no condition or the condition holds.
pub(crate) fn allows(condition: &Option<ApplyCondition>, entry: &RecordEntry) -> bool {
    condition.as_ref().map_or(true, |c| c.applies(entry))
}
