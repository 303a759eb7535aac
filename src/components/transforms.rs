// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Response transforms applied during playback.

use super::condition::{allows, ApplyCondition};
use super::entry::insert_header;
use super::{Component, RecordEntry, Transform};
use crate::args::Args;
use crate::catalog::{ComponentDescriptor, Namespace, ParamDefault, ParamKind, ParameterSpec};
use std::sync::Arc;

const CONDITION_ONLY: &[ParameterSpec] = &[ParameterSpec::optional(
    "condition",
    ParamKind::Object("ApplyCondition"),
    ParamDefault::Null,
)];

pub static HEADER_TRANSFORM: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Transform,
    type_name: "HeaderTransform",
    params: &[
        ParameterSpec::required("key", ParamKind::String),
        ParameterSpec::required("value", ParamKind::String),
        ParameterSpec::optional(
            "condition",
            ParamKind::Object("ApplyCondition"),
            ParamDefault::Null,
        ),
    ],
    construct: construct_header_transform,
};

pub static STORAGE_REQUEST_ID_TRANSFORM: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Transform,
    type_name: "StorageRequestIdTransform",
    params: CONDITION_ONLY,
    construct: |args| construct_echo(args, "x-ms-client-request-id"),
};

pub static CLIENT_ID_TRANSFORM: ComponentDescriptor = ComponentDescriptor {
    namespace: Namespace::Transform,
    type_name: "ClientIdTransform",
    params: CONDITION_ONLY,
    construct: |args| construct_echo(args, "x-ms-client-id"),
};

/// Sets a fixed response header.
#[derive(Debug)]
pub struct HeaderTransform {
    key: String,
    value: String,
    condition: Option<ApplyCondition>,
}

fn construct_header_transform(args: &Args) -> anyhow::Result<Component> {
    Ok(Component::Transform(Arc::new(HeaderTransform {
        key: args.str("key")?.to_string(),
        value: args.str("value")?.to_string(),
        condition: args.condition("condition")?,
    })))
}

impl Transform for HeaderTransform {
    fn apply(&self, entry: &mut RecordEntry) {
        if allows(&self.condition, entry) {
            insert_header(&mut entry.response_headers, &self.key, &self.value);
        }
    }
}

/// Copies a request header onto the response, so clients that correlate
/// by request id see their own id echoed back.
#[derive(Debug)]
pub struct EchoHeaderTransform {
    header: &'static str,
    condition: Option<ApplyCondition>,
}

fn construct_echo(args: &Args, header: &'static str) -> anyhow::Result<Component> {
    Ok(Component::Transform(Arc::new(EchoHeaderTransform {
        header,
        condition: args.condition("condition")?,
    })))
}

impl Transform for EchoHeaderTransform {
    fn apply(&self, entry: &mut RecordEntry) {
        if !allows(&self.condition, entry) {
            return;
        }
        if let Some(v) = entry.request_headers.get(self.header).cloned() {
            entry.response_headers.insert(self.header, v);
        }
    }
}
