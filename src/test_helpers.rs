// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::builder::ComponentBuilder;
use crate::catalog::Catalog;
use crate::components::Sanitizer;
use crate::service::ComponentSpec;
use serde_json::{json, Value};
use std::sync::Arc;

/// Builder over the built-in catalog.
pub fn make_builder() -> ComponentBuilder<'static> {
    ComponentBuilder::new(Catalog::builtin())
}

/// Arguments for a `HeaderRegex` sanitizer that masks bearer tokens.
pub fn bearer_args() -> Value {
    json!({"regex": "Bearer .*", "value": "Bearer ****"})
}

/// A built `HeaderRegex` sanitizer with minimal arguments.
pub fn make_sanitizer() -> Arc<dyn Sanitizer> {
    make_builder()
        .build_sanitizer("HeaderRegex", Some(&json!({"regex": "a", "value": "b"})))
        .expect("HeaderRegex builds")
}

pub fn spec(name: &str, body: Value) -> ComponentSpec {
    ComponentSpec::new(name, body)
}
