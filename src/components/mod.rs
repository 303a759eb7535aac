// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Built-in sanitizer, matcher and transform plugins.
//!
//! New plugin types are added by writing a constructor, publishing a
//! [`ComponentDescriptor`] for it and listing it in [`BUILTINS`]. Nothing in
//! the builder needs to change.

use crate::catalog::ComponentDescriptor;
use std::fmt;
use std::sync::Arc;

pub mod condition;
pub mod entry;
pub mod matchers;
pub mod sanitizers;
pub mod transforms;

pub use entry::RecordEntry;

/// Rewrites secrets out of a recorded entry.
pub trait Sanitizer: Send + Sync + fmt::Debug {
    fn sanitize(&self, entry: &mut RecordEntry);
}

/// Decides whether a live request corresponds to a recorded one.
pub trait Matcher: Send + Sync + fmt::Debug {
    fn is_match(&self, request: &RecordEntry, recorded: &RecordEntry) -> bool;
}

/// Adjusts a played-back response for the request that asked for it.
pub trait Transform: Send + Sync + fmt::Debug {
    fn apply(&self, entry: &mut RecordEntry);
}

/// A live instance produced by the component builder.
#[derive(Debug, Clone)]
pub enum Component {
    Sanitizer(Arc<dyn Sanitizer>),
    Matcher(Arc<dyn Matcher>),
    Transform(Arc<dyn Transform>),
    Condition(condition::ApplyCondition),
}

pub static BUILTINS: &[&ComponentDescriptor] = &[
    &sanitizers::HEADER_REGEX,
    &sanitizers::URI_REGEX,
    &sanitizers::BODY_REGEX,
    &sanitizers::GENERAL_REGEX,
    &sanitizers::REMOVE_HEADER,
    &matchers::CUSTOM_DEFAULT_MATCHER,
    &matchers::BODILESS_MATCHER,
    &matchers::HEADERLESS_MATCHER,
    &transforms::HEADER_TRANSFORM,
    &transforms::STORAGE_REQUEST_ID_TRANSFORM,
    &transforms::CLIENT_ID_TRANSFORM,
    &condition::APPLY_CONDITION,
];

/// Compile a user-supplied pattern, reporting a bad pattern as a client error.
pub(crate) fn compile_regex(param: &str, pattern: &str) -> anyhow::Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| {
        crate::error::BuildError::invalid(format!(
            "Expression of value {} for parameter \"{}\" does not compile: {}",
            pattern, param, e
        ))
        .into()
    })
}
