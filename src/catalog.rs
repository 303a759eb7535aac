// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Static catalog of constructible component types.
//!
//! Every plugin type publishes one [`ComponentDescriptor`]: its namespace, its
//! wire-level type name, the ordered list of constructor parameters and the
//! constructor function itself. The catalog is assembled once at startup and
//! is read-only afterwards, so lookups need no synchronization.

use crate::args::{ArgValue, Args};
use crate::components::Component;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Family a component type belongs to.
///
/// `Argument` holds structured values that only appear nested inside another
/// component's arguments (e.g. `ApplyCondition`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Sanitizer,
    Matcher,
    Transform,
    Argument,
}

impl Namespace {
    /// Parameters that may be supplied as null or empty string.
    pub fn nullable_params(&self) -> &'static [&'static str] {
        match self {
            Namespace::Sanitizer => &["value"],
            _ => &[],
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Sanitizer => "Sanitizers",
            Namespace::Matcher => "Matchers",
            Namespace::Transform => "Transforms",
            Namespace::Argument => "Arguments",
        };
        f.write_str(s)
    }
}

/// Declared kind of a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Bool,
    /// Structured value built from a nested JSON object by the named
    /// `Argument` type.
    Object(&'static str),
}

/// Value used when an optional parameter is absent from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Null,
    Bool(bool),
    Str(&'static str),
}

impl ParamDefault {
    pub fn to_value(self) -> ArgValue {
        match self {
            ParamDefault::Null => ArgValue::Null,
            ParamDefault::Bool(b) => ArgValue::Bool(b),
            ParamDefault::Str(s) => ArgValue::Str(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: ParamDefault,
}

impl ParameterSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: ParamDefault::Null,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, default: ParamDefault) -> Self {
        Self {
            name,
            kind,
            required: false,
            default,
        }
    }
}

/// Constructor invoked with the assembled, ordered argument list.
///
/// Validation failures should be returned as a [`crate::error::BuildError`]
/// so the builder can surface them unchanged; anything else is treated as an
/// unexpected construction failure.
pub type Constructor = fn(&Args) -> anyhow::Result<Component>;

pub struct ComponentDescriptor {
    pub namespace: Namespace,
    pub type_name: &'static str,
    pub params: &'static [ParameterSpec],
    pub construct: Constructor,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("namespace", &self.namespace)
            .field("type_name", &self.type_name)
            .field("params", &self.params)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    entries: HashMap<(Namespace, &'static str), &'static ComponentDescriptor>,
}

impl Catalog {
    /// Build a catalog from a set of descriptors. Later entries with the same
    /// namespace and type name replace earlier ones.
    pub fn new<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'static ComponentDescriptor>,
    {
        let entries = descriptors
            .into_iter()
            .map(|d| ((d.namespace, d.type_name), d))
            .collect();
        Self { entries }
    }

    /// Process-wide catalog of the built-in component types.
    pub fn builtin() -> &'static Catalog {
        static BUILTIN: OnceLock<Catalog> = OnceLock::new();
        BUILTIN.get_or_init(|| Catalog::new(crate::components::BUILTINS.iter().copied()))
    }

    pub fn lookup(
        &self,
        namespace: Namespace,
        type_name: &str,
    ) -> Option<&'static ComponentDescriptor> {
        self.entries.get(&(namespace, type_name)).copied()
    }

    /// Sorted type names registered under a namespace.
    pub fn type_names(&self, namespace: Namespace) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .entries
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, name)| *name)
            .collect();
        names.sort_unstable();
        names
    }
}
