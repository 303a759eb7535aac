// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Decoded constructor arguments.

use crate::components::condition::ApplyCondition;
use crate::components::Component;
use serde_json::{Map, Value};

/// A single decoded argument.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Null,
    Str(String),
    Bool(bool),
    /// Nested object built into a live value, with the JSON it came from.
    Object { component: Component, raw: Value },
}

impl ArgValue {
    /// Null and empty strings count as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            ArgValue::Null => true,
            ArgValue::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "Null",
            ArgValue::Str(_) => "String",
            ArgValue::Bool(_) => "Boolean",
            ArgValue::Object { .. } => "Object",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ArgValue::Null => Value::Null,
            ArgValue::Str(s) => Value::String(s.clone()),
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Object { raw, .. } => raw.clone(),
        }
    }
}

/// Arguments in constructor declaration order.
#[derive(Debug, Clone)]
pub struct Args {
    type_name: &'static str,
    values: Vec<(&'static str, ArgValue)>,
}

impl Args {
    pub fn new(type_name: &'static str, values: Vec<(&'static str, ArgValue)>) -> Self {
        Self { type_name, values }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }

    /// String argument; null reads as the empty string.
    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        match self.get(name) {
            Some(ArgValue::Str(s)) => Ok(s),
            Some(ArgValue::Null) => Ok(""),
            other => Err(self.mismatch(name, "string", other)),
        }
    }

    /// String argument that is absent when null or empty.
    pub fn opt_str(&self, name: &str) -> anyhow::Result<Option<&str>> {
        match self.get(name) {
            Some(ArgValue::Str(s)) if !s.is_empty() => Ok(Some(s)),
            Some(ArgValue::Str(_)) | Some(ArgValue::Null) => Ok(None),
            other => Err(self.mismatch(name, "string", other)),
        }
    }

    pub fn bool(&self, name: &str) -> anyhow::Result<bool> {
        match self.get(name) {
            Some(ArgValue::Bool(b)) => Ok(*b),
            other => Err(self.mismatch(name, "boolean", other)),
        }
    }

    pub fn condition(&self, name: &str) -> anyhow::Result<Option<ApplyCondition>> {
        match self.get(name) {
            Some(ArgValue::Object {
                component: Component::Condition(c),
                ..
            }) => Ok(Some(c.clone())),
            Some(ArgValue::Null) => Ok(None),
            other => Err(self.mismatch(name, "ApplyCondition", other)),
        }
    }

    /// JSON view of the resolved arguments, defaults included.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    fn mismatch(&self, name: &str, expected: &str, got: Option<&ArgValue>) -> anyhow::Error {
        match got {
            Some(v) => anyhow::anyhow!(
                "{}: parameter '{}' expected {}, got {}",
                self.type_name,
                name,
                expected,
                v.kind_name()
            ),
            None => anyhow::anyhow!("{}: parameter '{}' is not declared", self.type_name, name),
        }
    }
}
