// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Generic JSON-to-instance construction.
//!
//! [`ComponentBuilder::build`] resolves a descriptor from the catalog, walks
//! its parameters in declaration order, decodes each matching body field by
//! its JSON kind and hands the assembled [`Args`] to the constructor. Nested
//! objects are built recursively into the parameter's declared `Argument`
//! type. Building never touches the registry.

use crate::args::{ArgValue, Args};
use crate::catalog::{Catalog, ComponentDescriptor, Namespace, ParamKind, ParameterSpec};
use crate::components::{Component, Matcher, Sanitizer, Transform};
use crate::error::BuildError;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ComponentBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> ComponentBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn build(
        &self,
        namespace: Namespace,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<Component, BuildError> {
        self.build_resolved(namespace, type_name, args)
            .map(|(component, _)| component)
    }

    /// Like [`ComponentBuilder::build`], also returning the argument list the
    /// constructor received, with defaults filled in.
    pub fn build_resolved(
        &self,
        namespace: Namespace,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<(Component, Args), BuildError> {
        let descriptor =
            self.catalog
                .lookup(namespace, type_name)
                .ok_or_else(|| BuildError::UnknownType {
                    namespace,
                    type_name: type_name.to_string(),
                })?;

        let body = match args {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(BuildError::UnsupportedValueKind {
                    type_name: type_name.to_string(),
                    param: "(body)".to_string(),
                    kind: json_kind(other),
                })
            }
        };
        debug!(%namespace, type_name, ?body, "building component");

        let mut values = Vec::with_capacity(descriptor.params.len());
        for spec in descriptor.params {
            values.push((spec.name, self.resolve_param(descriptor, spec, body)?));
        }
        let args = Args::new(descriptor.type_name, values);

        let component = (descriptor.construct)(&args).map_err(|e| match e.downcast::<BuildError>() {
            Ok(structured) => structured,
            Err(other) => BuildError::construction_failed(descriptor.type_name, other),
        })?;
        Ok((component, args))
    }

    pub fn build_sanitizer(
        &self,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<Arc<dyn Sanitizer>, BuildError> {
        self.build_sanitizer_resolved(type_name, args)
            .map(|(sanitizer, _)| sanitizer)
    }

    pub fn build_sanitizer_resolved(
        &self,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<(Arc<dyn Sanitizer>, Args), BuildError> {
        match self.build_resolved(Namespace::Sanitizer, type_name, args)? {
            (Component::Sanitizer(s), resolved) => Ok((s, resolved)),
            (other, _) => Err(unexpected_component(type_name, "sanitizer", &other)),
        }
    }

    pub fn build_matcher(
        &self,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<Arc<dyn Matcher>, BuildError> {
        match self.build(Namespace::Matcher, type_name, args)? {
            Component::Matcher(m) => Ok(m),
            other => Err(unexpected_component(type_name, "matcher", &other)),
        }
    }

    pub fn build_transform(
        &self,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<Arc<dyn Transform>, BuildError> {
        match self.build(Namespace::Transform, type_name, args)? {
            Component::Transform(t) => Ok(t),
            other => Err(unexpected_component(type_name, "transform", &other)),
        }
    }

    fn resolve_param(
        &self,
        descriptor: &ComponentDescriptor,
        spec: &ParameterSpec,
        body: Option<&Map<String, Value>>,
    ) -> Result<ArgValue, BuildError> {
        let Some(raw) = body.and_then(|b| b.get(spec.name)) else {
            if spec.required {
                return Err(BuildError::MissingRequiredParameter {
                    type_name: descriptor.type_name.to_string(),
                    param: spec.name.to_string(),
                });
            }
            return Ok(spec.default.to_value());
        };

        let value = self.decode(descriptor, spec, raw)?;
        if value.is_empty()
            && !descriptor
                .namespace
                .nullable_params()
                .contains(&spec.name)
        {
            return Err(BuildError::EmptyRequiredValue {
                type_name: descriptor.type_name.to_string(),
                param: spec.name.to_string(),
            });
        }
        Ok(value)
    }

    fn decode(
        &self,
        descriptor: &ComponentDescriptor,
        spec: &ParameterSpec,
        raw: &Value,
    ) -> Result<ArgValue, BuildError> {
        let unsupported = |kind| BuildError::UnsupportedValueKind {
            type_name: descriptor.type_name.to_string(),
            param: spec.name.to_string(),
            kind,
        };
        match (raw, spec.kind) {
            (Value::Null, _) => Ok(ArgValue::Null),
            (Value::String(s), ParamKind::String) => Ok(ArgValue::Str(s.clone())),
            (Value::Bool(b), ParamKind::Bool) => Ok(ArgValue::Bool(*b)),
            (Value::Object(_), ParamKind::Object(nested)) => {
                let component = self.build(Namespace::Argument, nested, Some(raw))?;
                Ok(ArgValue::Object {
                    component,
                    raw: raw.clone(),
                })
            }
            (other, _) => Err(unsupported(json_kind(other))),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

fn unexpected_component(type_name: &str, expected: &str, got: &Component) -> BuildError {
    BuildError::construction_failed(
        type_name,
        anyhow::anyhow!("constructor produced {:?}, expected a {}", got, expected),
    )
}
