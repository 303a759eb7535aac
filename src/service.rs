// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Registration service: the concurrency-safe façade over the registry.
//!
//! Every mutating call builds its components first, without holding any
//! lock, and only then takes the target scope's lock for the in-memory
//! update. A failed build therefore never leaves anything registered.

use crate::builder::ComponentBuilder;
use crate::catalog::Catalog;
use crate::components::{Matcher, Sanitizer, Transform};
use crate::error::BuildError;
use crate::registry::{RegisteredSanitizer, Registry};
use crate::scope::Scope;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// A component named by type, with its constructor arguments.
///
/// Accepts both the admin wire shape (`Name`/`Body`) and the lowercase form
/// used in configuration files.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ComponentSpec {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Body")]
    pub body: Option<Value>,
}

impl ComponentSpec {
    pub fn new(name: &str, body: Value) -> Self {
        Self {
            name: name.to_string(),
            body: Some(body),
        }
    }
}

/// Components installed into the global scope at startup and on global reset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub sanitizers: Vec<ComponentSpec>,
    #[serde(default)]
    pub matcher: Option<ComponentSpec>,
    #[serde(default)]
    pub transforms: Vec<ComponentSpec>,
}

pub struct RegistrationService {
    catalog: &'static Catalog,
    registry: Registry,
    defaults: Defaults,
}

impl RegistrationService {
    /// Create a service over `catalog` and install `defaults` globally.
    pub fn new(catalog: &'static Catalog, defaults: Defaults) -> Result<Self, BuildError> {
        let service = Self {
            catalog,
            registry: Registry::new(),
            defaults,
        };
        service.reset_to_defaults(&Scope::Global)?;
        Ok(service)
    }

    pub fn with_builtins() -> Self {
        Self {
            catalog: Catalog::builtin(),
            registry: Registry::new(),
            defaults: Defaults::default(),
        }
    }

    pub fn builder(&self) -> ComponentBuilder<'static> {
        ComponentBuilder::new(self.catalog)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn build_sanitizer(
        &self,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<(Arc<dyn Sanitizer>, Value), BuildError> {
        let (instance, resolved) = self.builder().build_sanitizer_resolved(type_name, args)?;
        Ok((instance, resolved.to_json()))
    }

    pub fn register_one(
        &self,
        scope: &Scope,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<String, BuildError> {
        let (instance, arguments) = self.build_sanitizer(type_name, args)?;
        let id = self
            .registry
            .write(scope, |r| r.add_sanitizer(scope, type_name, arguments, instance));
        debug!(%scope, type_name, %id, "registered sanitizer");
        Ok(id)
    }

    /// Build every item, then register them all under a single lock
    /// acquisition. Nothing is registered if any item fails to build.
    pub fn register_bulk(
        &self,
        scope: &Scope,
        items: &[ComponentSpec],
    ) -> Result<Vec<String>, BuildError> {
        if items.is_empty() {
            return Err(BuildError::EmptyBatch(
                "When bulk adding sanitizers, ensure there is at least one sanitizer added in each batch. Received 0 work items.".to_string(),
            ));
        }

        let built = items
            .iter()
            .map(|item| {
                self.build_sanitizer(&item.name, item.body.as_ref())
                    .map(|(instance, arguments)| (item.name.as_str(), instance, arguments))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ids = self.registry.write(scope, |r| {
            built
                .into_iter()
                .map(|(name, instance, arguments)| r.add_sanitizer(scope, name, arguments, instance))
                .collect::<Vec<_>>()
        });
        debug!(%scope, count = ids.len(), "registered sanitizer batch");
        Ok(ids)
    }

    /// Remove one sanitizer. `None` means the id was not registered in this scope.
    pub fn unregister(&self, scope: &Scope, id: &str) -> Option<String> {
        let removed = self
            .registry
            .write_existing(scope, |r| r.remove_sanitizer(id))
            .flatten();
        if removed.is_none() {
            debug!(%scope, id, "sanitizer not found for removal");
        }
        removed
    }

    /// Remove each id independently, returning only those actually removed.
    pub fn unregister_many(&self, scope: &Scope, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.unregister(scope, id))
            .collect()
    }

    /// Sanitizers registered directly in `scope` (global when absent).
    pub fn list(&self, scope: Option<&Scope>) -> Vec<RegisteredSanitizer> {
        let scope = scope.unwrap_or(&Scope::Global);
        self.registry
            .read(scope, |r| r.sanitizers.clone())
            .unwrap_or_default()
    }

    pub fn set_matcher(
        &self,
        scope: &Scope,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<(), BuildError> {
        let matcher = self.builder().build_matcher(type_name, args)?;
        self.registry.write(scope, |r| r.matcher = Some(matcher));
        debug!(%scope, type_name, "matcher set");
        Ok(())
    }

    pub fn add_transform(
        &self,
        scope: &Scope,
        type_name: &str,
        args: Option<&Value>,
    ) -> Result<(), BuildError> {
        let transform = self.builder().build_transform(type_name, args)?;
        self.registry.write(scope, |r| r.transforms.push(transform));
        debug!(%scope, type_name, "transform added");
        Ok(())
    }

    /// Merge `options` into the scope's recording options, last writer wins per key.
    pub fn set_options(&self, scope: &Scope, options: Map<String, Value>) {
        self.registry.write(scope, |r| r.options.extend(options));
    }

    /// Clear a scope. The global scope gets the configured defaults back.
    pub fn reset_to_defaults(&self, scope: &Scope) -> Result<(), BuildError> {
        if let Scope::Session(_) = scope {
            self.registry.write_existing(scope, |r| r.clear());
            debug!(%scope, "session scope reset");
            return Ok(());
        }

        let builder = self.builder();
        let sanitizers = self
            .defaults
            .sanitizers
            .iter()
            .map(|s| {
                self.build_sanitizer(&s.name, s.body.as_ref())
                    .map(|(instance, arguments)| (s.name.as_str(), instance, arguments))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let matcher = self
            .defaults
            .matcher
            .as_ref()
            .map(|m| builder.build_matcher(&m.name, m.body.as_ref()))
            .transpose()?;
        let transforms = self
            .defaults
            .transforms
            .iter()
            .map(|t| builder.build_transform(&t.name, t.body.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        self.registry.write(scope, |r| {
            r.clear();
            for (name, instance, arguments) in sanitizers {
                r.add_sanitizer(scope, name, arguments, instance);
            }
            r.matcher = matcher;
            r.transforms = transforms;
        });
        info!(
            sanitizers = self.defaults.sanitizers.len(),
            transforms = self.defaults.transforms.len(),
            "global scope reset to defaults"
        );
        Ok(())
    }

    /// The matcher set directly on `scope`, if any.
    pub fn matcher(&self, scope: &Scope) -> Option<Arc<dyn Matcher>> {
        self.registry.read(scope, |r| r.matcher.clone()).flatten()
    }

    /// The session's own matcher, falling back to the global one.
    pub fn effective_matcher(&self, scope: &Scope) -> Option<Arc<dyn Matcher>> {
        self.matcher(scope)
            .or_else(|| self.matcher(&Scope::Global))
    }

    pub fn transforms(&self, scope: &Scope) -> Vec<Arc<dyn Transform>> {
        self.registry
            .read(scope, |r| r.transforms.clone())
            .unwrap_or_default()
    }

    pub fn options(&self, scope: &Scope) -> Map<String, Value> {
        self.registry
            .read(scope, |r| r.options.clone())
            .unwrap_or_default()
    }
}
