// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Per-scope storage of active sanitizers, matcher, transforms and options.

use crate::components::{Matcher, Sanitizer, Transform};
use crate::scope::Scope;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A sanitizer instance together with the id it was registered under.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisteredSanitizer {
    pub id: String,
    #[serde(rename = "Name")]
    pub type_name: String,
    /// Arguments the constructor received, defaults filled in.
    pub arguments: Value,
    #[serde(skip)]
    pub instance: Arc<dyn Sanitizer>,
    #[serde(skip)]
    pub scope: Scope,
}

/// Everything registered for one scope.
#[derive(Debug, Default)]
pub struct ScopeRecord {
    pub sanitizers: Vec<RegisteredSanitizer>,
    pub matcher: Option<Arc<dyn Matcher>>,
    pub transforms: Vec<Arc<dyn Transform>>,
    pub options: Map<String, Value>,
}

impl ScopeRecord {
    /// Append a sanitizer under a freshly generated id and return the id.
    pub fn add_sanitizer(
        &mut self,
        scope: &Scope,
        type_name: &str,
        arguments: Value,
        instance: Arc<dyn Sanitizer>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.sanitizers.push(RegisteredSanitizer {
            id: id.clone(),
            type_name: type_name.to_string(),
            arguments,
            instance,
            scope: scope.clone(),
        });
        id
    }

    pub fn remove_sanitizer(&mut self, id: &str) -> Option<String> {
        let pos = self.sanitizers.iter().position(|s| s.id == id)?;
        Some(self.sanitizers.remove(pos).id)
    }

    pub fn clear(&mut self) {
        *self = ScopeRecord::default();
    }
}

type Slot = Arc<RwLock<ScopeRecord>>;

/// Global record plus lazily created session records, each behind its own lock.
///
/// The session map lock is only held long enough to find or insert a slot;
/// mutations then lock that one slot, so scopes never wait on each other.
#[derive(Debug, Default)]
pub struct Registry {
    global: Slot,
    sessions: RwLock<HashMap<String, Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, scope: &Scope, create: bool) -> Option<Slot> {
        let id = match scope {
            Scope::Global => return Some(self.global.clone()),
            Scope::Session(id) => id,
        };

        if let Some(slot) = read_guard(&self.sessions).get(id) {
            return Some(slot.clone());
        }
        if !create {
            return None;
        }
        let mut sessions = write_guard(&self.sessions);
        Some(sessions.entry(id.clone()).or_default().clone())
    }

    /// Run `f` with exclusive access to the scope's record, creating a
    /// session record on first write.
    pub fn write<R>(&self, scope: &Scope, f: impl FnOnce(&mut ScopeRecord) -> R) -> R {
        let slot = self.slot(scope, true).unwrap_or_else(|| self.global.clone());
        let mut record = write_guard(&slot);
        f(&mut record)
    }

    /// Run `f` with shared access to the scope's record. Returns `None` for
    /// a session that has never been written to.
    pub fn read<R>(&self, scope: &Scope, f: impl FnOnce(&ScopeRecord) -> R) -> Option<R> {
        let slot = self.slot(scope, false)?;
        let record = read_guard(&slot);
        Some(f(&record))
    }

    /// Like [`Registry::write`] but does nothing when the session has no record.
    pub fn write_existing<R>(
        &self,
        scope: &Scope,
        f: impl FnOnce(&mut ScopeRecord) -> R,
    ) -> Option<R> {
        let slot = self.slot(scope, false)?;
        let mut record = write_guard(&slot);
        Some(f(&mut record))
    }

}

fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::warn!("registry lock poisoned during read");
        poisoned.into_inner()
    })
}

fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::warn!("registry lock poisoned during write");
        poisoned.into_inner()
    })
}
