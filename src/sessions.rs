// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Lookup of live recording/playback sessions.
//!
//! Session lifecycle is owned elsewhere; the admin surface only asks whether
//! an id is active before touching a session-scoped record.

use std::collections::HashSet;
use std::sync::RwLock;

pub trait SessionDirectory: Send + Sync {
    fn is_active(&self, id: &str) -> bool;
}

/// Accepts every session id.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnySession;

impl SessionDirectory for AnySession {
    fn is_active(&self, _id: &str) -> bool {
        true
    }
}

/// An explicit set of open sessions.
#[derive(Debug, Default)]
pub struct KnownSessions {
    ids: RwLock<HashSet<String>>,
}

impl KnownSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, id: &str) {
        match self.ids.write() {
            Ok(mut ids) => {
                ids.insert(id.to_string());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id.to_string());
            }
        }
    }

    /// Returns true when the id was open.
    pub fn close(&self, id: &str) -> bool {
        match self.ids.write() {
            Ok(mut ids) => ids.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        }
    }
}

impl SessionDirectory for KnownSessions {
    fn is_active(&self, id: &str) -> bool {
        match self.ids.read() {
            Ok(ids) => ids.contains(id),
            Err(poisoned) => poisoned.into_inner().contains(id),
        }
    }
}
