// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Registry partition targeted by an admin call.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Session(String),
}

impl Scope {
    /// Map an optional recording id to a scope. Absent or empty means global.
    ///
    /// Session existence is not checked here.
    pub fn resolve(session_id: Option<&str>) -> Self {
        match session_id {
            Some(id) if !id.is_empty() => Scope::Session(id.to_string()),
            _ => Scope::Global,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Session(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Session(id) => write!(f, "session {}", id),
        }
    }
}
