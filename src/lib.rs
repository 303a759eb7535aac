// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Admin control plane for a record/playback test proxy.
//!
//! Sanitizers, matchers and transforms are named by type over HTTP and built
//! from their JSON arguments through a static catalog, then registered into
//! the global scope or a single recording session.

pub mod args;
pub mod builder;
pub mod catalog;
pub mod components;
pub mod config;
pub mod error;
pub mod registry;
pub mod scope;
pub mod server;
pub mod service;
pub mod sessions;

#[cfg(test)]
mod test_helpers;
