// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading and validation of default components.

use crate::builder::ComponentBuilder;
use crate::catalog::Catalog;
use crate::service::Defaults;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Listen address, e.g. 127.0.0.1:5000
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Components installed in the global scope at startup and on global reset.
    #[serde(default)]
    pub defaults: Defaults,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// ```toml
    /// [general]
    /// listen = "127.0.0.1:5000"
    ///
    /// [defaults]
    /// sanitizers = [
    ///   { name = "HeaderRegex", body = { key = "Authorization", regex = ".+", value = "Sanitized" } },
    /// ]
    /// matcher = { name = "CustomDefaultMatcher", body = { compareBodies = false } }
    /// ```
    ///
    /// Every default is built once here so a typo fails at startup rather
    /// than on the first reset.
    pub async fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let s = tokio::fs::read_to_string(path_ref)
            .await
            .with_context(|| format!("reading {}", path_ref.display()))?;
        let cfg: Self = toml::from_str(&s)?;
        cfg.validate(Catalog::builtin())?;
        Ok(cfg)
    }

    pub fn validate(&self, catalog: &Catalog) -> anyhow::Result<()> {
        let builder = ComponentBuilder::new(catalog);
        for s in &self.defaults.sanitizers {
            builder
                .build_sanitizer(&s.name, s.body.as_ref())
                .with_context(|| format!("default sanitizer {}", s.name))?;
        }
        if let Some(m) = &self.defaults.matcher {
            builder
                .build_matcher(&m.name, m.body.as_ref())
                .with_context(|| format!("default matcher {}", m.name))?;
        }
        for t in &self.defaults.transforms {
            builder
                .build_transform(&t.name, t.body.as_ref())
                .with_context(|| format!("default transform {}", t.name))?;
        }
        self.general
            .listen
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("invalid listen address {}", self.general.listen))?;
        Ok(())
    }
}
