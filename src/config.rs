//! Project configuration.
//!
//! A sitewright project is configured by a single `config.toml` at the
//! project root:
//!
//! ```toml
//! version = "1"
//! plugins = ["tags", "atom"]
//!
//! [site.meta]
//! title = "Coffee Talk"
//! subtitle = "Espresso, mostly"
//! description = "Notes on coffee"
//! author = "J. Doe"
//! base = "https://example.com"
//!
//! [site.nav]
//! items = [
//!     { label = "Blog", target = "/blog" },
//! ]
//!
//! [site.footer]
//! items = [
//!     { label = "RSS", target = "/atom.xml" },
//! ]
//!
//! [types.post]
//! template = "post"
//!
//! [build]
//! overwrite = false
//! ```
//!
//! All sections are optional except `version`. Unknown keys are rejected to
//! catch typos early.

use crate::model::{Footer, Meta, Nav, PageType};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration filename expected at the project root.
pub const CONFIG_FILE: &str = "config.toml";

/// Content directory inside the project, relative to the project root.
pub const CONTENT_DIR: &str = "content";

/// Default output directory, relative to the project root.
pub const OUTPUT_DIR: &str = "public";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// User configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Configuration format version. Required.
    pub version: String,
    pub site: SiteSection,
    /// Keys of the plugins enabled for the build, in invocation order.
    pub plugins: Vec<String>,
    /// Page types pages may declare via their `type` front matter field.
    pub types: HashMap<String, PageType>,
    pub build: BuildSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub meta: Meta,
    pub nav: Nav,
    pub footer: Footer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Allow removing an existing output directory without `--overwrite`.
    pub overwrite: bool,
}

impl Config {
    /// Loads and validates the configuration from `<project>/config.toml`.
    pub fn from_project(project: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(project.join(CONFIG_FILE))?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks if the configuration has enabled a given plugin.
    pub fn has_plugin(&self, key: &str) -> bool {
        self.plugins.iter().any(|p| p == key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::Validation(
                "the configuration has to include the version key".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
version = "1"
plugins = ["tags", "atom"]

[site.meta]
title = "Coffee Talk"
author = "J. Doe"
base = "https://example.com"

[site.nav]
items = [
    { label = "Blog", target = "/blog" },
    { label = "About", target = "/about" },
]

[site.footer]
items = [{ label = "RSS", target = "/atom.xml" }]

[types.post]
template = "post"

[build]
overwrite = true
"#;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();

        assert_eq!(config.version, "1");
        assert_eq!(config.site.meta.title, "Coffee Talk");
        assert_eq!(config.site.nav.items.len(), 2);
        assert_eq!(config.site.nav.items[0].label, "Blog");
        assert_eq!(config.site.footer.items[0].target, "/atom.xml");
        assert_eq!(config.plugins, ["tags", "atom"]);
        assert_eq!(config.types["post"].template, "post");
        assert!(config.build.overwrite);
    }

    #[test]
    fn sparse_config_uses_defaults() {
        let config: Config = toml::from_str("version = \"1\"").unwrap();

        assert!(config.site.meta.title.is_empty());
        assert!(config.plugins.is_empty());
        assert!(config.types.is_empty());
        assert!(!config.build.overwrite);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<Config>("version = \"1\"\ncolour = \"red\"").is_err());
    }

    #[test]
    fn missing_version_fails_validation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[site.meta]\ntitle = \"x\"").unwrap();

        let result = Config::from_project(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn has_plugin_checks_enabled_keys() {
        let config: Config = toml::from_str("version = \"1\"\nplugins = [\"tags\"]").unwrap();
        assert!(config.has_plugin("tags"));
        assert!(!config.has_plugin("atom"));
    }
}
