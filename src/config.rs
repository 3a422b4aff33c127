//! Editor configuration using Figment
//!
//! Configuration is layered:
//! 1. Built-in defaults (`EditorConfig::default()`)
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `BLOCK_GRAPH_` (nested keys split on `__`)
//!
//! # Example
//! ```no_run
//! use block_graph::config::EditorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EditorConfig::load_from("block_graph.toml")?;
//! config.validate()?;
//! println!("Block width: {}", config.layout.block_width);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::GraphResult;
use crate::project::Point;
use crate::registry::{BlockDef, Registry};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "BLOCK_GRAPH_";

/// Top-level editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Canvas layout constants
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Link validation rules
    #[serde(default)]
    pub links: LinkRules,
    /// Extra block kinds appended to the built-in registry
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Shape of log lines
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Canvas geometry shared by block placement and the link projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width of a rendered block; output sockets sit on its right edge
    #[serde(default = "default_block_width")]
    pub block_width: f64,
    /// Height of one property row
    #[serde(default = "default_property_height")]
    pub property_height: f64,
    /// Position of the first block in an empty project
    #[serde(default = "default_origin")]
    pub origin: Point,
    /// Horizontal distance between a new block and the last one
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            block_width: default_block_width(),
            property_height: default_property_height(),
            origin: default_origin(),
            spacing: default_spacing(),
        }
    }
}

/// Checks applied when linking properties or setting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRules {
    /// Only allow output -> input links
    #[serde(default = "default_true")]
    pub enforce_direction: bool,
    /// Only allow links and value writes between matching value kinds
    #[serde(default = "default_true")]
    pub enforce_value_kind: bool,
}

impl Default for LinkRules {
    fn default() -> Self {
        Self {
            enforce_direction: true,
            enforce_value_kind: true,
        }
    }
}

// Default value functions
fn default_name() -> String {
    "Block Graph".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_block_width() -> f64 {
    200.0
}

fn default_property_height() -> f64 {
    24.0
}

fn default_origin() -> Point {
    Point::new(100.0, 100.0)
}

fn default_spacing() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

impl EditorConfig {
    /// Load defaults overridden by environment variables only.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Load from a TOML file (missing files are ignored) then environment variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(EditorConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(EditorConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let layout = &self.layout;
        for (name, value) in [
            ("block_width", layout.block_width),
            ("property_height", layout.property_height),
            ("spacing", layout.spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("Invalid layout.{name} {value}. Must be positive"));
            }
        }

        if !layout.origin.is_finite() {
            return Err("Invalid layout.origin. Coordinates must be finite".to_string());
        }

        let mut kinds = HashSet::new();
        for def in &self.blocks {
            if !kinds.insert(def.kind.as_str()) {
                return Err(format!("Duplicate block kind: {}", def.kind));
            }
        }

        Ok(())
    }

    /// Built-in registry extended with the configured block kinds.
    pub fn registry(&self) -> GraphResult<Registry> {
        Registry::builtin().with_defs(self.blocks.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Direction;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.layout.block_width, 200.0);
        assert_eq!(config.layout.property_height, 24.0);
        assert_eq!(config.layout.origin, Point::new(100.0, 100.0));
        assert_eq!(config.layout.spacing, 300.0);
        assert!(config.links.enforce_direction);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EditorConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.layout.property_height = 0.0;
        assert!(config.validate().is_err());

        let mut config = EditorConfig::default();
        config.layout.origin = Point::new(f64::NAN, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "editor.toml",
                r#"
                [application]
                log_level = "debug"
                log_format = "json"

                [layout]
                block_width = 180.0

                [links]
                enforce_value_kind = false

                [[blocks]]
                kind = "negate"

                [[blocks.properties]]
                key = "x"
                direction = "input"
                default = { kind = "number", value = 0.0 }

                [[blocks.properties]]
                key = "y"
                direction = "output"
                default = { kind = "number", value = 0.0 }
                "#,
            )?;
            jail.set_env("BLOCK_GRAPH_LAYOUT__SPACING", "250");

            let config = EditorConfig::load_from("editor.toml")?;
            assert_eq!(config.application.log_level, "debug");
            assert_eq!(config.application.log_format, LogFormat::Json);
            assert_eq!(config.layout.block_width, 180.0);
            assert_eq!(config.layout.property_height, 24.0);
            assert_eq!(config.layout.spacing, 250.0);
            assert!(config.links.enforce_direction);
            assert!(!config.links.enforce_value_kind);

            let registry = config.registry().expect("registry");
            let negate = registry.get("negate").expect("negate kind");
            assert_eq!(negate.property("y").map(|p| p.direction), Some(Direction::Output));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = EditorConfig::load_from("does-not-exist.toml")?;
            assert_eq!(config, EditorConfig::default());
            Ok(())
        });
    }
}
