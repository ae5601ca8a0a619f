//! User configuration, read from `<config_dir>/slq/config.toml`.
//!
//! ```toml
//! dialect = "postgres"
//!
//! [args]
//! country = "Ireland"
//!
//! [overrides.mysql]
//! bool_as_int = false
//! max_batch_values = 100
//!
//! [overrides.mysql.operator_overrides]
//! "||" = "OR"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::Compiler;
use crate::error::{SlqError, SlqResult};
use crate::render::{Dialect, DialectConfig};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dialect: Dialect,
    /// Values for `$name` variables.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    /// Keyed by dialect name.
    #[serde(default)]
    pub overrides: BTreeMap<String, DialectOverrides>,
}

/// Per-dialect adjustments to the built-in [`DialectConfig`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectOverrides {
    #[serde(default)]
    pub operator_overrides: BTreeMap<String, String>,
    pub bool_as_int: Option<bool>,
    pub max_batch_values: Option<usize>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> SlqResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SlqError::Config(e.to_string()))?;
        for name in config.overrides.keys() {
            name.parse::<Dialect>()?;
        }
        Ok(config)
    }

    fn overrides_for(&self, dialect: Dialect) -> Option<&DialectOverrides> {
        self.overrides
            .iter()
            .find(|(name, _)| name.parse::<Dialect>().ok() == Some(dialect))
            .map(|(_, ov)| ov)
    }

    pub fn load(path: impl AsRef<Path>) -> SlqResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the user's config file, or defaults when there is none.
    pub fn load_default() -> SlqResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slq").join("config.toml"))
    }

    /// Built-in configuration for `dialect` with this config's overrides applied.
    pub fn dialect_config(&self, dialect: Dialect) -> DialectConfig {
        let mut config = dialect.config();
        if let Some(ov) = self.overrides_for(dialect) {
            config.operator_overrides.extend(
                ov.operator_overrides
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            if let Some(b) = ov.bool_as_int {
                config.bool_as_int = b;
            }
            if let Some(n) = ov.max_batch_values {
                config.max_batch_values = n;
            }
        }
        config
    }

    /// A compiler for the configured dialect and args.
    pub fn compiler(&self) -> Compiler {
        self.compiler_for(self.dialect)
    }

    pub fn compiler_for(&self, dialect: Dialect) -> Compiler {
        Compiler::new(dialect)
            .with_config(self.dialect_config(dialect))
            .with_args(self.args.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dialect, Dialect::Sqlite);
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml_str(
            r#"
            dialect = "postgres"

            [args]
            name = "bob"

            [overrides.mysql]
            bool_as_int = false
            max_batch_values = 100

            [overrides.mysql.operator_overrides]
            "&&" = "and"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.args.get("name").map(String::as_str), Some("bob"));

        let mysql = config.dialect_config(Dialect::Mysql);
        assert!(!mysql.bool_as_int);
        assert_eq!(mysql.max_batch_values, 100);
        assert_eq!(mysql.operator("&&"), "and");

        // untouched dialects keep their built-ins
        assert_eq!(config.dialect_config(Dialect::Sqlite), Dialect::Sqlite.config());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_toml_str(r#"dialect = "oracle""#),
            Err(SlqError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("colour = 3"),
            Err(SlqError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[overrides.oracle]\nbool_as_int = true"),
            Err(SlqError::Config(_))
        ));
    }

    #[test]
    fn test_compiler_uses_args() {
        let config = Config::from_toml_str(
            r#"
            [args]
            first = "PENELOPE"
            "#,
        )
        .unwrap();
        let sql = config
            .compiler()
            .compile(".actor | where(.first_name == $first) | .actor_id")
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT "actor_id" FROM "actor" WHERE "first_name" = 'PENELOPE'"#
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/slq/config.toml"),
            Err(SlqError::Io(_))
        ));
    }
}
