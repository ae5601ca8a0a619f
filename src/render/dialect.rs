//! SQL dialects and their configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Renderer;
use super::sql::{
    mysql::MysqlRenderer, postgres::PostgresRenderer, sqlite::SqliteRenderer,
    sqlserver::SqlServerRenderer,
};
use crate::ast::JoinType;
use crate::error::SlqError;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::Mysql,
        Dialect::SqlServer,
    ];

    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            Dialect::Sqlite => Box::new(SqliteRenderer),
            Dialect::Postgres => Box::new(PostgresRenderer),
            Dialect::Mysql => Box::new(MysqlRenderer),
            Dialect::SqlServer => Box::new(SqlServerRenderer),
        }
    }

    /// Built-in configuration for this dialect.
    pub fn config(&self) -> DialectConfig {
        let all_joins = JoinType::ALL.to_vec();
        match self {
            Dialect::Sqlite => DialectConfig {
                dialect: *self,
                identifier_quote: '"',
                placeholder: PlaceholderStyle::Question,
                operator_overrides: BTreeMap::new(),
                supported_joins: all_joins,
                bool_as_int: true,
                max_batch_values: 500,
            },
            Dialect::Postgres => DialectConfig {
                dialect: *self,
                identifier_quote: '"',
                placeholder: PlaceholderStyle::Dollar,
                operator_overrides: BTreeMap::new(),
                supported_joins: all_joins,
                bool_as_int: false,
                max_batch_values: 1000,
            },
            Dialect::Mysql => DialectConfig {
                dialect: *self,
                identifier_quote: '`',
                placeholder: PlaceholderStyle::Question,
                operator_overrides: BTreeMap::new(),
                supported_joins: all_joins
                    .into_iter()
                    .filter(|j| *j != JoinType::FullOuter)
                    .collect(),
                bool_as_int: true,
                max_batch_values: 250,
            },
            Dialect::SqlServer => DialectConfig {
                dialect: *self,
                identifier_quote: '"',
                placeholder: PlaceholderStyle::AtP,
                operator_overrides: BTreeMap::new(),
                supported_joins: all_joins,
                bool_as_int: true,
                max_batch_values: 1000,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SlqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            other => Err(SlqError::Config(format!("unknown dialect '{other}'"))),
        }
    }
}

/// Bind parameter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p1`, `@p2`, ...
    AtP,
}

impl PlaceholderStyle {
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::AtP => format!("@p{index}"),
        }
    }
}

/// SLQ operators whose SQL spelling differs.
const BASE_OPERATORS: &[(&str, &str)] = &[("==", "="), ("&&", "AND"), ("||", "OR"), ("!", "NOT")];

/// Per-dialect knobs consulted by the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct DialectConfig {
    pub dialect: Dialect,
    pub identifier_quote: char,
    pub placeholder: PlaceholderStyle,
    /// SLQ operator to SQL operator, applied after the base mapping.
    pub operator_overrides: BTreeMap<String, String>,
    pub supported_joins: Vec<JoinType>,
    /// Render booleans as `1`/`0`.
    pub bool_as_int: bool,
    /// Upper bound on bind values in one batch statement.
    pub max_batch_values: usize,
}

impl DialectConfig {
    /// Quote an identifier, doubling any embedded quote char.
    pub fn enquote(&self, name: &str) -> String {
        let q = self.identifier_quote;
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Placeholder tuples for a multi-row insert, e.g. `(?, ?), (?, ?)`.
    pub fn placeholders(&self, num_cols: usize, num_rows: usize) -> String {
        let mut n = 0;
        let rows: Vec<String> = (0..num_rows)
            .map(|_| {
                let cols: Vec<String> = (0..num_cols)
                    .map(|_| {
                        n += 1;
                        self.placeholder.placeholder(n)
                    })
                    .collect();
                format!("({})", cols.join(", "))
            })
            .collect();
        rows.join(", ")
    }

    /// Rows per batch so that `rows * num_cols` stays within `max_batch_values`.
    pub fn batch_rows(&self, num_cols: usize) -> usize {
        if num_cols == 0 {
            return 0;
        }
        (self.max_batch_values / num_cols).max(1)
    }

    /// SQL spelling of an SLQ operator.
    pub fn operator<'o>(&'o self, op: &'o str) -> &'o str {
        if let Some(mapped) = self.operator_overrides.get(op) {
            return mapped;
        }
        BASE_OPERATORS
            .iter()
            .find(|(slq, _)| *slq == op)
            .map_or(op, |(_, sql)| *sql)
    }

    pub fn supports_join(&self, join_type: JoinType) -> bool {
        self.supported_joins.contains(&join_type)
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Dialect::default().config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enquote() {
        let pg = Dialect::Postgres.config();
        assert_eq!(pg.enquote("user"), "\"user\"");
        assert_eq!(pg.enquote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::Mysql.config().enquote("order"), "`order`");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Sqlite.config().placeholders(2, 2), "(?, ?), (?, ?)");
        assert_eq!(
            Dialect::Postgres.config().placeholders(2, 2),
            "($1, $2), ($3, $4)"
        );
        assert_eq!(Dialect::SqlServer.config().placeholders(3, 1), "(@p1, @p2, @p3)");
        assert_eq!(Dialect::Sqlite.config().placeholders(2, 0), "");
    }

    #[test]
    fn test_batch_rows() {
        let mysql = Dialect::Mysql.config();
        assert_eq!(mysql.batch_rows(10), 25);
        assert_eq!(mysql.batch_rows(1000), 1);
        assert_eq!(mysql.batch_rows(0), 0);
    }

    #[test]
    fn test_operator_mapping() {
        let mut cfg = Dialect::Sqlite.config();
        assert_eq!(cfg.operator("=="), "=");
        assert_eq!(cfg.operator("&&"), "AND");
        assert_eq!(cfg.operator("<="), "<=");
        cfg.operator_overrides.insert("==".into(), "IS".into());
        assert_eq!(cfg.operator("=="), "IS");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_mysql_lacks_full_outer_join() {
        assert!(!Dialect::Mysql.config().supports_join(JoinType::FullOuter));
        assert!(Dialect::Postgres.config().supports_join(JoinType::FullOuter));
    }
}
