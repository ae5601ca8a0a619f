//! Dialect renderers. Each overrides only the fragments its dialect spells
//! differently.

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

pub use mysql::MysqlRenderer;
pub use postgres::PostgresRenderer;
pub use sqlite::SqliteRenderer;
pub use sqlserver::SqlServerRenderer;
