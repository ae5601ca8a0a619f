//! Renderer tests.

mod core;

use crate::error::{SlqError, SlqResult};
use crate::render::Dialect;
use crate::{Compiler, compile};

fn try_sql(query: &str, dialect: Dialect) -> SlqResult<String> {
    compile(query, dialect)
}

pub(super) fn sql(query: &str, dialect: Dialect) -> String {
    match try_sql(query, dialect) {
        Ok(sql) => sql,
        Err(e) => panic!("failed to compile {query}: {e}"),
    }
}

pub(super) fn sqlite(query: &str) -> String {
    sql(query, Dialect::Sqlite)
}

pub(super) fn render_error(query: &str, dialect: Dialect) -> SlqError {
    match try_sql(query, dialect) {
        Err(e @ SlqError::Render { .. }) => e,
        other => panic!("expected a render error for {query}, got {other:?}"),
    }
}

pub(super) fn with_args(query: &str, args: &[(&str, &str)]) -> SlqResult<String> {
    Compiler::new(Dialect::Postgres)
        .with_args(args.iter().copied())
        .compile(query)
}
