//! # SLQ: a pipe-based query language for SQL
//!
//! SLQ describes a tabular query as a pipeline of segments, jq style, and
//! compiles it to SQL for a chosen dialect.
//!
//! ## Quick Example
//!
//! ```
//! use slq::{Dialect, compile};
//!
//! let sql = compile("@sakila | .actor | where(.actor_id > 4) | .first_name", Dialect::Sqlite)?;
//! assert_eq!(sql, r#"SELECT "first_name" FROM "actor" WHERE "actor_id" > 4"#);
//! # Ok::<(), slq::SlqError>(())
//! ```
//!
//! ## Pipeline
//!
//! | Stage      | Module             | Output                     |
//! |------------|--------------------|----------------------------|
//! | Parse      | [`parser`]         | concrete parse tree        |
//! | Build      | [`ast::builder`]   | AST with generic selectors |
//! | Narrow     | [`ast::narrow`]    | table/column selectors     |
//! | Validate   | [`ast::validate`]  | checked AST                |
//! | Render     | [`render`]         | SQL text                   |

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;
pub mod render;

use std::collections::BTreeMap;

pub use ast::Ast;
pub use config::Config;
pub use error::{SlqError, SlqResult, Stage};
pub use render::{Dialect, DialectConfig, Renderer};

pub mod prelude {
    pub use crate::ast::{Ast, Inspector, Kind, NodeId, NodeKind, Walker};
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::render::{Dialect, DialectConfig, Fragments, RenderContext, Renderer};
    pub use crate::{Compiler, compile, compile_with, parse};
}

/// Parse, build, narrow and validate an SLQ query.
///
/// # Example
///
/// ```
/// use slq::ast::Kind;
///
/// let ast = slq::parse("@mydb | .user | .uid, .username").unwrap();
/// let inspector = slq::ast::Inspector::new(&ast);
/// assert_eq!(inspector.find_nodes(Kind::ColSelector).len(), 2);
/// ```
pub fn parse(input: &str) -> SlqResult<Ast> {
    let tree = parser::parse(input)?;
    let mut ast = ast::build(&tree)?;
    ast::analyze(&mut ast)?;
    Ok(ast)
}

/// Compile a query with the built-in renderer for `dialect`.
pub fn compile(input: &str, dialect: Dialect) -> SlqResult<String> {
    Compiler::new(dialect).compile(input)
}

pub fn compile_with(input: &str, compiler: &Compiler) -> SlqResult<String> {
    compiler.compile(input)
}

/// A reusable compiler: dialect configuration, renderer and `$name` values.
pub struct Compiler {
    config: DialectConfig,
    renderer: Box<dyn Renderer>,
    args: BTreeMap<String, String>,
}

impl Compiler {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            config: dialect.config(),
            renderer: dialect.renderer(),
            args: BTreeMap::new(),
        }
    }

    /// Replace the dialect configuration, keeping its dialect's renderer.
    pub fn with_config(mut self, config: DialectConfig) -> Self {
        self.renderer = config.dialect.renderer();
        self.config = config;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }

    pub fn args(&self) -> &BTreeMap<String, String> {
        &self.args
    }

    pub fn compile(&self, input: &str) -> SlqResult<String> {
        let ast = parse(input)?;
        self.render(&ast)
    }

    /// Render an already analyzed AST.
    pub fn render(&self, ast: &Ast) -> SlqResult<String> {
        render::render(ast, self.renderer.as_ref(), &self.config, &self.args)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}
