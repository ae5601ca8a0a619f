//! Dialect-aware SQL rendering of a finished AST.
//!
//! [`Renderer`] has a default method for every fragment. Dialect renderers in
//! [`sql`] override only the fragments whose SQL differs.

pub mod dialect;
pub mod sql;

#[cfg(test)]
mod tests;

pub use dialect::{Dialect, DialectConfig, PlaceholderStyle};

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{Ast, Direction, Inspector, Kind, LiteralKind, NodeId, NodeKind};
use crate::error::{SlqError, SlqResult};
use crate::parser::grammar::base::unquote;

/// Everything a renderer needs besides itself.
pub struct RenderContext<'a> {
    pub ast: &'a Ast,
    pub dialect: &'a DialectConfig,
    /// Values for `$name` substitution variables.
    pub args: &'a BTreeMap<String, String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        ast: &'a Ast,
        dialect: &'a DialectConfig,
        args: &'a BTreeMap<String, String>,
    ) -> Self {
        Self { ast, dialect, args }
    }

    pub fn inspector(&self) -> Inspector<'a> {
        Inspector::new(self.ast)
    }

    pub fn error(&self, id: NodeId, message: impl Into<String>) -> SlqError {
        SlqError::render(self.ast.node(id).span, self.ast.text(id), message)
    }
}

/// Rendered pieces of a SELECT statement. Empty strings are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    pub distinct: String,
    pub columns: String,
    pub from: String,
    pub where_clause: String,
    pub group_by: String,
    pub having: String,
    pub order_by: String,
    pub range: String,
}

/// Quote a string value as a SQL literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub trait Renderer: Send + Sync {
    /// SQL name for a non-proprietary SLQ function.
    fn function_name<'n>(&self, name: &'n str) -> &'n str {
        name
    }

    /// Full replacement rendering for particular functions.
    fn function_override(&self, ctx: &RenderContext, id: NodeId) -> Option<SlqResult<String>> {
        let NodeKind::Func {
            name,
            proprietary: false,
            ..
        } = ctx.ast.kind(id)
        else {
            return None;
        };
        match name.as_str() {
            "rownum" => Some(self.rownum(ctx)),
            _ => None,
        }
    }

    /// `rownum()`: a 1-based row counter following the query's ORDER BY.
    fn rownum(&self, ctx: &RenderContext) -> SlqResult<String> {
        let order = self.order_by(ctx)?;
        let order = if order.is_empty() {
            "ORDER BY 1".to_string()
        } else {
            order
        };
        Ok(format!("(row_number() OVER ({order}))"))
    }

    fn enquote(&self, ctx: &RenderContext, name: &str) -> String {
        ctx.dialect.enquote(name)
    }

    fn with_alias(&self, ctx: &RenderContext, sql: String, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("{sql} AS {}", self.enquote(ctx, alias)),
            None => sql,
        }
    }

    /// Column or table reference, without alias.
    fn selector(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        match ctx.ast.kind(id) {
            NodeKind::ColSelector { column, .. } => Ok(self.enquote(ctx, column)),
            NodeKind::TblColSelector { table, column, .. } => Ok(format!(
                "{}.{}",
                self.enquote(ctx, table),
                self.enquote(ctx, column)
            )),
            NodeKind::TableSelector { table, .. } => Ok(self.enquote(ctx, table)),
            NodeKind::Selector { .. } => Err(ctx.error(id, "selector was not narrowed")),
            other => Err(ctx.error(id, format!("expected a selector, got {}", other.kind()))),
        }
    }

    /// `"tbl"` or `"tbl" AS "alias"`.
    fn table(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::TableSelector { table, alias, .. } = ctx.ast.kind(id) else {
            return Err(ctx.error(id, "expected a table selector"));
        };
        Ok(self.with_alias(ctx, self.enquote(ctx, table), alias.as_deref()))
    }

    /// Name used to qualify columns of a table: its alias if it has one.
    fn table_ref(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        match ctx.ast.kind(id) {
            NodeKind::TableSelector {
                alias: Some(alias),
                ..
            } => Ok(self.enquote(ctx, alias)),
            NodeKind::TableSelector { table, .. } => Ok(self.enquote(ctx, table)),
            _ => Err(ctx.error(id, "expected a table selector")),
        }
    }

    /// `FROM` plus any joins. Empty when the query names no table.
    fn from_table(&self, ctx: &RenderContext) -> SlqResult<String> {
        let tablers = ctx.inspector().find_tablers();
        let Some((&first, joins)) = tablers.split_first() else {
            return Ok(String::new());
        };
        if !matches!(ctx.ast.kind(first), NodeKind::TableSelector { .. }) {
            return Err(ctx.error(first, "join has no table to its left"));
        }

        let mut sql = format!("FROM {}", self.table(ctx, first)?);
        for &join in joins {
            if matches!(ctx.ast.kind(join), NodeKind::TableSelector { .. }) {
                return Err(ctx.error(join, "multiple tables require a join"));
            }
            sql.push(' ');
            sql.push_str(&self.join(ctx, join)?);
        }
        Ok(sql)
    }

    fn join(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::Join {
            join_type,
            left,
            right,
        } = *ctx.ast.kind(id)
        else {
            return Err(ctx.error(id, "expected a join"));
        };
        if !ctx.dialect.supports_join(join_type) {
            return Err(ctx.error(
                id,
                format!("{join_type} is not supported by {}", ctx.dialect.dialect),
            ));
        }
        let (Some(left), Some(right)) = (left, right) else {
            return Err(ctx.error(id, "join tables were not bound"));
        };

        let target = format!("{} {}", join_type.sql_keyword(), self.table(ctx, right)?);
        let Some(&predicate) = ctx.ast.children(id).get(1) else {
            return Ok(target);
        };

        // `join(.tbl, .col)` means left.col = right.col
        match ctx.ast.children(predicate) {
            [only] => match ctx.ast.kind(*only) {
                NodeKind::ColSelector { column, .. } => {
                    let column = self.enquote(ctx, column);
                    Ok(format!(
                        "{target} ON {}.{column} = {}.{column}",
                        self.table_ref(ctx, left)?,
                        self.table_ref(ctx, right)?
                    ))
                }
                _ => Ok(format!("{target} ON {}", self.expr(ctx, predicate)?)),
            },
            _ => Ok(format!("{target} ON {}", self.expr(ctx, predicate)?)),
        }
    }

    /// The column list; `*` when the query has no result-column segment.
    fn select_cols(&self, ctx: &RenderContext) -> SlqResult<String> {
        let Some(seg) = ctx.inspector().find_result_column_segment() else {
            return Ok("*".to_string());
        };
        let cols = ctx
            .ast
            .children(seg)
            .iter()
            .map(|c| self.result_column(ctx, *c))
            .collect::<SlqResult<Vec<_>>>()?;
        Ok(cols.join(", "))
    }

    fn result_column(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let sql = self.operand(ctx, id)?;
        Ok(self.with_alias(ctx, sql, ctx.ast.kind(id).alias()))
    }

    fn function(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        if let Some(sql) = self.function_override(ctx, id) {
            return sql;
        }
        let NodeKind::Func {
            name, proprietary, ..
        } = ctx.ast.kind(id)
        else {
            return Err(ctx.error(id, "expected a function"));
        };
        let args = ctx
            .ast
            .children(id)
            .iter()
            .map(|a| self.operand(ctx, *a))
            .collect::<SlqResult<Vec<_>>>()?;

        if *proprietary {
            return Ok(format!("{name}({})", args.join(", ")));
        }
        match name.as_str() {
            "count" if args.is_empty() => Ok("count(*)".to_string()),
            "count_unique" => Ok(format!("count(DISTINCT {})", args.join(", "))),
            _ => Ok(format!("{}({})", self.function_name(name), args.join(", "))),
        }
    }

    fn literal(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::Literal { kind, text } = ctx.ast.kind(id) else {
            return Err(ctx.error(id, "expected a literal"));
        };
        match kind {
            LiteralKind::Null => Ok("NULL".to_string()),
            LiteralKind::Int | LiteralKind::Float => Ok(text.clone()),
            LiteralKind::String => unquote(text)
                .map(|s| string_literal(&s))
                .ok_or_else(|| ctx.error(id, "malformed string literal")),
            LiteralKind::Bool => {
                let value = text == "true";
                Ok(match (ctx.dialect.bool_as_int, value) {
                    (true, true) => "1",
                    (true, false) => "0",
                    (false, true) => "true",
                    (false, false) => "false",
                }
                .to_string())
            }
        }
    }

    /// Substitution variable, rendered as a string literal.
    fn arg(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::Arg { name } = ctx.ast.kind(id) else {
            return Err(ctx.error(id, "expected an arg"));
        };
        ctx.args
            .get(name)
            .map(|v| string_literal(v))
            .ok_or_else(|| ctx.error(id, format!("no value for variable ${name}")))
    }

    fn operator(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::Operator { text } = ctx.ast.kind(id) else {
            return Err(ctx.error(id, "expected an operator"));
        };
        Ok(ctx.dialect.operator(text).to_string())
    }

    /// Any node that can stand inside an expression.
    fn operand(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        match ctx.ast.kind(id).kind() {
            Kind::ColSelector | Kind::TblColSelector | Kind::Selector => self.selector(ctx, id),
            Kind::Func => self.function(ctx, id),
            Kind::Expr => self.expr(ctx, id),
            Kind::Literal => self.literal(ctx, id),
            Kind::Arg => self.arg(ctx, id),
            other => Err(ctx.error(id, format!("{other} cannot be used as a value"))),
        }
    }

    fn expr(&self, ctx: &RenderContext, id: NodeId) -> SlqResult<String> {
        let NodeKind::Expr { parenthesized, .. } = *ctx.ast.kind(id) else {
            return Err(ctx.error(id, "expected an expression"));
        };
        let is_op = |n: NodeId| matches!(ctx.ast.kind(n), NodeKind::Operator { .. });
        // Bare unary expressions nested in another expression are wrapped so
        // `NOT` and sign operators keep their SLQ binding.
        let nested = |n: NodeId| -> SlqResult<String> {
            let sql = self.operand(ctx, n)?;
            let bare_unary = matches!(
                ctx.ast.kind(n),
                NodeKind::Expr {
                    parenthesized: false,
                    ..
                }
            ) && matches!(*ctx.ast.children(n), [op, _] if is_op(op));
            Ok(if bare_unary { format!("({sql})") } else { sql })
        };

        let sql = match *ctx.ast.children(id) {
            [operand] => self.operand(ctx, operand)?,
            [op, operand] if is_op(op) => {
                let op_sql = self.operator(ctx, op)?;
                let operand = nested(operand)?;
                if op_sql.chars().all(|c| c.is_ascii_alphabetic()) {
                    format!("{op_sql} {operand}")
                } else {
                    format!("{op_sql}{operand}")
                }
            }
            [lhs, op, rhs] if is_op(op) => {
                let rhs_is_null = matches!(
                    ctx.ast.kind(rhs),
                    NodeKind::Literal {
                        kind: LiteralKind::Null,
                        ..
                    }
                );
                let op_sql = match ctx.ast.kind(op) {
                    NodeKind::Operator { text } if rhs_is_null && text == "==" => "IS".to_string(),
                    NodeKind::Operator { text } if rhs_is_null && text == "!=" => {
                        "IS NOT".to_string()
                    }
                    _ => self.operator(ctx, op)?,
                };
                format!("{} {op_sql} {}", nested(lhs)?, nested(rhs)?)
            }
            _ => return Err(ctx.error(id, "malformed expression")),
        };

        if parenthesized {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }

    /// `WHERE ...`; several where clauses are ANDed together.
    fn where_clause(&self, ctx: &RenderContext) -> SlqResult<String> {
        let clauses = ctx.inspector().find_where_clauses();
        let exprs = clauses
            .iter()
            .map(|w| match ctx.ast.children(*w) {
                [expr] => self.expr(ctx, *expr),
                _ => Err(ctx.error(*w, "where requires exactly one expression")),
            })
            .collect::<SlqResult<Vec<_>>>()?;

        Ok(match exprs.as_slice() {
            [] => String::new(),
            [single] => format!("WHERE {single}"),
            many => {
                let parts: Vec<String> = many.iter().map(|e| format!("({e})")).collect();
                format!("WHERE {}", parts.join(" AND "))
            }
        })
    }

    fn group_by(&self, ctx: &RenderContext) -> SlqResult<String> {
        let Some(gb) = ctx.inspector().find_group_by() else {
            return Ok(String::new());
        };
        let terms = ctx
            .ast
            .children(gb)
            .iter()
            .map(|t| self.operand(ctx, *t))
            .collect::<SlqResult<Vec<_>>>()?;
        Ok(format!("GROUP BY {}", terms.join(", ")))
    }

    fn having(&self, ctx: &RenderContext) -> SlqResult<String> {
        let Some(having) = ctx.inspector().find_having() else {
            return Ok(String::new());
        };
        match ctx.ast.children(having) {
            [expr] => Ok(format!("HAVING {}", self.expr(ctx, *expr)?)),
            _ => Err(ctx.error(having, "having requires exactly one expression")),
        }
    }

    fn order_by(&self, ctx: &RenderContext) -> SlqResult<String> {
        let Some(ob) = ctx.inspector().find_order_by() else {
            return Ok(String::new());
        };
        let mut terms = Vec::new();
        for &term in ctx.ast.children(ob) {
            let NodeKind::OrderByTerm { direction } = *ctx.ast.kind(term) else {
                return Err(ctx.error(term, "expected an order_by term"));
            };
            let Some(&target) = ctx.ast.children(term).first() else {
                return Err(ctx.error(term, "empty order_by term"));
            };
            let sql = self.operand(ctx, target)?;
            terms.push(match direction {
                Direction::None => sql,
                Direction::Asc => format!("{sql} ASC"),
                Direction::Desc => format!("{sql} DESC"),
            });
        }
        Ok(format!("ORDER BY {}", terms.join(", ")))
    }

    fn distinct(&self, ctx: &RenderContext) -> String {
        match ctx.inspector().find_unique() {
            Some(_) => "DISTINCT".to_string(),
            None => String::new(),
        }
    }

    /// LIMIT/OFFSET for a decoded row range. `limit` is -1 when open ended.
    fn limit_offset(&self, offset: i64, limit: i64) -> String {
        match (limit, offset) {
            (l, o) if l < 0 && o > 0 => format!("OFFSET {o}"),
            (l, _) if l < 0 => String::new(),
            (l, 0) => format!("LIMIT {l}"),
            (l, o) => format!("LIMIT {l} OFFSET {o}"),
        }
    }

    fn range(&self, ctx: &RenderContext) -> SlqResult<String> {
        let Some(rr) = ctx.inspector().find_row_range() else {
            return Ok(String::new());
        };
        match *ctx.ast.kind(rr) {
            NodeKind::RowRange { offset, limit } => Ok(self.limit_offset(offset, limit)),
            _ => Err(ctx.error(rr, "expected a row range")),
        }
    }

    fn fragments(&self, ctx: &RenderContext) -> SlqResult<Fragments> {
        Ok(Fragments {
            distinct: self.distinct(ctx),
            columns: self.select_cols(ctx)?,
            from: self.from_table(ctx)?,
            where_clause: self.where_clause(ctx)?,
            group_by: self.group_by(ctx)?,
            having: self.having(ctx)?,
            order_by: self.order_by(ctx)?,
            range: self.range(ctx)?,
        })
    }

    /// Last chance to adjust fragments before assembly.
    fn pre_render(&self, _ctx: &RenderContext, _fragments: &mut Fragments) -> SlqResult<()> {
        Ok(())
    }

    /// Join fragments in clause order.
    fn assemble(&self, f: &Fragments) -> String {
        let parts: [&str; 9] = [
            "SELECT",
            &f.distinct,
            &f.columns,
            &f.from,
            &f.where_clause,
            &f.group_by,
            &f.having,
            &f.order_by,
            &f.range,
        ];
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn render(&self, ctx: &RenderContext) -> SlqResult<String> {
        if let Some(sel) = ctx.inspector().find_first(Kind::Selector) {
            return Err(ctx.error(sel, "selector was not narrowed"));
        }
        let mut fragments = self.fragments(ctx)?;
        self.pre_render(ctx, &mut fragments)?;
        let sql = self.assemble(&fragments);
        debug!(dialect = %ctx.dialect.dialect, %sql, "rendered query");
        Ok(sql)
    }
}

/// Renderer taking every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {}

/// Render `ast` with `renderer` for the given dialect configuration.
pub fn render(
    ast: &Ast,
    renderer: &dyn Renderer,
    dialect: &DialectConfig,
    args: &BTreeMap<String, String>,
) -> SlqResult<String> {
    renderer.render(&RenderContext::new(ast, dialect, args))
}
