use crate::ast::{NodeId, NodeKind};
use crate::error::SlqResult;
use crate::render::{RenderContext, Renderer};

/// Largest row count MySQL accepts; stands in for "no limit".
const MAX_ROWS: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlRenderer;

impl Renderer for MysqlRenderer {
    fn function_name<'n>(&self, name: &'n str) -> &'n str {
        match name {
            "schema" => "DATABASE",
            other => other,
        }
    }

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
            "catalog" => Some(Ok("(SELECT 'def')".to_string())),
            "rownum" => Some(self.rownum(ctx)),
            _ => None,
        }
    }

    fn limit_offset(&self, offset: i64, limit: i64) -> String {
        match (limit, offset) {
            (l, o) if l < 0 && o > 0 => format!("LIMIT {MAX_ROWS} OFFSET {o}"),
            (l, _) if l < 0 => String::new(),
            (l, 0) => format!("LIMIT {l}"),
            (l, o) => format!("LIMIT {l} OFFSET {o}"),
        }
    }
}
