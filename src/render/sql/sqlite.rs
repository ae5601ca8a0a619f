use crate::ast::{NodeId, NodeKind};
use crate::error::SlqResult;
use crate::render::{RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteRenderer;

impl Renderer for SqliteRenderer {
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
            "schema" => Some(Ok(
                "(SELECT name FROM pragma_database_list ORDER BY seq limit 1)".to_string(),
            )),
            "catalog" => Some(Ok("(SELECT 'default')".to_string())),
            "rownum" => Some(self.rownum(ctx)),
            _ => None,
        }
    }

    // SQLite cannot OFFSET without a LIMIT.
    fn limit_offset(&self, offset: i64, limit: i64) -> String {
        match (limit, offset) {
            (l, o) if l < 0 && o > 0 => format!("LIMIT -1 OFFSET {o}"),
            (l, _) if l < 0 => String::new(),
            (l, 0) => format!("LIMIT {l}"),
            (l, o) => format!("LIMIT {l} OFFSET {o}"),
        }
    }
}
