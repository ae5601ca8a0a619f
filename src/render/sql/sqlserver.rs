use crate::error::SlqResult;
use crate::render::{Fragments, RenderContext, Renderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerRenderer;

impl Renderer for SqlServerRenderer {
    fn function_name<'n>(&self, name: &'n str) -> &'n str {
        match name {
            "schema" => "SCHEMA_NAME",
            "catalog" => "DB_NAME",
            other => other,
        }
    }

    /// `OVER` needs an ORDER BY, and SQL Server rejects ordinal positions there.
    fn rownum(&self, ctx: &RenderContext) -> SlqResult<String> {
        let order = self.order_by(ctx)?;
        let order = if order.is_empty() {
            "ORDER BY (SELECT NULL)".to_string()
        } else {
            order
        };
        Ok(format!("(row_number() OVER ({order}))"))
    }

    fn limit_offset(&self, offset: i64, limit: i64) -> String {
        match (limit, offset) {
            (l, 0) if l < 0 => String::new(),
            (l, o) if l < 0 => format!("OFFSET {o} ROWS"),
            (l, o) => format!("OFFSET {o} ROWS FETCH NEXT {l} ROWS ONLY"),
        }
    }

    /// OFFSET/FETCH is only valid after an ORDER BY.
    fn pre_render(&self, _ctx: &RenderContext, fragments: &mut Fragments) -> SlqResult<()> {
        if !fragments.range.is_empty() && fragments.order_by.is_empty() {
            fragments.order_by = "ORDER BY (SELECT 0)".to_string();
        }
        Ok(())
    }
}
