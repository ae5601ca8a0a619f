use crate::render::Renderer;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresRenderer;

impl Renderer for PostgresRenderer {
    fn function_name<'n>(&self, name: &'n str) -> &'n str {
        match name {
            "schema" => "current_schema",
            "catalog" => "current_database",
            other => other,
        }
    }
}
