//! Generic pre-order tree walker.

use super::node::Kind;
use super::{Ast, NodeId};
use crate::error::SlqResult;

type Visitor<'w> = Box<dyn FnMut(&mut Ast, NodeId) -> SlqResult<()> + 'w>;

/// Walks an [`Ast`] invoking every visitor registered for a matching [`Kind`].
///
/// Visitors run in registration order. A visitor may replace the node it was
/// given; later visitors, and the descent into children, then see the node now
/// occupying that position.
#[derive(Default)]
pub struct Walker<'w> {
    visitors: Vec<(Kind, Visitor<'w>)>,
}

impl<'w> Walker<'w> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visitor<F>(mut self, kind: Kind, f: F) -> Self
    where
        F: FnMut(&mut Ast, NodeId) -> SlqResult<()> + 'w,
    {
        self.visitors.push((kind, Box::new(f)));
        self
    }

    pub fn walk(&mut self, ast: &mut Ast) -> SlqResult<()> {
        self.visit(ast, None, 0)
    }

    fn visit(&mut self, ast: &mut Ast, parent: Option<NodeId>, index: usize) -> SlqResult<()> {
        let at = |ast: &Ast| match parent {
            Some(p) => ast.children(p)[index],
            None => ast.root(),
        };

        for (kind, visitor) in self.visitors.iter_mut() {
            let current = at(ast);
            if kind.matches(ast.kind(current)) {
                visitor(ast, current)?;
            }
        }

        let current = at(ast);
        for i in 0..ast.children(current).len() {
            self.visit(ast, Some(current), i)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, build};
    use crate::parser::parse;

    #[test]
    fn test_visitors_run_in_preorder() {
        let mut ast = build(&parse(".actor | where(.a > 1) | .b, .c").unwrap()).unwrap();
        let mut seen = Vec::new();
        Walker::new()
            .visitor(Kind::Selector, |ast, id| {
                seen.push(ast.text(id).to_string());
                Ok(())
            })
            .walk(&mut ast)
            .unwrap();
        assert_eq!(seen, vec![".actor", ".a", ".b", ".c"]);
    }

    #[test]
    fn test_later_visitors_see_replacement() {
        let mut ast = build(&parse(".actor").unwrap()).unwrap();
        let mut cols = 0;
        Walker::new()
            .visitor(Kind::Selector, |ast, id| {
                ast.replace(
                    id,
                    NodeKind::ColSelector {
                        column: "actor".into(),
                        alias: None,
                    },
                );
                Ok(())
            })
            .visitor(Kind::ColSelector, |_, _| {
                cols += 1;
                Ok(())
            })
            .walk(&mut ast)
            .unwrap();
        assert_eq!(cols, 1);
    }
}
