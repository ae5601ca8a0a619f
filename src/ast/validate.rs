//! Structural checks run after narrowing.

use super::node::{Kind, NodeKind};
use super::walker::Walker;
use super::{Ast, NodeId};
use crate::error::{SlqError, SlqResult};

fn validation_error(ast: &Ast, id: NodeId, message: impl Into<String>) -> SlqError {
    SlqError::validation(ast.node(id).span, ast.text(id), message)
}

/// A clause kind that may appear at most once per query.
fn at_most_once(what: &'static str) -> impl FnMut(&mut Ast, NodeId) -> SlqResult<()> {
    let mut seen = 0;
    move |ast: &mut Ast, id: NodeId| {
        seen += 1;
        if seen > 1 {
            return Err(validation_error(
                ast,
                id,
                format!("only one {what} is allowed per query"),
            ));
        }
        Ok(())
    }
}

/// `having` must come right after `group_by`, either as the previous element
/// of its segment or as the last element of the previous segment.
fn check_having(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let prev = match ast.prev_sibling(id) {
        Some(sibling) => Some(sibling),
        None => ast
            .parent(id)
            .and_then(|seg| ast.prev_segment(seg))
            .and_then(|prev_seg| ast.children(prev_seg).last().copied()),
    };
    match prev.map(|p| ast.kind(p)) {
        Some(NodeKind::GroupBy) => Ok(()),
        _ => Err(validation_error(
            ast,
            id,
            "having must immediately follow group_by",
        )),
    }
}

pub fn validate(ast: &mut Ast) -> SlqResult<()> {
    Walker::new()
        .visitor(Kind::RowRange, at_most_once("row range"))
        .visitor(Kind::Having, check_having)
        .visitor(Kind::GroupBy, at_most_once("group_by"))
        .visitor(Kind::OrderBy, at_most_once("order_by"))
        .walk(ast)
}
