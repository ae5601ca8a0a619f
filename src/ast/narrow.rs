//! Narrowing passes: generic selectors become table, column or table.column
//! selectors depending on where they sit in the query.

use tracing::debug;

use super::inspector::Inspector;
use super::node::{Kind, NodeKind};
use super::walker::Walker;
use super::{Ast, NodeId};
use crate::error::{SlqError, SlqResult};

/// Run the narrowing passes in order, then bind join tables and reject any
/// selector that is still generic.
pub fn narrow(ast: &mut Ast) -> SlqResult<()> {
    Walker::new()
        .visitor(Kind::Selector, narrow_table_selector)
        .walk(ast)?;
    Walker::new()
        .visitor(Kind::Selector, narrow_tbl_col_selector)
        .walk(ast)?;
    Walker::new()
        .visitor(Kind::Selector, narrow_col_selector)
        .walk(ast)?;
    Walker::new().visitor(Kind::Join, bind_join).walk(ast)?;
    Walker::new()
        .visitor(Kind::Selector, reject_generic_selector)
        .walk(ast)
}

fn selector_parts(ast: &Ast, id: NodeId) -> Option<(String, Option<String>, Option<String>)> {
    match ast.kind(id) {
        NodeKind::Selector {
            name0,
            name1,
            alias,
        } => Some((name0.clone(), name1.clone(), alias.clone())),
        _ => None,
    }
}

fn validation_error(ast: &Ast, id: NodeId, message: impl Into<String>) -> SlqError {
    SlqError::validation(ast.node(id).span, ast.text(id), message)
}

/// Pass 1: a selector that is the only element of segment 0, or that sits in
/// the segment right after a handle, names a table.
fn narrow_table_selector(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let Some(seg) = ast.parent(id) else {
        return Ok(());
    };
    if !matches!(ast.kind(seg), NodeKind::Segment) {
        return Ok(());
    }
    let Some((name0, name1, alias)) = selector_parts(ast, id) else {
        return Ok(());
    };

    let handle = match ast.prev_segment(seg) {
        None if ast.children(seg).len() == 1 => None,
        None => return Ok(()),
        Some(prev) => match ast.children(prev) {
            [only] => match ast.kind(*only) {
                NodeKind::Handle { name } => Some(name.clone()),
                _ => return Ok(()),
            },
            _ => return Ok(()),
        },
    };

    if name1.is_some() {
        return Err(validation_error(ast, id, "table selector must be a single name"));
    }

    debug!(table = %name0, ?handle, "narrowed table selector");
    ast.replace(
        id,
        NodeKind::TableSelector {
            handle,
            table: name0,
            alias,
        },
    );
    Ok(())
}

/// Selectors in these positions refer to columns.
fn is_column_position(ast: &Ast, id: NodeId) -> bool {
    let Some(parent) = ast.parent(id) else {
        return false;
    };
    match ast.kind(parent) {
        NodeKind::Func { .. }
        | NodeKind::OrderByTerm { .. }
        | NodeKind::GroupBy
        | NodeKind::Expr { .. } => true,
        NodeKind::Segment => {
            let Some(idx) = ast.seg_index(parent) else {
                return false;
            };
            let inspector = Inspector::new(ast);
            match inspector.find_final_tabler_segment() {
                Some(tabler) => ast.seg_index(tabler).is_some_and(|t| idx > t),
                None => false,
            }
        }
        _ => false,
    }
}

/// Pass 2: `.table.column` in a column position.
fn narrow_tbl_col_selector(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let Some((table, Some(column), alias)) = selector_parts(ast, id) else {
        return Ok(());
    };
    if !is_column_position(ast, id) {
        return Ok(());
    }
    debug!(%table, %column, "narrowed table.column selector");
    ast.replace(
        id,
        NodeKind::TblColSelector {
            table,
            column,
            alias,
        },
    );
    Ok(())
}

/// Pass 3: `.column` in a column position.
fn narrow_col_selector(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let Some((column, None, alias)) = selector_parts(ast, id) else {
        return Ok(());
    };
    if !is_column_position(ast, id) {
        return Ok(());
    }
    debug!(%column, "narrowed column selector");
    ast.replace(id, NodeKind::ColSelector { column, alias });
    Ok(())
}

/// Bind a join's right table (its own first child) and its left table (the
/// target of the previous join, or else the preceding table selector).
fn bind_join(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let NodeKind::Join { join_type, .. } = *ast.kind(id) else {
        return Ok(());
    };
    let Some(&target) = ast.children(id).first() else {
        return Err(validation_error(ast, id, "join requires a table"));
    };

    let right = match ast.kind(target) {
        NodeKind::TableSelector { .. } => target,
        NodeKind::Selector {
            name0,
            name1: None,
            alias,
        } => {
            let kind = NodeKind::TableSelector {
                handle: None,
                table: name0.clone(),
                alias: alias.clone(),
            };
            ast.replace(target, kind)
        }
        _ => {
            return Err(validation_error(
                ast,
                target,
                "join table must be a single table name",
            ));
        }
    };

    let left = preceding_tabler_table(ast, id)
        .ok_or_else(|| validation_error(ast, id, "join has no table to its left"))?;

    let has_predicate = ast.children(id).len() > 1;
    match (join_type.is_cross(), has_predicate) {
        (true, true) => {
            return Err(validation_error(
                ast,
                id,
                format!("{join_type} must not have a join condition"),
            ));
        }
        (false, false) => {
            return Err(validation_error(
                ast,
                id,
                format!("{join_type} requires a join condition"),
            ));
        }
        _ => {}
    }

    if let NodeKind::Join {
        left: l, right: r, ..
    } = ast.kind_mut(id)
    {
        *l = Some(left);
        *r = Some(right);
    }
    debug!(%join_type, ?left, ?right, "bound join tables");
    Ok(())
}

/// The table a join attaches to: scanning the query's top-level elements up to
/// `join`, the last table selector or the last join's target table.
fn preceding_tabler_table(ast: &Ast, join: NodeId) -> Option<NodeId> {
    let mut candidate = None;
    for seg in ast.segments() {
        for elem in ast.children(*seg) {
            if *elem == join {
                return candidate;
            }
            match ast.kind(*elem) {
                NodeKind::TableSelector { .. } => candidate = Some(*elem),
                NodeKind::Join { .. } => candidate = ast.children(*elem).first().copied(),
                _ => {}
            }
        }
    }
    candidate
}

fn reject_generic_selector(ast: &mut Ast, id: NodeId) -> SlqResult<()> {
    let top_level = ast
        .parent(id)
        .is_some_and(|p| matches!(ast.kind(p), NodeKind::Segment));
    if top_level && Inspector::new(ast).find_final_tabler_segment().is_none() {
        return Err(validation_error(
            ast,
            id,
            "query has no table to select columns from",
        ));
    }
    Err(validation_error(
        ast,
        id,
        "ambiguous selector: cannot tell whether it names a table or a column",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JoinType, build};
    use crate::parser::parse;

    fn narrowed(query: &str) -> SlqResult<Ast> {
        let mut ast = build(&parse(query).unwrap()).unwrap();
        narrow(&mut ast)?;
        Ok(ast)
    }

    fn seg_kinds(ast: &Ast, seg: usize) -> Vec<Kind> {
        ast.children(ast.segments()[seg])
            .iter()
            .map(|c| ast.kind(*c).kind())
            .collect()
    }

    #[test]
    fn test_narrow_basic_query() {
        let ast = narrowed("@mydb1 | .user | .uid, .username").unwrap();
        assert_eq!(seg_kinds(&ast, 1), vec![Kind::TableSelector]);
        assert_eq!(seg_kinds(&ast, 2), vec![Kind::ColSelector, Kind::ColSelector]);

        let tbl = ast.children(ast.segments()[1])[0];
        assert_eq!(
            ast.kind(tbl),
            &NodeKind::TableSelector {
                handle: Some("@mydb1".into()),
                table: "user".into(),
                alias: None
            }
        );
    }

    #[test]
    fn test_narrow_first_segment_table() {
        let ast = narrowed(".actor | .first_name").unwrap();
        assert_eq!(seg_kinds(&ast, 0), vec![Kind::TableSelector]);
        assert_eq!(seg_kinds(&ast, 1), vec![Kind::ColSelector]);
    }

    #[test]
    fn test_narrow_tbl_col() {
        let ast = narrowed(".actor | .actor.first_name, .actor.last_name").unwrap();
        assert_eq!(
            seg_kinds(&ast, 1),
            vec![Kind::TblColSelector, Kind::TblColSelector]
        );
    }

    #[test]
    fn test_narrow_inside_expressions_and_clauses() {
        let ast = narrowed(".actor | where(.a.b > .c) | order_by(.d) | group_by(.e)").unwrap();
        let inspector = Inspector::new(&ast);
        assert_eq!(inspector.find_nodes(Kind::TblColSelector).len(), 1);
        assert_eq!(inspector.find_nodes(Kind::ColSelector).len(), 3);
        assert!(inspector.find_nodes(Kind::Selector).is_empty());
    }

    #[test]
    fn test_narrow_is_idempotent() {
        let mut ast = narrowed("@db | .user | join(.address, .uid) | .uid, .country").unwrap();
        let before = ast.node_count();
        narrow(&mut ast).unwrap();
        assert_eq!(ast.node_count(), before);
    }

    #[test]
    fn test_join_binding() {
        let ast = narrowed("@db | .user | join(.address:a, .uid) | ljoin(.country, .cid)").unwrap();
        let joins = Inspector::new(&ast).find_nodes(Kind::Join);
        assert_eq!(joins.len(), 2);

        let user = ast.children(ast.segments()[1])[0];
        let NodeKind::Join { left, right, .. } = ast.kind(joins[0]) else {
            panic!("expected join");
        };
        assert_eq!(*left, Some(user));
        let address = ast.children(joins[0])[0];
        assert_eq!(*right, Some(address));
        assert_eq!(ast.kind(address).alias(), Some("a"));

        let NodeKind::Join {
            join_type, left, ..
        } = ast.kind(joins[1])
        else {
            panic!("expected join");
        };
        assert_eq!(*join_type, JoinType::Left);
        assert_eq!(*left, Some(address));
    }

    #[test]
    fn test_join_predicate_requirements() {
        for kw in [
            "join",
            "inner_join",
            "left_join",
            "left_outer_join",
            "right_join",
            "right_outer_join",
            "full_outer_join",
        ] {
            let missing = narrowed(&format!(".a | {kw}(.b)"));
            assert!(
                matches!(missing, Err(SlqError::Validation { .. })),
                "{kw} without predicate"
            );
            assert!(narrowed(&format!(".a | {kw}(.b, .id)")).is_ok(), "{kw}");
        }
        assert!(narrowed(".a | cross_join(.b)").is_ok());
        assert!(matches!(
            narrowed(".a | cross_join(.b, .id)"),
            Err(SlqError::Validation { .. })
        ));
    }

    #[test]
    fn test_join_without_left_table() {
        let err = narrowed("join(.b, .id) | .x").unwrap_err();
        assert!(err.to_string().contains("no table to its left"));
    }

    #[test]
    fn test_columns_without_table() {
        let err = narrowed(".a, .b").unwrap_err();
        assert!(matches!(err, SlqError::Validation { .. }));
        assert!(err.to_string().contains("no table to select columns from"));

        let err = narrowed(".a, .b | .c").unwrap_err();
        assert!(err.to_string().contains("no table to select columns from"));
    }

    #[test]
    fn test_several_tables_after_handle() {
        let ast = narrowed("@db | .actor, .film:f").unwrap();
        assert_eq!(
            seg_kinds(&ast, 1),
            vec![Kind::TableSelector, Kind::TableSelector]
        );
        let film = ast.children(ast.segments()[1])[1];
        assert_eq!(
            ast.kind(film),
            &NodeKind::TableSelector {
                handle: Some("@db".into()),
                table: "film".into(),
                alias: Some("f".into())
            }
        );
    }

    #[test]
    fn test_ambiguous_selector() {
        let err = narrowed("@db | .a.b | .c").unwrap_err();
        assert!(matches!(err, SlqError::Validation { .. }));
    }
}
