//! Read-only queries over an AST.

use super::node::{Kind, NodeKind};
use super::{Ast, NodeId};

pub struct Inspector<'a> {
    ast: &'a Ast,
}

impl<'a> Inspector<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self { ast }
    }

    /// All attached nodes matching `kind`, in pre-order.
    pub fn find_nodes(&self, kind: Kind) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.ast.root()];
        while let Some(id) = stack.pop() {
            if kind.matches(self.ast.kind(id)) {
                found.push(id);
            }
            stack.extend(self.ast.children(id).iter().rev());
        }
        found
    }

    pub fn find_first(&self, kind: Kind) -> Option<NodeId> {
        self.find_nodes(kind).into_iter().next()
    }

    /// Last segment holding a table selector or a join.
    pub fn find_final_tabler_segment(&self) -> Option<NodeId> {
        self.ast.segments().iter().rev().copied().find(|seg| {
            self.ast
                .children(*seg)
                .iter()
                .any(|c| Kind::Tabler.matches(self.ast.kind(*c)))
        })
    }

    /// Segment-level table selectors and joins, in query order.
    pub fn find_tablers(&self) -> Vec<NodeId> {
        self.ast
            .segments()
            .iter()
            .flat_map(|seg| self.ast.children(*seg).iter().copied())
            .filter(|c| Kind::Tabler.matches(self.ast.kind(*c)))
            .collect()
    }

    pub fn find_where_clauses(&self) -> Vec<NodeId> {
        self.find_nodes(Kind::Where)
    }

    pub fn find_group_by(&self) -> Option<NodeId> {
        self.find_first(Kind::GroupBy)
    }

    pub fn find_having(&self) -> Option<NodeId> {
        self.find_first(Kind::Having)
    }

    pub fn find_order_by(&self) -> Option<NodeId> {
        self.find_first(Kind::OrderBy)
    }

    pub fn find_unique(&self) -> Option<NodeId> {
        self.find_first(Kind::Unique)
    }

    pub fn find_row_range(&self) -> Option<NodeId> {
        self.find_first(Kind::RowRange)
    }

    pub fn find_handles(&self) -> Vec<NodeId> {
        self.find_nodes(Kind::Handle)
    }

    /// The segment listing the result columns.
    ///
    /// Scans backward from the last segment, skipping segments that hold no
    /// result columns, and never looks at or before the final tabler segment.
    pub fn find_result_column_segment(&self) -> Option<NodeId> {
        let segments = self.ast.segments();
        let floor = self
            .find_final_tabler_segment()
            .and_then(|seg| self.ast.seg_index(seg))
            .map_or(0, |idx| idx + 1);

        segments[floor.min(segments.len())..]
            .iter()
            .rev()
            .copied()
            .find(|seg| {
                let children = self.ast.children(*seg);
                !children.is_empty()
                    && children
                        .iter()
                        .all(|c| Kind::ResultColumn.matches(self.ast.kind(*c)))
            })
    }

    /// Handle name of the first table selector that carries one.
    pub fn source_handle(&self) -> Option<&'a str> {
        self.find_nodes(Kind::TableSelector)
            .into_iter()
            .find_map(|id| match self.ast.kind(id) {
                NodeKind::TableSelector {
                    handle: Some(h), ..
                } => Some(h.as_str()),
                _ => None,
            })
    }
}
