//! SLQ abstract syntax tree.
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other through
//! [`NodeId`]. Parent and child links are stored as ids, so replacing a node
//! only touches its parent's child list.

pub mod builder;
pub mod inspector;
pub mod narrow;
pub mod node;
pub mod validate;
pub mod walker;

pub use builder::build;
pub use inspector::Inspector;
pub use node::{Direction, JoinType, Kind, LiteralKind, NodeKind};
pub use walker::Walker;

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SlqResult;
use crate::parser::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    handles: Vec<String>,
    /// Query text covered by the root span; nodes slice into it.
    source: String,
}

impl Ast {
    /// Empty tree holding only the Query root. `source` is the text of `span`.
    pub fn new(span: Span, source: impl Into<String>) -> Self {
        let root = Node {
            kind: NodeKind::Query,
            span,
            parent: None,
            children: vec![],
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            handles: vec![],
            source: source.into(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Source text of a node.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id.0].span;
        let base = self.nodes[0].span.start;
        span.start
            .checked_sub(base)
            .zip(span.end.checked_sub(base))
            .and_then(|(start, end)| self.source.get(start..end))
            .unwrap_or_default()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Total nodes ever allocated, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append a new node as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        span: Span,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Swap `old` for a new node of `kind` at the same child position.
    ///
    /// The new node inherits the span and children of `old`; `old` is
    /// left detached.
    pub fn replace(&mut self, old: NodeId, kind: NodeKind) -> NodeId {
        let new = NodeId(self.nodes.len());
        let old_node = &mut self.nodes[old.0];
        let parent = old_node.parent.take();
        let children = std::mem::take(&mut old_node.children);
        let node = Node {
            kind,
            span: old_node.span,
            parent,
            children,
        };
        self.nodes.push(node);

        for child in self.nodes[new.0].children.clone() {
            self.nodes[child.0].parent = Some(new);
        }
        if let Some(parent) = parent {
            for slot in self.nodes[parent.0].children.iter_mut() {
                if *slot == old {
                    *slot = new;
                }
            }
        }
        if self.root == old {
            self.root = new;
        }
        new
    }

    /// Segments in query order.
    pub fn segments(&self) -> &[NodeId] {
        self.children(self.root)
    }

    /// Index of `seg` among the query's segments.
    pub fn seg_index(&self, seg: NodeId) -> Option<usize> {
        self.segments().iter().position(|s| *s == seg)
    }

    pub fn prev_segment(&self, seg: NodeId) -> Option<NodeId> {
        let idx = self.seg_index(seg)?;
        idx.checked_sub(1).map(|i| self.segments()[i])
    }

    pub fn next_segment(&self, seg: NodeId) -> Option<NodeId> {
        let idx = self.seg_index(seg)?;
        self.segments().get(idx + 1).copied()
    }

    /// The segment that (transitively) contains `id`.
    pub fn segment_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return matches!(self.kind(current), NodeKind::Segment).then_some(current);
            }
            current = parent;
        }
    }

    /// Sibling immediately before `id` under the same parent.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Source handles referenced by the query, in first-seen order.
    pub fn handles(&self) -> &[String] {
        &self.handles
    }

    pub fn add_handle(&mut self, handle: &str) {
        if !self.handles.iter().any(|h| h == handle) {
            self.handles.push(handle.to_string());
        }
    }

    /// JSON view of the tree, for `slq ast` and debugging.
    pub fn to_json(&self) -> Value {
        self.node_json(self.root)
    }

    fn node_json(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let children: Vec<Value> = node.children.iter().map(|c| self.node_json(*c)).collect();
        json!({
            "node": node.kind,
            "text": self.text(id),
            "span": node.span,
            "children": children,
        })
    }

    /// Indented one-line-per-node rendering of the tree.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_node(self.root, 0, &mut out);
        out
    }

    fn explain_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} `{}`\n", node.kind.kind(), self.text(id)));
        for child in &node.children {
            self.explain_node(*child, depth + 1, out);
        }
    }
}

/// Run every narrowing and validation pass over a freshly built tree.
pub fn analyze(ast: &mut Ast) -> SlqResult<()> {
    narrow::narrow(ast)?;
    validate::validate(ast)
}
