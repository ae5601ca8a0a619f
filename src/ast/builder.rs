//! Builds the AST from a parse tree.
//!
//! Selectors always come out generic here; deciding whether `.name` is a
//! table or a column is left to the narrowing passes.

use tracing::{debug, trace};

use super::node::{Direction, JoinType, LiteralKind, NodeKind};
use super::{Ast, NodeId};
use crate::error::{SlqError, SlqResult};
use crate::parser::grammar::base::unquote;
use crate::parser::{ParseNode, Rule, TokenKind};

/// Build an AST from the parse tree of a whole query.
pub fn build(tree: &ParseNode) -> SlqResult<Ast> {
    if tree.rule != Rule::Query {
        return Err(SlqError::build(tree.span, &tree.text, "expected a query"));
    }
    let mut builder = Builder {
        ast: Ast::new(tree.span, &tree.text),
    };
    let root = builder.ast.root();
    for seg in &tree.children {
        builder.segment(root, seg)?;
    }
    debug!(
        segments = builder.ast.segments().len(),
        handles = ?builder.ast.handles(),
        "built AST"
    );
    Ok(builder.ast)
}

struct Builder {
    ast: Ast,
}

impl Builder {
    fn add(&mut self, parent: NodeId, kind: NodeKind, pn: &ParseNode) -> NodeId {
        self.ast.add_child(parent, kind, pn.span)
    }

    fn segment(&mut self, root: NodeId, pn: &ParseNode) -> SlqResult<()> {
        let seg = self.add(root, NodeKind::Segment, pn);
        for elem in &pn.children {
            self.element(seg, elem)?;
        }
        self.check_uniform(seg)
    }

    /// All elements of a segment must be of one kind.
    fn check_uniform(&self, seg: NodeId) -> SlqResult<()> {
        let children = self.ast.children(seg);
        let Some(first) = children.first() else {
            return Ok(());
        };
        let want = self.ast.kind(*first).kind();
        if let Some(odd) = children.iter().find(|c| self.ast.kind(**c).kind() != want) {
            let idx = self.ast.seg_index(seg).unwrap_or_default();
            return Err(SlqError::build(
                self.ast.node(seg).span,
                self.ast.text(seg),
                format!(
                    "segment [{idx}] mixes element kinds: {want} and {}",
                    self.ast.kind(*odd).kind()
                ),
            ));
        }
        Ok(())
    }

    fn element(&mut self, seg: NodeId, pn: &ParseNode) -> SlqResult<()> {
        trace!(rule = ?pn.rule, text = %pn.text, "building element");
        match pn.rule {
            Rule::Handle => {
                let name = pn.text.clone();
                self.ast.add_handle(&name);
                self.add(seg, NodeKind::Handle { name }, pn);
            }
            Rule::HandleTable => {
                let kind = self.handle_table(pn, None)?;
                self.add(seg, kind, pn);
            }
            Rule::SelectorElement => {
                let alias = self.alias(pn)?;
                self.selector(seg, first_child(pn)?, alias)?;
            }
            Rule::FuncElement => {
                let alias = self.alias(pn)?;
                let func = self.func(seg, first_child(pn)?)?;
                if let NodeKind::Func { alias: slot, .. } = self.ast.kind_mut(func) {
                    *slot = alias;
                }
            }
            Rule::ExprElement => {
                let alias = self.alias(pn)?;
                let expr = self.wrapped_expr(seg, first_child(pn)?)?;
                if let NodeKind::Expr { alias: slot, .. } = self.ast.kind_mut(expr) {
                    *slot = alias;
                }
            }
            Rule::Join => self.join(seg, pn)?,
            Rule::Where | Rule::Having => {
                let kind = if pn.rule == Rule::Where {
                    NodeKind::Where
                } else {
                    NodeKind::Having
                };
                if pn.children.len() != 1 {
                    return Err(SlqError::build(
                        pn.span,
                        &pn.text,
                        format!("expected exactly one expression, got {}", pn.children.len()),
                    ));
                }
                let clause = self.add(seg, kind, pn);
                self.wrapped_expr(clause, &pn.children[0])?;
            }
            Rule::GroupBy => {
                if pn.children.is_empty() {
                    return Err(SlqError::build(pn.span, &pn.text, "group_by requires at least one term"));
                }
                let group = self.add(seg, NodeKind::GroupBy, pn);
                for term in &pn.children {
                    match term.rule {
                        Rule::Selector => {
                            self.selector(group, term, None)?;
                        }
                        Rule::Func | Rule::CountFunc => {
                            self.func(group, term)?;
                        }
                        _ => {
                            return Err(SlqError::build(
                                term.span,
                                &term.text,
                                "group_by term must be a selector or function",
                            ));
                        }
                    }
                }
            }
            Rule::OrderBy => {
                if pn.children.is_empty() {
                    return Err(SlqError::build(pn.span, &pn.text, "order_by requires at least one term"));
                }
                let order = self.add(seg, NodeKind::OrderBy, pn);
                for term in &pn.children {
                    self.order_term(order, term)?;
                }
            }
            Rule::RowRange => {
                if let Some((offset, limit)) = row_range(pn)? {
                    self.add(seg, NodeKind::RowRange { offset, limit }, pn);
                }
            }
            Rule::UniqueFunc => {
                self.add(seg, NodeKind::Unique, pn);
            }
            other => {
                return Err(SlqError::build(
                    pn.span,
                    &pn.text,
                    format!("unexpected element {other:?}"),
                ));
            }
        }
        Ok(())
    }

    /// Alias attached to an element. A reserved-word alias carries no ident
    /// token, so its text is recovered from the `:alias` node itself.
    fn alias(&self, pn: &ParseNode) -> SlqResult<Option<String>> {
        let Some(alias) = pn.child(Rule::Alias) else {
            return Ok(None);
        };
        match alias.children.first() {
            Some(tok) if tok.is_token(TokenKind::QuotedName) => unquote(&tok.text)
                .map(Some)
                .ok_or_else(|| SlqError::build(tok.span, &tok.text, "malformed quoted alias")),
            Some(tok) => Ok(Some(tok.text.clone())),
            None => {
                let text = alias.text.strip_prefix(':').unwrap_or(&alias.text);
                Ok(Some(text.to_string()))
            }
        }
    }

    fn selector(
        &mut self,
        parent: NodeId,
        pn: &ParseNode,
        alias: Option<String>,
    ) -> SlqResult<NodeId> {
        let mut names = Vec::with_capacity(2);
        for tok in &pn.children {
            names.push(name_text(tok)?);
        }
        let mut names = names.into_iter();
        let Some(name0) = names.next() else {
            return Err(SlqError::build(pn.span, &pn.text, "empty selector"));
        };
        let kind = NodeKind::Selector {
            name0,
            name1: names.next(),
            alias,
        };
        Ok(self.add(parent, kind, pn))
    }

    fn handle_table(&mut self, pn: &ParseNode, alias: Option<String>) -> SlqResult<NodeKind> {
        let [handle, table] = pn.children.as_slice() else {
            return Err(SlqError::build(pn.span, &pn.text, "expected @handle.table"));
        };
        self.ast.add_handle(&handle.text);
        Ok(NodeKind::TableSelector {
            handle: Some(handle.text.clone()),
            table: name_text(table)?,
            alias,
        })
    }

    /// `name(args)`, `_name(args)` or `count[(arg)]`.
    fn func(&mut self, parent: NodeId, pn: &ParseNode) -> SlqResult<NodeId> {
        let name_tok = first_child(pn)?;
        let (name, proprietary) = match name_tok.text.strip_prefix('_') {
            Some(stripped) if pn.rule == Rule::Func => (stripped.to_string(), true),
            _ => (name_tok.text.clone(), false),
        };
        let args = &pn.children[1..];

        if name == "count_unique" && args.len() != 1 {
            return Err(SlqError::build(
                pn.span,
                &pn.text,
                format!("count_unique takes exactly one argument, got {}", args.len()),
            ));
        }

        let func = self.add(
            parent,
            NodeKind::Func {
                name,
                alias: None,
                proprietary,
            },
            pn,
        );
        for arg in args {
            self.operand(func, arg)?;
        }
        Ok(func)
    }

    fn order_term(&mut self, parent: NodeId, pn: &ParseNode) -> SlqResult<()> {
        let direction = match pn.children.get(1).map(|d| d.text.as_str()) {
            None => Direction::None,
            Some("+") | Some("asc") => Direction::Asc,
            Some("-") | Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(SlqError::build(
                    pn.span,
                    &pn.text,
                    format!("invalid sort direction '{other}'"),
                ));
            }
        };
        let term = self.add(parent, NodeKind::OrderByTerm { direction }, pn);
        let target = first_child(pn)?;
        match target.rule {
            Rule::Selector => {
                self.selector(term, target, None)?;
            }
            _ => {
                self.func(term, target)?;
            }
        }
        Ok(())
    }

    fn join(&mut self, seg: NodeId, pn: &ParseNode) -> SlqResult<()> {
        let kw = first_child(pn)?;
        let join_type = JoinType::from_keyword(&kw.text).ok_or_else(|| {
            SlqError::build(kw.span, &kw.text, format!("unknown join type '{}'", kw.text))
        })?;
        let table = pn
            .child(Rule::JoinTable)
            .ok_or_else(|| SlqError::build(pn.span, &pn.text, "join requires a table"))?;

        let join = self.add(
            seg,
            NodeKind::Join {
                join_type,
                left: None,
                right: None,
            },
            pn,
        );

        let alias = self.alias(table)?;
        let target = first_child(table)?;
        match target.rule {
            Rule::HandleTable => {
                let kind = self.handle_table(target, alias)?;
                self.ast.add_child(join, kind, table.span);
            }
            _ => {
                let sel = self.selector(join, target, alias)?;
                self.ast.nodes[sel.0].span = table.span;
            }
        }

        let preds: Vec<&ParseNode> = pn.rule_children().filter(|c| c.rule != Rule::JoinTable).collect();
        match preds.as_slice() {
            [] => {}
            [pred] => {
                self.wrapped_expr(join, pred)?;
            }
            [_, extra, ..] => {
                return Err(SlqError::build(extra.span, &extra.text, "join takes a single predicate"));
            }
        }
        Ok(())
    }

    /// Build `pn` as an Expr node, wrapping a bare operand.
    fn wrapped_expr(&mut self, parent: NodeId, pn: &ParseNode) -> SlqResult<NodeId> {
        if pn.rule == Rule::Expr {
            return self.expr(parent, pn);
        }
        let expr = self.add(
            parent,
            NodeKind::Expr {
                parenthesized: false,
                alias: None,
            },
            pn,
        );
        self.operand(expr, pn)?;
        Ok(expr)
    }

    fn expr(&mut self, parent: NodeId, pn: &ParseNode) -> SlqResult<NodeId> {
        let parenthesized = pn
            .children
            .first()
            .is_some_and(|c| c.is_token(TokenKind::LParen));
        let expr = self.add(
            parent,
            NodeKind::Expr {
                parenthesized,
                alias: None,
            },
            pn,
        );

        for child in &pn.children {
            match child.rule {
                Rule::Token(TokenKind::LParen) | Rule::Token(TokenKind::RParen) => {}
                Rule::Token(TokenKind::Op) => {
                    self.add(
                        expr,
                        NodeKind::Operator {
                            text: child.text.clone(),
                        },
                        child,
                    );
                }
                _ => {
                    self.operand(expr, child)?;
                }
            }
        }
        Ok(expr)
    }

    fn operand(&mut self, parent: NodeId, pn: &ParseNode) -> SlqResult<NodeId> {
        match pn.rule {
            Rule::Selector => self.selector(parent, pn, None),
            Rule::Func | Rule::CountFunc => self.func(parent, pn),
            Rule::Expr => self.expr(parent, pn),
            Rule::Literal => {
                let tok = first_child(pn)?;
                let kind = match tok.rule {
                    Rule::Token(TokenKind::Null) => LiteralKind::Null,
                    Rule::Token(TokenKind::Int) => LiteralKind::Int,
                    Rule::Token(TokenKind::Float) => LiteralKind::Float,
                    Rule::Token(TokenKind::String) => LiteralKind::String,
                    _ => LiteralKind::Bool,
                };
                let kind = NodeKind::Literal {
                    kind,
                    text: tok.text.clone(),
                };
                Ok(self.add(parent, kind, pn))
            }
            Rule::Arg => {
                let name = pn.text.trim_start_matches('$').to_string();
                Ok(self.add(parent, NodeKind::Arg { name }, pn))
            }
            other => Err(SlqError::build(
                pn.span,
                &pn.text,
                format!("unexpected operand {other:?}"),
            )),
        }
    }
}

fn first_child(pn: &ParseNode) -> SlqResult<&ParseNode> {
    pn.children
        .first()
        .ok_or_else(|| SlqError::build(pn.span, &pn.text, "missing child node"))
}

fn name_text(tok: &ParseNode) -> SlqResult<String> {
    if tok.is_token(TokenKind::QuotedName) {
        unquote(&tok.text).ok_or_else(|| SlqError::build(tok.span, &tok.text, "malformed quoted name"))
    } else {
        Ok(tok.text.clone())
    }
}

/// Decode `.[...]` into `(offset, limit)`. `[]` yields no range at all.
fn row_range(pn: &ParseNode) -> SlqResult<Option<(i64, i64)>> {
    let int = |tok: &ParseNode| -> SlqResult<i64> {
        tok.text
            .parse::<i64>()
            .map_err(|e| SlqError::build(tok.span, &tok.text, format!("invalid row index: {e}")))
    };
    let colon = |tok: &ParseNode| tok.is_token(TokenKind::Colon);

    let range = match pn.children.as_slice() {
        [] => return Ok(None),
        [n] => (int(n)?, 1),
        [a, c, b] if colon(c) => {
            let (a, b) = (int(a)?, int(b)?);
            if b < a {
                return Err(SlqError::build(
                    pn.span,
                    &pn.text,
                    "row range end is before its start",
                ));
            }
            (a, b - a)
        }
        [c, b] if colon(c) => (0, int(b)?),
        [a, c] if colon(c) => (int(a)?, -1),
        _ => {
            return Err(SlqError::build(pn.span, &pn.text, "invalid row range"));
        }
    };
    Ok(Some(range))
}
