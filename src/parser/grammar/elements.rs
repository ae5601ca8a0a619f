//! Segment elements: handles, joins, clauses, row ranges and result columns.

use nom::{
    Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::cut,
    error::{Error, ErrorKind},
};

use super::base::{JOIN_KEYWORDS, keyword, sp};
use super::{Grammar, PResult};
use crate::parser::tree::{ParseNode, Rule, TokenKind};

impl<'a> Grammar<'a> {
    pub(super) fn element(&self, input: &'a str) -> PResult<'a, ParseNode> {
        alt((
            |i: &'a str| self.handle_element(i),
            |i: &'a str| self.row_range(i),
            |i: &'a str| self.join(i),
            |i: &'a str| self.clause(i),
            |i: &'a str| self.unique(i),
            |i: &'a str| self.expr_element(i),
        ))
        .parse(input)
    }

    /// `kw(.table[:alias][, predicate])`
    fn join(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (after_kw, _) = keyword(input, JOIN_KEYWORDS)?;
        let kw = self.token(TokenKind::Keyword, input, after_kw);
        let (rest, _) = (sp, char('(')).parse(after_kw)?;
        let (rest, mut children) = cut(|i: &'a str| self.join_body(i)).parse(rest)?;
        children.insert(0, kw);
        Ok((rest, self.node(Rule::Join, input, rest, children)))
    }

    fn join_body(&self, input: &'a str) -> PResult<'a, Vec<ParseNode>> {
        let (rest, _) = sp(input)?;
        let (rest, table) = self.join_table(rest)?;
        let mut children = vec![table];

        let rest = match (sp, char(','), sp).parse(rest) {
            Ok((after_comma, _)) => {
                let (after_pred, pred) = self.expr(after_comma, 1)?;
                children.push(pred);
                after_pred
            }
            Err(_) => rest,
        };
        let (rest, _) = (sp, char(')')).parse(rest)?;
        Ok((rest, children))
    }

    fn join_table(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, table) = alt((
            |i: &'a str| self.handle_element(i),
            |i: &'a str| self.selector(i),
        ))
        .parse(input)?;
        let mut children = vec![table];
        let rest = match self.alias(rest) {
            Ok((after_alias, alias)) => {
                children.push(alias);
                after_alias
            }
            Err(_) => rest,
        };
        Ok((rest, self.node(Rule::JoinTable, input, rest, children)))
    }

    /// `where(..)`, `having(..)`, `group_by(..)` and `order_by(..)`.
    fn clause(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (after_kw, word) = keyword(
            input,
            &["where", "having", "group_by", "gb", "order_by", "sort_by"],
        )?;
        let (rest, _) = (sp, char('(')).parse(after_kw)?;

        let (rule, (rest, children)) = match word {
            "where" => (Rule::Where, cut(|i: &'a str| self.expr_list(i)).parse(rest)?),
            "having" => (Rule::Having, cut(|i: &'a str| self.expr_list(i)).parse(rest)?),
            "group_by" | "gb" => (Rule::GroupBy, cut(|i: &'a str| self.expr_list(i)).parse(rest)?),
            _ => (Rule::OrderBy, cut(|i: &'a str| self.order_terms(i)).parse(rest)?),
        };
        Ok((rest, self.node(rule, input, rest, children)))
    }

    /// Comma separated expressions up to and including the closing paren.
    /// An empty list is accepted here and rejected by the AST builder.
    fn expr_list(&self, input: &'a str) -> PResult<'a, Vec<ParseNode>> {
        self.list(input, |i| self.expr(i, 1))
    }

    fn order_terms(&self, input: &'a str) -> PResult<'a, Vec<ParseNode>> {
        self.list(input, |i| self.order_term(i))
    }

    pub(super) fn list<F>(&self, input: &'a str, mut item: F) -> PResult<'a, Vec<ParseNode>>
    where
        F: FnMut(&'a str) -> PResult<'a, ParseNode>,
    {
        let (mut rest, _) = sp(input)?;
        let mut items = Vec::new();

        if let Ok((after, _)) = char::<_, Error<&str>>(')').parse(rest) {
            return Ok((after, items));
        }
        loop {
            let (after_item, node) = item(rest)?;
            items.push(node);
            let (after_ws, _) = sp(after_item)?;
            match char::<_, Error<&str>>(',').parse(after_ws) {
                Ok((after_comma, _)) => rest = sp(after_comma)?.0,
                Err(_) => {
                    let (after_paren, _) = char(')').parse(after_ws)?;
                    return Ok((after_paren, items));
                }
            }
        }
    }

    /// `.col`, `.col+`, `.col-`, `.col asc`, `.col desc`, or a function call.
    fn order_term(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, target) = alt((
            |i: &'a str| self.selector(i),
            |i: &'a str| self.call(i, 1),
        ))
        .parse(input)?;
        let mut children = vec![target];

        let rest = if let Ok((after, _)) = alt((tag::<_, _, Error<&str>>("+"), tag("-"))).parse(rest) {
            children.push(self.token(TokenKind::Direction, rest, after));
            after
        } else if let Ok((after, _)) = (sp, |i: &'a str| keyword(i, &["asc", "desc"])).parse(rest) {
            let (dir_start, _) = sp(rest)?;
            children.push(self.token(TokenKind::Direction, dir_start, after));
            after
        } else {
            rest
        };
        Ok((rest, self.node(Rule::OrderByTerm, input, rest, children)))
    }

    /// `.[ ]`, `.[n]`, `.[a:b]`, `.[:b]`, `.[a:]`
    pub(super) fn row_range(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, _) = tag(".[").parse(input)?;
        let (rest, children) = cut(|i: &'a str| self.row_range_body(i)).parse(rest)?;
        Ok((rest, self.node(Rule::RowRange, input, rest, children)))
    }

    fn row_range_body(&self, input: &'a str) -> PResult<'a, Vec<ParseNode>> {
        let mut children = Vec::new();
        let (mut rest, _) = sp(input)?;

        if let Ok((after, _)) = digit1::<_, Error<&str>>(rest) {
            children.push(self.token(TokenKind::Int, rest, after));
            rest = sp(after)?.0;
        }
        if let Ok((after, _)) = char::<_, Error<&str>>(':').parse(rest) {
            children.push(self.token(TokenKind::Colon, rest, after));
            rest = sp(after)?.0;
            if let Ok((after, _)) = digit1::<_, Error<&str>>(rest) {
                children.push(self.token(TokenKind::Int, rest, after));
                rest = sp(after)?.0;
            }
            if children.len() == 1 {
                return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Digit)));
            }
        }
        let (rest, _) = char(']').parse(rest)?;
        Ok((rest, children))
    }

    fn unique(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, _) = keyword(input, &["unique", "uniq"])?;
        let kw = self.token(TokenKind::Keyword, input, rest);
        Ok((rest, self.node(Rule::UniqueFunc, input, rest, vec![kw])))
    }

    /// A result column: selector, function call or arbitrary expression, with an
    /// optional alias.
    fn expr_element(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, expr) = self.expr(input, 0)?;
        let rule = match expr.rule {
            Rule::Selector => Rule::SelectorElement,
            Rule::Func | Rule::CountFunc => Rule::FuncElement,
            _ => Rule::ExprElement,
        };
        let mut children = vec![expr];
        let rest = match self.alias(rest) {
            Ok((after_alias, alias)) => {
                children.push(alias);
                after_alias
            }
            Err(nom::Err::Failure(e)) => return Err(nom::Err::Failure(e)),
            Err(_) => rest,
        };
        Ok((rest, self.node(rule, input, rest, children)))
    }
}
