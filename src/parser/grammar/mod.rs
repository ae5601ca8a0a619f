//! SLQ grammar built from nom combinators.
//!
//! Every parser method receives a suffix of the query text, so node spans are
//! recovered from the remaining input length alone.

pub mod base;
pub mod elements;
pub mod expressions;

use nom::{IResult, Parser, character::complete::char, combinator::not};

use self::base::sp;
use super::tree::{ParseNode, Rule, Span, TokenKind};

/// Maximum nesting of parentheses, unary operators and function calls.
pub const MAX_EXPR_DEPTH: usize = 32;

/// Maximum height of an expression tree, binary operator chains included.
pub const MAX_EXPR_HEIGHT: usize = 128;

pub(crate) type PResult<'a, T> = IResult<&'a str, T>;

pub struct Grammar<'a> {
    src: &'a str,
}

impl<'a> Grammar<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }

    fn offset(&self, input: &'a str) -> usize {
        self.src.len() - input.len()
    }

    /// Node covering the text between `from` and `to`, both suffixes of the source.
    fn node(&self, rule: Rule, from: &'a str, to: &'a str, children: Vec<ParseNode>) -> ParseNode {
        let span = Span::new(self.offset(from), self.offset(to));
        let height = 1 + children.iter().map(|c| c.height).max().unwrap_or(0);
        ParseNode {
            rule,
            span,
            text: self.src[span.start..span.end].to_string(),
            height,
            children,
        }
    }

    fn token(&self, kind: TokenKind, from: &'a str, to: &'a str) -> ParseNode {
        self.node(Rule::Token(kind), from, to, vec![])
    }

    /// query := segment ('|' segment)*
    pub fn parse_root(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (input, _) = sp(input)?;
        let start = input;
        let (mut rest, first) = self.segment(input)?;
        let mut segments = vec![first];

        loop {
            let Ok((after_pipe, _)) = (sp, pipe).parse(rest) else {
                break;
            };
            let (after_ws, _) = sp(after_pipe)?;
            let (after_seg, seg) = self.segment(after_ws)?;
            segments.push(seg);
            rest = after_seg;
        }

        let query = self.node(Rule::Query, start, rest, segments);
        let (rest, _) = sp(rest)?;
        Ok((rest, query))
    }

    /// segment := element (',' element)*
    fn segment(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (mut rest, first) = self.element(input)?;
        let mut elements = vec![first];

        loop {
            let Ok((after_comma, _)) = (sp, char(','), sp).parse(rest) else {
                break;
            };
            let (after_elem, elem) = self.element(after_comma)?;
            elements.push(elem);
            rest = after_elem;
        }
        Ok((rest, self.node(Rule::Segment, input, rest, elements)))
    }
}

/// Segment separator; `||` is the OR operator.
fn pipe(input: &str) -> IResult<&str, char> {
    let (rest, c) = char('|').parse(input)?;
    let (rest, _) = not(char('|')).parse(rest)?;
    Ok((rest, c))
}
