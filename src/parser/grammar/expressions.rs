//! Expression grammar with precedence climbing.
//!
//! Lowest to highest: `||`, `&&`, comparison, `<< >> &`, `+ -`, `* / %`,
//! unary `- + ! ~`, then primaries.

use nom::{
    Parser,
    branch::alt,
    character::complete::char,
    combinator::cut,
    error::{Error, ErrorKind},
};

use super::base::{ident, is_reserved, keyword, sp};
use super::{Grammar, MAX_EXPR_DEPTH, MAX_EXPR_HEIGHT, PResult};
use crate::parser::tree::{ParseNode, Rule, TokenKind};

const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["==", "!=", "<=", ">=", "<", ">"],
    &["<<", ">>", "&"],
    &["+", "-"],
    &["*", "/", "%"],
];

const ALL_OPERATORS: &[&str] = &[
    "||", "&&", "==", "!=", "<=", ">=", "<<", ">>", "<", ">", "&", "+", "-", "*", "/", "%",
];

/// Match the first of `ops` at the start of `input`, refusing a match that is
/// only the prefix of a longer operator (`&` in `&&`).
fn match_operator(input: &str, ops: &[&'static str]) -> Option<&'static str> {
    let op = ops.iter().copied().find(|op| input.starts_with(op))?;
    let longer = ALL_OPERATORS
        .iter()
        .any(|other| other.len() > op.len() && input.starts_with(other));
    (!longer).then_some(op)
}

fn too_deep(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Failure(Error::new(input, ErrorKind::TooLarge))
}

impl<'a> Grammar<'a> {
    pub(super) fn expr(&self, input: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        let (rest, node) = self.binary(input, 0, depth)?;
        if node.height > MAX_EXPR_HEIGHT {
            return Err(too_deep(input));
        }
        Ok((rest, node))
    }

    fn binary(&self, input: &'a str, level: usize, depth: usize) -> PResult<'a, ParseNode> {
        if level == BINARY_LEVELS.len() {
            return self.unary(input, depth);
        }
        let (mut rest, mut lhs) = self.binary(input, level + 1, depth)?;

        loop {
            let (op_start, _) = sp(rest)?;
            let Some(op) = match_operator(op_start, BINARY_LEVELS[level]) else {
                break;
            };
            let op_end = &op_start[op.len()..];
            let op_node = self.token(TokenKind::Op, op_start, op_end);
            let (rhs_start, _) = sp(op_end)?;
            let (after_rhs, rhs) =
                cut(|i: &'a str| self.binary(i, level + 1, depth)).parse(rhs_start)?;
            lhs = self.node(Rule::Expr, input, after_rhs, vec![lhs, op_node, rhs]);
            if lhs.height > MAX_EXPR_HEIGHT {
                return Err(too_deep(op_start));
            }
            rest = after_rhs;
        }
        Ok((rest, lhs))
    }

    fn unary(&self, input: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        let op = ["-", "+", "!", "~"]
            .into_iter()
            .find(|op| input.starts_with(op) && !input.starts_with("!="));
        let Some(op) = op else {
            return self.primary(input, depth);
        };
        if depth >= MAX_EXPR_DEPTH {
            return Err(too_deep(input));
        }

        let op_end = &input[op.len()..];
        let op_node = self.token(TokenKind::Op, input, op_end);
        let (operand_start, _) = sp(op_end)?;
        let (rest, operand) = cut(|i: &'a str| self.unary(i, depth + 1)).parse(operand_start)?;
        Ok((rest, self.node(Rule::Expr, input, rest, vec![op_node, operand])))
    }

    fn primary(&self, input: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        alt((
            |i: &'a str| self.paren(i, depth),
            |i: &'a str| self.selector(i),
            |i: &'a str| self.literal(i),
            |i: &'a str| self.arg(i),
            |i: &'a str| self.call(i, depth),
        ))
        .parse(input)
    }

    /// `( expr )`
    fn paren(&self, input: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        let (after_open, _) = char('(').parse(input)?;
        if depth >= MAX_EXPR_DEPTH {
            return Err(too_deep(input));
        }
        let open = self.token(TokenKind::LParen, input, after_open);

        let (rest, (inner, close)) = cut(|i: &'a str| -> PResult<'a, (ParseNode, ParseNode)> {
            let (i, _) = sp(i)?;
            let (i, inner) = self.expr(i, depth + 1)?;
            let (close_start, _) = sp(i)?;
            let (rest, _) = char(')').parse(close_start)?;
            Ok((rest, (inner, self.token(TokenKind::RParen, close_start, rest))))
        })
        .parse(after_open)?;
        Ok((rest, self.node(Rule::Expr, input, rest, vec![open, inner, close])))
    }

    /// `count`, `count()`, `count(*)`, `count(expr)` or `name(args)`.
    pub(super) fn call(&self, input: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        if let Ok((after_kw, _)) = keyword(input, &["count"]) {
            return self.count(input, after_kw, depth);
        }

        let (after_name, name) = ident(input)?;
        if is_reserved(name) {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
        }
        let (after_open, _) = char('(').parse(after_name)?;
        if depth >= MAX_EXPR_DEPTH {
            return Err(too_deep(input));
        }
        let mut children = vec![self.token(TokenKind::Ident, input, after_name)];
        let (rest, args) = cut(|i: &'a str| self.list(i, |a| self.expr(a, depth + 1)))
            .parse(after_open)?;
        children.extend(args);
        Ok((rest, self.node(Rule::Func, input, rest, children)))
    }

    fn count(&self, input: &'a str, after_kw: &'a str, depth: usize) -> PResult<'a, ParseNode> {
        let mut children = vec![self.token(TokenKind::Keyword, input, after_kw)];
        let Ok((after_open, _)) = char::<_, Error<&str>>('(').parse(after_kw) else {
            return Ok((after_kw, self.node(Rule::CountFunc, input, after_kw, children)));
        };

        let (rest, arg) = cut(|i: &'a str| -> PResult<'a, Option<ParseNode>> {
            let (i, _) = sp(i)?;
            let (i, arg) = match char::<_, Error<&str>>('*').parse(i) {
                Ok((after_star, _)) => (after_star, None),
                Err(_) if i.starts_with(')') => (i, None),
                Err(_) => {
                    let (after, arg) = self.expr(i, depth + 1)?;
                    (after, Some(arg))
                }
            };
            let (i, _) = (sp, char(')')).parse(i)?;
            Ok((i, arg))
        })
        .parse(after_open)?;
        children.extend(arg);
        Ok((rest, self.node(Rule::CountFunc, input, rest, children)))
    }
}
