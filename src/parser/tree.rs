//! Concrete parse tree produced by the grammar.

use std::fmt;

use serde::Serialize;

/// Byte range into the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 1-based line and column (in chars) of `start` within `input`.
    pub fn line_col(&self, input: &str) -> (usize, usize) {
        let upto = &input[..self.start.min(input.len())];
        let line = upto.matches('\n').count() + 1;
        let line_start = upto.rfind('\n').map_or(0, |n| n + 1);
        let column = upto[line_start..].chars().count() + 1;
        (line, column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Terminal token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Name,
    QuotedName,
    Handle,
    Keyword,
    Op,
    Int,
    Float,
    String,
    Null,
    True,
    False,
    Colon,
    LParen,
    RParen,
    Direction,
}

/// Grammar rule that produced a [`ParseNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Query,
    Segment,
    Handle,
    HandleTable,
    SelectorElement,
    Selector,
    Alias,
    FuncElement,
    Func,
    CountFunc,
    UniqueFunc,
    Join,
    JoinTable,
    Where,
    GroupBy,
    Having,
    OrderBy,
    OrderByTerm,
    RowRange,
    ExprElement,
    Expr,
    Literal,
    Arg,
    Token(TokenKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub rule: Rule,
    pub span: Span,
    pub text: String,
    /// Levels in this subtree; a token has height 1.
    pub height: usize,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn is_token(&self, kind: TokenKind) -> bool {
        self.rule == Rule::Token(kind)
    }

    /// First child produced by `rule`.
    pub fn child(&self, rule: Rule) -> Option<&ParseNode> {
        self.children.iter().find(|c| c.rule == rule)
    }

    /// Children that are not terminal tokens.
    pub fn rule_children(&self) -> impl Iterator<Item = &ParseNode> {
        self.children
            .iter()
            .filter(|c| !matches!(c.rule, Rule::Token(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let input = "@a | .b\n| .c";
        assert_eq!(Span::new(0, 1).line_col(input), (1, 1));
        assert_eq!(Span::new(5, 7).line_col(input), (1, 6));
        assert_eq!(Span::new(10, 12).line_col(input), (2, 3));
    }
}
