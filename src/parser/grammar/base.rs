use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, satisfy},
    combinator::{recognize, value},
    error::{Error, ErrorKind},
};

use super::{Grammar, PResult};
use crate::parser::tree::{ParseNode, Rule, TokenKind};

/// Words that cannot name a function and need the alias workaround.
pub const KEYWORDS: &[&str] = &[
    "where",
    "having",
    "group_by",
    "gb",
    "order_by",
    "sort_by",
    "unique",
    "uniq",
    "count",
    "null",
    "true",
    "false",
    "asc",
    "desc",
];

pub const JOIN_KEYWORDS: &[&str] = &[
    "join",
    "inner_join",
    "left_join",
    "ljoin",
    "left_outer_join",
    "lojoin",
    "right_join",
    "rjoin",
    "right_outer_join",
    "rojoin",
    "full_outer_join",
    "fojoin",
    "cross_join",
    "xjoin",
];

pub fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(&word) || JOIN_KEYWORDS.contains(&word)
}

/// Skip whitespace and `#` line comments.
pub fn sp(input: &str) -> IResult<&str, ()> {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.strip_prefix('#') {
            Some(comment) => rest = comment.find('\n').map_or("", |n| &comment[n..]),
            None => return Ok((trimmed, ())),
        }
    }
}

/// Identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn ident(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Match one of `words` as a whole identifier.
pub fn keyword<'a>(input: &'a str, words: &[&str]) -> IResult<&'a str, &'a str> {
    let (rest, word) = ident(input)?;
    if words.contains(&word) {
        Ok((rest, word))
    } else {
        Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)))
    }
}

/// Double-quoted string including its quotes. Backslash escapes the next char.
pub fn quoted(input: &str) -> IResult<&str, &str> {
    let (rest, _) = char('"').parse(input)?;
    let mut escaped = false;
    for (idx, c) in rest.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let end = idx + 2;
                return Ok((&input[end..], &input[..end]));
            }
            _ => escaped = false,
        }
    }
    Err(nom::Err::Failure(Error::new(input, ErrorKind::Char)))
}

/// Strip the surrounding quotes of a double-quoted string and resolve escapes.
/// Returns `None` when `text` is not a well-formed quoted string.
pub fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            '"' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

fn literal_token(input: &str) -> IResult<&str, TokenKind> {
    let numeric_or_string = alt((
        value(TokenKind::Float, recognize((digit1, char('.'), digit1))),
        value(TokenKind::Int, digit1),
        value(TokenKind::String, quoted),
    ))
    .parse(input);

    match numeric_or_string {
        Err(nom::Err::Error(_)) => {
            let (rest, word) = keyword(input, &["null", "true", "false"])?;
            let kind = match word {
                "null" => TokenKind::Null,
                "true" => TokenKind::True,
                _ => TokenKind::False,
            };
            Ok((rest, kind))
        }
        other => other,
    }
}

impl<'a> Grammar<'a> {
    /// `.name` component: bare identifier or quoted string.
    pub(super) fn name(&self, input: &'a str) -> PResult<'a, ParseNode> {
        if let Ok((rest, _)) = quoted(input) {
            return Ok((rest, self.token(TokenKind::QuotedName, input, rest)));
        }
        let (rest, _) = ident(input)?;
        Ok((rest, self.token(TokenKind::Name, input, rest)))
    }

    /// `@handle` or `@handle.table`.
    pub(super) fn handle_element(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (after_at, _) = char('@').parse(input)?;
        let (rest, _) = ident(after_at)?;
        let handle = self.token(TokenKind::Handle, input, rest);

        if let Ok((after_dot, _)) = char::<_, Error<&str>>('.').parse(rest) {
            if let Ok((rest, table)) = self.name(after_dot) {
                return Ok((
                    rest,
                    self.node(Rule::HandleTable, input, rest, vec![handle, table]),
                ));
            }
        }
        Ok((rest, self.node(Rule::Handle, input, rest, vec![handle])))
    }

    /// `.name` or `.name.name`.
    pub(super) fn selector(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (after_dot, _) = char('.').parse(input)?;
        let (mut rest, first) = self.name(after_dot)?;
        let mut names = vec![first];

        if let Ok((after_dot, _)) = char::<_, Error<&str>>('.').parse(rest) {
            if let Ok((after_name, second)) = self.name(after_dot) {
                names.push(second);
                rest = after_name;
            }
        }
        Ok((rest, self.node(Rule::Selector, input, rest, names)))
    }

    /// `:alias`. A reserved word yields an alias node without an identifier token.
    pub(super) fn alias(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (after_colon, _) = char(':').parse(input)?;
        if let Ok((rest, _)) = quoted(after_colon) {
            let tok = self.token(TokenKind::QuotedName, after_colon, rest);
            return Ok((rest, self.node(Rule::Alias, input, rest, vec![tok])));
        }
        let (rest, word) = ident(after_colon)?;
        let children = if is_reserved(word) {
            vec![]
        } else {
            vec![self.token(TokenKind::Ident, after_colon, rest)]
        };
        Ok((rest, self.node(Rule::Alias, input, rest, children)))
    }

    pub(super) fn literal(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, kind) = literal_token(input)?;
        let tok = self.token(kind, input, rest);
        Ok((rest, self.node(Rule::Literal, input, rest, vec![tok])))
    }

    /// `$name` substitution variable.
    pub(super) fn arg(&self, input: &'a str) -> PResult<'a, ParseNode> {
        let (rest, _) = (char('$'), ident).parse(input)?;
        Ok((rest, self.node(Rule::Arg, input, rest, vec![])))
    }
}
