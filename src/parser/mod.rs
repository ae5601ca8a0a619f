//! SLQ parser using nom.
//!
//! Turns query text into a concrete [`ParseNode`] tree. The tree keeps every
//! token with its span so later stages can point at the offending source.
//!
//! # Syntax Overview
//!
//! ```text
//! @sakila | .actor | where(.actor_id > 100) | .first_name, .last_name | .[0:10]
//! @sakila | .film:f | join(.language:l, .language_id) | .f.title, .l.name
//! @sakila | .payment | group_by(.customer_id) | having(sum(.amount) > 100) | .customer_id
//! ```

pub mod grammar;
pub mod tree;

#[cfg(test)]
mod tests;

pub use tree::{ParseNode, Rule, Span, TokenKind};

use nom::error::ErrorKind;

use crate::error::{SlqError, SlqResult};
use grammar::Grammar;

/// Parse a complete SLQ query into its parse tree.
pub fn parse(input: &str) -> SlqResult<ParseNode> {
    let grammar = Grammar::new(input);

    match grammar.parse_root(input) {
        Ok(("", tree)) => Ok(tree),
        Ok((remaining, _)) => Err(SlqError::parse(
            input,
            input.len() - remaining.len(),
            format!("unexpected input: '{}'", snippet(remaining)),
        )),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            let message = match e.code {
                ErrorKind::TooLarge => "expression nesting too deep".to_string(),
                _ if e.input.is_empty() => "unexpected end of input".to_string(),
                _ => format!("unexpected input: '{}'", snippet(e.input)),
            };
            Err(SlqError::parse(input, position, message))
        }
        Err(nom::Err::Incomplete(_)) => Err(SlqError::parse(
            input,
            input.len(),
            "unexpected end of input",
        )),
    }
}

fn snippet(rest: &str) -> &str {
    match rest.char_indices().nth(20) {
        Some((idx, _)) => &rest[..idx],
        None => rest,
    }
}
