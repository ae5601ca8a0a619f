use super::*;
use crate::error::SlqError;

fn rules(node: &ParseNode) -> Vec<Rule> {
    node.children.iter().map(|c| c.rule).collect()
}

#[test]
fn test_parse_segments() {
    let tree = parse("@mydb1 | .user | .uid, .username").unwrap();
    assert_eq!(tree.rule, Rule::Query);
    assert_eq!(tree.children.len(), 3);
    assert_eq!(rules(&tree.children[0]), vec![Rule::Handle]);
    assert_eq!(rules(&tree.children[1]), vec![Rule::SelectorElement]);
    assert_eq!(
        rules(&tree.children[2]),
        vec![Rule::SelectorElement, Rule::SelectorElement]
    );
    assert_eq!(tree.children[2].children[1].text, ".username");
}

#[test]
fn test_parse_spans() {
    let tree = parse("  @h | .actor  ").unwrap();
    assert_eq!(tree.span, Span::new(2, 13));
    let actor = &tree.children[1].children[0];
    assert_eq!(actor.span, Span::new(7, 13));
    assert_eq!(actor.text, ".actor");
}

#[test]
fn test_parse_handle_table() {
    let tree = parse("@sakila.actor | .first_name").unwrap();
    let elem = &tree.children[0].children[0];
    assert_eq!(elem.rule, Rule::HandleTable);
    assert_eq!(elem.children[0].text, "@sakila");
    assert_eq!(elem.children[1].text, "actor");
}

#[test]
fn test_parse_quoted_selector() {
    let tree = parse(r#".actor | ."first name""#).unwrap();
    let sel = &tree.children[1].children[0].children[0];
    assert_eq!(sel.rule, Rule::Selector);
    assert!(sel.children[0].is_token(TokenKind::QuotedName));
}

#[test]
fn test_parse_row_range_tokens() {
    let tree = parse(".actor | .[1:3]").unwrap();
    let range = &tree.children[1].children[0];
    assert_eq!(range.rule, Rule::RowRange);
    let kinds: Vec<Rule> = range.children.iter().map(|c| c.rule).collect();
    assert_eq!(
        kinds,
        vec![
            Rule::Token(TokenKind::Int),
            Rule::Token(TokenKind::Colon),
            Rule::Token(TokenKind::Int)
        ]
    );

    let tree = parse(".actor | .[]").unwrap();
    assert!(tree.children[1].children[0].children.is_empty());
}

#[test]
fn test_parse_row_range_lone_colon_fails() {
    assert!(parse(".actor | .[:]").is_err());
}

#[test]
fn test_parse_join() {
    let tree = parse(".user | join(.address:a, .uid)").unwrap();
    let join = &tree.children[1].children[0];
    assert_eq!(join.rule, Rule::Join);
    assert_eq!(join.children[0].text, "join");
    assert_eq!(join.children[1].rule, Rule::JoinTable);
    assert_eq!(rules(&join.children[1]), vec![Rule::Selector, Rule::Alias]);
    assert_eq!(join.children[2].rule, Rule::Selector);
}

#[test]
fn test_parse_where_precedence() {
    let tree = parse(".x | where(.a == 1 || .b > 2 && .c < 3)").unwrap();
    let clause = &tree.children[1].children[0];
    assert_eq!(clause.rule, Rule::Where);
    let or = &clause.children[0];
    assert_eq!(or.children[1].text, "||");
    let and = &or.children[2];
    assert_eq!(and.children[1].text, "&&");
}

#[test]
fn test_parse_double_pipe_is_not_a_segment_break() {
    let tree = parse(".x | where(.a || .b)").unwrap();
    assert_eq!(tree.children.len(), 2);
}

#[test]
fn test_parse_keyword_alias_has_no_ident() {
    let tree = parse(".actor | .name:count").unwrap();
    let elem = &tree.children[1].children[0];
    let alias = elem.child(Rule::Alias).unwrap();
    assert_eq!(alias.text, ":count");
    assert!(alias.children.is_empty());

    let tree = parse(".actor | .name:nm").unwrap();
    let alias = tree.children[1].children[0].child(Rule::Alias).unwrap();
    assert_eq!(alias.children[0].text, "nm");
}

#[test]
fn test_parse_count_forms() {
    for query in [".a | count", ".a | count()", ".a | count(*)"] {
        let tree = parse(query).unwrap();
        let elem = &tree.children[1].children[0];
        assert_eq!(elem.rule, Rule::FuncElement);
        assert_eq!(elem.children[0].rule, Rule::CountFunc);
        assert_eq!(elem.children[0].children.len(), 1, "{query}");
    }

    let tree = parse(".a | count(.id):n").unwrap();
    let func = &tree.children[1].children[0].children[0];
    assert_eq!(func.children.len(), 2);
}

#[test]
fn test_parse_order_terms() {
    let tree = parse(".a | order_by(.x+, .y desc, .z)").unwrap();
    let order = &tree.children[1].children[0];
    assert_eq!(order.rule, Rule::OrderBy);
    let dirs: Vec<Option<&str>> = order
        .children
        .iter()
        .map(|t| t.children.get(1).map(|d| d.text.as_str()))
        .collect();
    assert_eq!(dirs, vec![Some("+"), Some("desc"), None]);
}

#[test]
fn test_parse_expression_element() {
    let tree = parse(".a | .x + .y:total").unwrap();
    let elem = &tree.children[1].children[0];
    assert_eq!(elem.rule, Rule::ExprElement);
    assert_eq!(rules(elem), vec![Rule::Expr, Rule::Alias]);
}

#[test]
fn test_parse_comments() {
    let tree = parse("@h # source\n| .actor # table\n").unwrap();
    assert_eq!(tree.children.len(), 2);
}

#[test]
fn test_parse_error_trailing_input() {
    let err = parse(".a ?").unwrap_err();
    match err {
        SlqError::Parse {
            position, message, ..
        } => {
            assert_eq!(position, 3);
            assert_eq!(message, "unexpected input: '?'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_error_end_of_input() {
    let err = parse("@a | .b |").unwrap_err();
    match err {
        SlqError::Parse {
            line,
            column,
            message,
            ..
        } => {
            assert_eq!((line, column), (1, 10));
            assert_eq!(message, "unexpected end of input");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_error_unterminated_string() {
    let err = parse(r#".x | where(.a == "abc)"#).unwrap_err();
    assert!(matches!(err, SlqError::Parse { position: 17, .. }));
}

#[test]
fn test_parse_nesting_limit() {
    let depth = grammar::MAX_EXPR_DEPTH + 8;
    let query = format!(".x | where({}1{})", "(".repeat(depth), ")".repeat(depth));
    let err = parse(&query).unwrap_err();
    assert!(err.to_string().contains("expression nesting too deep"));

    let ok = format!(".x | where({}1{})", "(".repeat(4), ")".repeat(4));
    assert!(parse(&ok).is_ok());
}

#[test]
fn test_parse_long_operator_chain() {
    let terms = vec!["1"; 2000].join(" + ");
    let err = parse(&format!(".x | where(.a == {terms})")).unwrap_err();
    assert!(err.to_string().contains("expression nesting too deep"));

    let terms = vec![".a"; 20].join(" && ");
    let tree = parse(&format!(".x | where({terms})")).unwrap();
    assert!(tree.height <= grammar::MAX_EXPR_HEIGHT + 8);
}

#[test]
fn test_parse_empty_input() {
    assert!(parse("   ").is_err());
}
