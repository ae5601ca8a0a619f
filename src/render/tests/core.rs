use pretty_assertions::assert_eq;

use super::{render_error, sql, sqlite, with_args};
use crate::ast::Inspector;
use crate::error::SlqError;
use crate::render::{DefaultRenderer, Dialect, Fragments, RenderContext, Renderer};

#[test]
fn test_select_columns() {
    assert_eq!(
        sqlite("@mydb1 | .user | .uid, .username"),
        r#"SELECT "uid", "username" FROM "user""#
    );
}

#[test]
fn test_select_star_without_columns() {
    assert_eq!(sqlite("@mydb1 | .user"), r#"SELECT * FROM "user""#);
}

#[test]
fn test_row_range() {
    assert_eq!(
        sqlite("@mydb1 | .user | .uid, .username | .[2]"),
        r#"SELECT "uid", "username" FROM "user" LIMIT 1 OFFSET 2"#
    );
    assert_eq!(
        sqlite(".user | .[:3]"),
        r#"SELECT * FROM "user" LIMIT 3"#
    );
    assert_eq!(sqlite(".user | .[]"), r#"SELECT * FROM "user""#);
}

#[test]
fn test_inner_join_shorthand() {
    assert_eq!(
        sqlite("@mydb1 | .user | join(.address, .uid) | .uid, .country"),
        r#"SELECT "uid", "country" FROM "user" INNER JOIN "address" ON "user"."uid" = "address"."uid""#
    );
}

#[test]
fn test_join_prefers_aliases() {
    assert_eq!(
        sqlite(".user:u | left_join(.address:a, .uid) | .u.uid, .a.city"),
        r#"SELECT "u"."uid", "a"."city" FROM "user" AS "u" LEFT JOIN "address" AS "a" ON "u"."uid" = "a"."uid""#
    );
}

#[test]
fn test_join_with_expression() {
    assert_eq!(
        sqlite(".film | join(.language, .film.language_id == .language.language_id)"),
        r#"SELECT * FROM "film" INNER JOIN "language" ON "film"."language_id" = "language"."language_id""#
    );
}

#[test]
fn test_chained_joins() {
    assert_eq!(
        sqlite(".a | join(.b, .id) | join(.c, .id)"),
        r#"SELECT * FROM "a" INNER JOIN "b" ON "a"."id" = "b"."id" INNER JOIN "c" ON "b"."id" = "c"."id""#
    );
}

#[test]
fn test_cross_join() {
    assert_eq!(
        sqlite(".actor | xjoin(.film)"),
        r#"SELECT * FROM "actor" CROSS JOIN "film""#
    );
}

#[test]
fn test_where() {
    assert_eq!(
        sqlite("@mydb1 | .actor | where(.uid > 4) | .uid"),
        r#"SELECT "uid" FROM "actor" WHERE "uid" > 4"#
    );
    assert_eq!(
        sqlite(".actor | where(.a > 1 && (.b < 2 || .c != 3))"),
        r#"SELECT * FROM "actor" WHERE "a" > 1 AND ("b" < 2 OR "c" != 3)"#
    );
}

#[test]
fn test_multiple_wheres_are_anded() {
    assert_eq!(
        sqlite(".actor | where(.a > 1) | where(.b < 2)"),
        r#"SELECT * FROM "actor" WHERE ("a" > 1) AND ("b" < 2)"#
    );
}

#[test]
fn test_null_comparison() {
    assert_eq!(
        sqlite(".actor | where(.last_update == null)"),
        r#"SELECT * FROM "actor" WHERE "last_update" IS NULL"#
    );
    assert_eq!(
        sqlite(".actor | where(.last_update != null)"),
        r#"SELECT * FROM "actor" WHERE "last_update" IS NOT NULL"#
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        sqlite(".actor | where(!(.a == 1)) | -.b"),
        r#"SELECT -"b" FROM "actor" WHERE NOT ("a" = 1)"#
    );
}

#[test]
fn test_unary_inside_binary_is_parenthesized() {
    assert_eq!(
        sql(".actor | where(!.a == .b)", Dialect::Postgres),
        r#"SELECT * FROM "actor" WHERE (NOT "a") = "b""#
    );
    assert_eq!(
        sqlite(".actor | where(.a > -.b && !.c)"),
        r#"SELECT * FROM "actor" WHERE "a" > (-"b") AND (NOT "c")"#
    );
    assert_eq!(
        sqlite(".actor | - -.b"),
        r#"SELECT -(-"b") FROM "actor""#
    );
}

#[test]
fn test_string_literal_quoting() {
    assert_eq!(
        sqlite(r#".actor | where(.last_name == "O'Brien")"#),
        r#"SELECT * FROM "actor" WHERE "last_name" = 'O''Brien'"#
    );
}

#[test]
fn test_count() {
    assert_eq!(
        sqlite("@mydb1 | .actor | count"),
        r#"SELECT count(*) FROM "actor""#
    );
    assert_eq!(
        sqlite(".actor | count(*):n"),
        r#"SELECT count(*) AS "n" FROM "actor""#
    );
    assert_eq!(
        sqlite(".actor | count(.first_name)"),
        r#"SELECT count("first_name") FROM "actor""#
    );
}

#[test]
fn test_count_unique() {
    assert_eq!(
        sqlite(".actor | count_unique(.first_name)"),
        r#"SELECT count(DISTINCT "first_name") FROM "actor""#
    );
}

#[test]
fn test_proprietary_function() {
    assert_eq!(
        sqlite(".actor | _lower(.first_name):lname"),
        r#"SELECT lower("first_name") AS "lname" FROM "actor""#
    );
}

#[test]
fn test_aliases() {
    assert_eq!(
        sqlite(".actor:a | .first_name:name, .last_name"),
        r#"SELECT "first_name" AS "name", "last_name" FROM "actor" AS "a""#
    );
}

#[test]
fn test_expression_column() {
    assert_eq!(
        sqlite(".film | .rental_rate * .length:cost"),
        r#"SELECT "rental_rate" * "length" AS "cost" FROM "film""#
    );
}

#[test]
fn test_distinct() {
    assert_eq!(
        sqlite(".actor | unique | .first_name"),
        r#"SELECT DISTINCT "first_name" FROM "actor""#
    );
}

#[test]
fn test_group_by_having() {
    assert_eq!(
        sqlite(".payment | group_by(.customer_id) | having(sum(.amount) > 100) | .customer_id"),
        r#"SELECT "customer_id" FROM "payment" GROUP BY "customer_id" HAVING sum("amount") > 100"#
    );
}

#[test]
fn test_order_by() {
    assert_eq!(
        sqlite(".actor | order_by(.last_name, .first_name-, .actor_id asc) | .first_name"),
        r#"SELECT "first_name" FROM "actor" ORDER BY "last_name", "first_name" DESC, "actor_id" ASC"#
    );
}

#[test]
fn test_clause_order() {
    assert_eq!(
        sqlite(
            ".payment | where(.amount > 1) | group_by(.customer_id) | having(count > 2) | order_by(.customer_id) | .customer_id | .[10:20]"
        ),
        r#"SELECT "customer_id" FROM "payment" WHERE "amount" > 1 GROUP BY "customer_id" HAVING count(*) > 2 ORDER BY "customer_id" LIMIT 10 OFFSET 10"#
    );
}

#[test]
fn test_booleans() {
    assert_eq!(
        sqlite(".actor | where(.active == true)"),
        r#"SELECT * FROM "actor" WHERE "active" = 1"#
    );
    assert_eq!(
        sql(".actor | where(.active == false)", Dialect::Postgres),
        r#"SELECT * FROM "actor" WHERE "active" = false"#
    );
}

#[test]
fn test_args() {
    assert_eq!(
        with_args(".actor | where(.first_name == $name)", &[("name", "it's")]).unwrap(),
        r#"SELECT * FROM "actor" WHERE "first_name" = 'it''s'"#
    );
    match with_args(".actor | where(.first_name == $name)", &[]) {
        Err(SlqError::Render { message, .. }) => assert!(message.contains("$name")),
        other => panic!("expected render error, got {other:?}"),
    }
}

#[test]
fn test_no_table() {
    assert_eq!(sqlite("1 + 2:three"), r#"SELECT 1 + 2 AS "three""#);
}

#[test]
fn test_multiple_tables_need_a_join() {
    // two tables in separate segments
    let err = render_error(".actor | @db.film", Dialect::Sqlite);
    assert!(err.to_string().contains("multiple tables require a join"));

    let err = render_error("@db | .actor, .film", Dialect::Sqlite);
    assert!(err.to_string().contains("multiple tables require a join"));
}

#[test]
fn test_rownum() {
    assert_eq!(
        sqlite(".actor | order_by(.last_name) | rownum():n"),
        r#"SELECT (row_number() OVER (ORDER BY "last_name")) AS "n" FROM "actor" ORDER BY "last_name""#
    );
}

#[test]
fn test_default_renderer_and_fragments() {
    let ast = crate::parse(".actor | where(.a == 1) | .a | .[5:]").unwrap();
    let config = Dialect::Postgres.config();
    let args = Default::default();
    let ctx = RenderContext::new(&ast, &config, &args);
    let fragments = DefaultRenderer.fragments(&ctx).unwrap();
    assert_eq!(
        fragments,
        Fragments {
            columns: r#""a""#.to_string(),
            from: r#"FROM "actor""#.to_string(),
            where_clause: r#"WHERE "a" = 1"#.to_string(),
            range: "OFFSET 5".to_string(),
            ..Default::default()
        }
    );
    assert_eq!(
        DefaultRenderer.render(&ctx).unwrap(),
        r#"SELECT "a" FROM "actor" WHERE "a" = 1 OFFSET 5"#
    );
}

struct UpperRenderer;

impl Renderer for UpperRenderer {
    fn function_name<'n>(&self, name: &'n str) -> &'n str {
        match name {
            "len" => "LENGTH",
            other => other,
        }
    }
}

#[test]
fn test_custom_renderer_overrides_one_fragment() {
    let ast = crate::parse(".actor | len(.first_name)").unwrap();
    let config = Dialect::Sqlite.config();
    let args = Default::default();
    let ctx = RenderContext::new(&ast, &config, &args);
    assert!(Inspector::new(&ast).find_result_column_segment().is_some());
    assert_eq!(
        UpperRenderer.render(&ctx).unwrap(),
        r#"SELECT LENGTH("first_name") FROM "actor""#
    );
}
