use super::*;
use crate::error::QbError;
use crate::expr::{Expr, arg, column, column_of, literal, sum};
use crate::param::Param;

fn sql(q: QueryBuilder) -> String {
    q.build().unwrap().sql()
}

fn err(q: QueryBuilder) -> QbError {
    q.build().unwrap_err()
}

// ==================== Rendering ====================

#[test]
fn test_default_projection_is_star() {
    assert_eq!(sql(select().from("table_a")), "SELECT * FROM table_a");
    assert_eq!(sql(select().all_columns().from("table_a")), "SELECT * FROM table_a");
}

#[test]
fn test_clause_order_is_fixed() {
    let q = select()
        .order_by("col_a")
        .limit(5)
        .group_by("col_a")
        .having("count(*) > 1")
        .where_("col_b = 1")
        .join("table_b")
        .from("table_a");
    assert_eq!(
        sql(q),
        "SELECT * FROM table_a JOIN table_b WHERE (col_b = 1) GROUP BY col_a HAVING (count(*) > 1) ORDER BY col_a LIMIT 5"
    );
}

#[test]
fn test_from_replaces_source_and_alias() {
    let q = select().from("table_a").alias("a").from("table_b");
    assert_eq!(sql(q), "SELECT * FROM table_b");
}

#[test]
fn test_order_by_collation_and_direction() {
    let q = select()
        .from("table_a")
        .order_by("col_a")
        .collate(CollatingSequence::NoCase)
        .desc()
        .order_by(column("col_b"))
        .asc();
    assert_eq!(
        sql(q),
        "SELECT * FROM table_a ORDER BY col_a COLLATE NOCASE DESC, col_b ASC"
    );
}

#[test]
fn test_trailing_clauses_render_after_compound_chain() {
    let q = select()
        .from("table_a")
        .order_by("col_a")
        .limit(3)
        .union_all()
        .select()
        .from("table_b");
    assert_eq!(
        sql(q),
        "SELECT * FROM table_a UNION ALL SELECT * FROM table_b ORDER BY col_a LIMIT 3"
    );
}

#[test]
fn test_union_then_all_becomes_union_all() {
    let q = select().from("a").union().all().select().from("b");
    assert_eq!(sql(q), "SELECT * FROM a UNION ALL SELECT * FROM b");

    let q = select().from("a").union().select().distinct().from("b").all();
    assert_eq!(sql(q), "SELECT * FROM a UNION SELECT * FROM b");
}

#[test]
fn test_nested_builder_as_source() {
    let inner = select().column("id").from("table_b").where_with(column("x").eq(arg()), [7]);
    let q = select().from(inner).alias("sub");
    let built = q.build().unwrap().to_sql();
    assert_eq!(built.sql, "SELECT * FROM (SELECT id FROM table_b WHERE (x == ?)) AS sub");
    assert_eq!(built.args, vec!["7"]);
}

#[test]
fn test_failed_nested_builder_propagates() {
    let inner = select().from("table_b").limit(1).limit(2);
    assert!(err(select().from(inner)).is_invalid_state());
}

// ==================== Argument ordering ====================

#[test]
fn test_args_follow_text_order_not_call_order() {
    let sub = select()
        .column("id")
        .from("table_c")
        .where_with("kind = ?", ["k"])
        .build()
        .unwrap();
    let q = select()
        .expr(column("a").in_(sub.clone()))
        .from("table_a")
        .group_by("a")
        .having_with("count(*) > ?", [3])
        .where_with("b = ?", [2])
        .join("table_b")
        .on_with("table_b.x = ?", [1])
        .order_by(column("c").in_(sub));
    let built = q.build().unwrap().to_sql();
    assert_eq!(
        built.sql,
        "SELECT a IN (SELECT id FROM table_c WHERE (kind = ?)) FROM table_a \
         JOIN table_b ON (table_b.x = ?) WHERE (b = ?) GROUP BY a HAVING (count(*) > ?) \
         ORDER BY c IN (SELECT id FROM table_c WHERE (kind = ?))"
    );
    assert_eq!(built.args, vec!["k", "1", "2", "3", "k"]);
}

// ==================== Errors ====================

#[test]
fn test_having_without_group_by_fails_eagerly() {
    let q = select().from("table_a").having_with("col_a=?", [1]);
    assert!(q.build_error().is_some());
    // A later group_by does not repair it.
    assert!(err(q.group_by("col_a")).is_invalid_state());
}

#[test]
fn test_limit_only_once_even_when_null() {
    assert!(err(select().from("t").limit(1).limit(1)).is_invalid_state());
    assert!(err(select().from("t").limit(None::<i64>).limit(1)).is_invalid_state());
}

#[test]
fn test_limit_once_survives_build_upon() {
    let q = select().from("t").limit(10).build().unwrap();
    assert!(err(q.build_upon().limit(5)).is_invalid_state());

    let q = select().from("t").limit(None::<i64>).build().unwrap();
    assert!(err(q.build_upon().limit(5)).is_invalid_state());
}

#[test]
fn test_offset_requires_non_null_limit() {
    assert!(err(select().from("t").offset(1)).is_invalid_state());
    assert!(err(select().from("t").limit(None::<i64>).offset(1)).is_invalid_state());
    assert!(err(select().from("t").limit(None::<i64>).offset("1+1")).is_invalid_state());
    assert!(err(select().from("t").limit(1).offset(1).offset(2)).is_invalid_state());
}

#[test]
fn test_first_error_wins() {
    let q = select()
        .from("t")
        .where_with("a = ?", [1, 2])
        .where_("b = 1")
        .limit(1)
        .limit(2);
    assert_eq!(q.build_error(), Some(&QbError::argument_count(1, 2)));
    assert_eq!(q.build_error().map(QbError::is_argument_count), Some(true));
}

#[test]
fn test_cursor_calls_without_context_fail() {
    assert!(err(select().from("t").asc()).is_invalid_state());
    assert!(err(select().from("t").collate("NOCASE")).is_invalid_state());
    assert!(err(select().from("t").where_("a").alias("x")).is_invalid_state());
    assert!(err(select().from("t").on("a = b")).is_invalid_state());
    assert!(err(select().from("t").using(["id"])).is_invalid_state());
    assert!(err(select().from("t").of("t")).is_invalid_state());
    assert!(err(select().all_columns().alias("x").from("t")).is_invalid_state());
}

#[test]
fn test_dangling_join_kind_fails() {
    assert!(err(select().from("t").left()).is_invalid_state());
}

#[test]
fn test_using_rejects_empty_list() {
    let e = err(select().from("a").join("b").using(Vec::<String>::new()));
    assert_eq!(e, QbError::MissingList("USING column list"));
    assert!(e.is_invalid_argument());
    assert!(err(select().from("a").join("b").using(None::<&str>)).is_invalid_argument());
}

#[test]
fn test_terms_reject_unbound_placeholders() {
    assert!(err(select().from("t").group_by(column("a").eq(arg()))).is_argument_count());
    assert!(err(select().from("t").order_by(column("a").eq(arg()))).is_argument_count());
    assert!(err(select().from("t").order_by("a = ?")).is_argument_count());
    assert!(err(select().expr(column("a").eq(arg())).from("t")).is_argument_count());
}

#[test]
fn test_absent_predicate_drops_its_values() {
    assert_eq!(sql(select().from("t").where_with(None::<&str>, [1])), "SELECT * FROM t");
    assert_eq!(sql(select().from("t").where_with(None::<Expr>, None::<Param>)), "SELECT * FROM t");
    assert_eq!(
        sql(select().from("t").group_by("a").having_with(None::<&str>, ["x"])),
        "SELECT * FROM t GROUP BY a"
    );
}

#[test]
fn test_blank_text_adds_no_clause() {
    assert_eq!(sql(select().from("t").having("  ")), "SELECT * FROM t");
    assert_eq!(sql(select().from("t").join("u").on("")), "SELECT * FROM t JOIN u");
    assert_eq!(sql(select().from("t").group_by(String::new())), "SELECT * FROM t");
    // A blank term leaves nothing for asc() to apply to.
    assert!(err(select().from("t").order_by(" ").asc()).is_invalid_state());
}

#[test]
fn test_join_requires_source() {
    assert!(err(select().column("a").join("t")).is_invalid_state());
    assert!(err(select().from("a").union().select().column("b").join("t")).is_invalid_state());
}

#[test]
fn test_query_without_source() {
    assert_eq!(sql(select().literal(1)), "SELECT 1");
    assert_eq!(sql(select().column("1500")), "SELECT 1500");
    assert!(err(select()).is_invalid_state());
    assert!(err(select().all_columns()).is_invalid_state());
    assert!(err(select().from("a").union().select()).is_invalid_state());
}

// ==================== Copies ====================

#[test]
fn test_build_snapshots_state() {
    let builder = select().from("table_a");
    let q = builder.build().unwrap();
    let builder = builder.where_("a = 1");
    assert_eq!(q.sql(), "SELECT * FROM table_a");
    assert_eq!(sql(builder), "SELECT * FROM table_a WHERE (a = 1)");
}

#[test]
fn test_build_upon_resets_cursor() {
    let q = select().from("t").order_by("a").build().unwrap();
    assert!(err(q.build_upon().desc()).is_invalid_state());
}

#[test]
fn test_build_upon_round_trips() {
    let q = select()
        .columns(["a", "b"])
        .of("t")
        .as_column_names()
        .from("t")
        .left()
        .join("u")
        .using(["a"])
        .except()
        .select()
        .literal("x")
        .alias("a")
        .literal(2.5)
        .from("v")
        .build()
        .unwrap();
    assert_eq!(q.build_upon().build().unwrap(), q);
    assert_eq!(
        q.sql(),
        "SELECT t.a AS a, t.b AS b FROM t LEFT JOIN u USING (a) EXCEPT SELECT 'x' AS a, 2.5 FROM v"
    );
}

// ==================== Tables ====================

#[test]
fn test_tables_collects_everything() {
    let sub = |t: &str| select().column("id").from(t).build().unwrap();
    let q = select()
        .expr(column("a").in_(sub("p")))
        .from(sub("s"))
        .join("j")
        .on(column_of("j", "id").in_(sub("o")))
        .where_(column("a").in_(sub("w")))
        .group_by(column("a").in_(sub("g")))
        .having(sum(column("a")).gt(literal(0)).and(column("b").in_(sub("h"))))
        .union()
        .select()
        .from("u")
        .order_by(column("a").in_(sub("r")));
    let expected: Vec<&str> = vec!["g", "h", "j", "o", "p", "r", "s", "u", "w"];
    assert_eq!(q.tables().into_iter().collect::<Vec<_>>(), expected);
    assert_eq!(q.build().unwrap().tables(), q.tables());
}

// ==================== Execution ====================

#[test]
fn test_perform_calls_executor_once() {
    use std::cell::Cell;

    let calls = Cell::new(0);
    let exec = |sql: &str, args: &[String]| -> Result<String, String> {
        calls.set(calls.get() + 1);
        Ok(format!("{sql} {args:?}"))
    };
    let q = select().from("t").where_with("a=?", ["x"]).build().unwrap();
    assert_eq!(q.perform(&exec).unwrap(), "SELECT * FROM t WHERE (a=?) [\"x\"]");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_perform_propagates_executor_error() {
    let exec = |_: &str, _: &[String]| -> Result<(), String> { Err("locked".to_string()) };
    let q = select().from("t").build().unwrap();
    assert_eq!(q.perform(&exec), Err("locked".to_string()));
}

#[test]
fn test_display() {
    let q = select().from("t").where_with("a=?", [1]).build().unwrap();
    assert_eq!(q.to_string(), "SELECT * FROM t WHERE (a=?)");
    assert_eq!(q.to_sql().to_string(), "SELECT * FROM t WHERE (a=?)");
}
