use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fluentsql::{Query, QueryBuilder, arg, column, select};

/// Build a select with `n` columns and `n` bound predicates:
/// SELECT col0, col1, ... FROM t WHERE (col0 == ?) AND (col1 == ?) ...
fn build_select(n: usize) -> QueryBuilder {
    let mut q = select();
    for i in 0..n {
        q = q.column(format!("col{i}"));
    }
    q = q.from("t");
    for i in 0..n {
        q = q.where_with(column(format!("col{i}")).eq(arg()), [i as i64]);
    }
    q
}

fn build_query(n: usize) -> Query {
    build_select(n).build().expect("benchmark query is valid")
}

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/to_sql");

    for n in [1, 5, 10, 50, 100] {
        let q = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_query(n).to_sql()));
        });
    }

    group.finish();
}

fn bench_compound_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/compound_chain");

    for n in [2, 5, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut q = select().from("t0").where_with("a = ?", [0]);
                for i in 1..n {
                    q = q
                        .union_all()
                        .select()
                        .from(format!("t{i}"))
                        .where_with("a = ?", [i as i64]);
                }
                black_box(q.order_by("a").limit(10).build().map(|q| q.to_sql()))
            });
        });
    }

    group.finish();
}

fn bench_nested_subqueries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/nested_subqueries");

    for depth in [1, 5, 20] {
        let mut q = build_query(1);
        for _ in 0..depth {
            q = select()
                .from("t")
                .where_(column("id").in_(q))
                .build()
                .expect("nested query is valid");
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &q, |b, q| {
            b.iter(|| black_box((q.to_sql(), q.tables())));
        });
    }

    group.finish();
}

fn bench_build_upon(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_upon");

    for n in [1, 10, 100] {
        let q = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.build_upon().where_("extra = 1").build()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_build_and_render,
    bench_compound_chain,
    bench_nested_subqueries,
    bench_build_upon
);
criterion_main!(benches);
