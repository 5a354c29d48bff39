//! 过滤器求值与排序基准测试
//!
//! 对比排序前后的求值开销，以及不同规模兄弟节点的排序开销。

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use filter_engine::{optimize, sort, EvaluationContext, Filter, FilterGlobal, Properties, Value};
use std::hint::black_box;

fn create_record() -> Properties {
    [
        ("kind", Value::from("major_road")),
        ("name", Value::from("Main Street")),
        ("lanes", Value::from(4)),
        ("speed_limit", Value::from(60.0)),
    ]
    .into_iter()
    .collect()
}

fn create_context() -> EvaluationContext {
    let mut ctx = EvaluationContext::new()
        .with_global(FilterGlobal::Zoom, 8.0)
        .with_global(FilterGlobal::Geometry, "line");
    // 模拟代价较高的外部谓词
    ctx.register_function(|| (0..64).fold(0u64, |acc, i| acc.wrapping_mul(31) ^ i) != 1);
    ctx
}

/// 一条典型规则：最廉价的缩放级别检查被放在最后
fn create_rule() -> Filter {
    Filter::all(vec![
        Filter::function(0),
        Filter::any(vec![
            Filter::exists("ref"),
            Filter::one_of(
                "kind",
                vec![Value::from("major_road"), Value::from("highway")],
            ),
        ]),
        Filter::exists("name"),
        Filter::range("lanes", 2.0, f64::INFINITY),
        Filter::global_range(FilterGlobal::Zoom, 12.0, f64::INFINITY),
    ])
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let props = create_record();
    let ctx = create_context();
    let unsorted = create_rule();
    let sorted = optimize(create_rule(), true);

    group.bench_function("unsorted", |b| {
        b.iter(|| black_box(&unsorted).eval(black_box(&props), black_box(&ctx)))
    });

    group.bench_function("sorted", |b| {
        b.iter(|| black_box(&sorted).eval(black_box(&props), black_box(&ctx)))
    });

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for count in [4usize, 16, 64] {
        let filters: Vec<Filter> = (0..count)
            .map(|i| match i % 4 {
                0 => Filter::function(i as u32),
                1 => Filter::exists(format!("key_{}", i)),
                2 => Filter::equals(format!("key_{}", i), i as f64),
                _ => Filter::all(vec![Filter::global_range(
                    FilterGlobal::Zoom,
                    i as f64,
                    f64::INFINITY,
                )]),
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("siblings", count), &filters, |b, f| {
            b.iter(|| sort(black_box(f)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_eval, bench_sort);
criterion_main!(benches);
