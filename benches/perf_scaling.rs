use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use termcore::{
    BaseSortKind, CancelToken, EnumElem, Module, SymbolTable, Term, TermIndex, TypeDecl, TypeExpr,
};

fn bench_compile_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_types/union_chain");
    for union_count in [10usize, 50, 200, 800] {
        let module = build_union_chain(union_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(union_count),
            &module,
            |b, module| {
                b.iter(|| {
                    let index = index_for(black_box(module));
                    let mut flags = Vec::new();
                    assert!(index.compile_types(&mut flags, &CancelToken::new()));
                })
            },
        );
    }
    group.finish();
}

fn bench_intersection_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("mk_intersection/list_depth");
    let module = list_module();
    for depth in [16usize, 128, 512, 2048] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || {
                    let index = compiled(&module);
                    let left = nested_list(&index, BaseSortKind::Natural, depth);
                    let right = nested_list(&index, BaseSortKind::Integer, depth);
                    (index, left, right)
                },
                |(index, left, right)| black_box(index.mk_intersection(&left, &right)),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_ground_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_ground_member/list_length");
    let module = list_module();
    for length in [100usize, 1_000, 4_000] {
        let index = compiled(&module);
        let cons = index.symbols().resolve("Cons", None).expect("Cons");
        let nil = index.symbols().resolve("NIL", None).expect("NIL");
        let mut value = index.mk_apply(&nil, &[]).0;
        for i in 0..length {
            value = index.mk_apply(&cons, &[index.mk_cnst(i as i64), value]).0;
        }
        let list = index.canonical_arg_type(&cons, 1).expect("List argument");
        group.bench_with_input(BenchmarkId::from_parameter(length), &value, |b, value| {
            b.iter(|| assert!(index.is_ground_member(black_box(&list), black_box(value))))
        });
    }
    group.finish();
}

fn index_for(module: &Module) -> TermIndex {
    let mut table = SymbolTable::new();
    assert!(table.declare_module(module).is_empty());
    TermIndex::new(Arc::new(table))
}

fn compiled(module: &Module) -> TermIndex {
    let index = index_for(module);
    assert!(index.compile_types(&mut Vec::new(), &CancelToken::new()));
    index
}

fn build_union_chain(union_count: usize) -> Module {
    let mut module = Module::new("chain").with_decl(TypeDecl::union(
        "U0",
        TypeExpr::enumeration(vec![EnumElem::range(0, 0)]),
    ));
    for i in 1..union_count {
        let lo = (i * 10) as i64;
        module = module.with_decl(TypeDecl::union(
            format!("U{i}"),
            TypeExpr::union(vec![
                TypeExpr::id(format!("U{}", i - 1)),
                TypeExpr::enumeration(vec![EnumElem::range(lo, lo + 5)]),
            ]),
        ));
    }
    module
}

fn list_module() -> Module {
    Module::new("lists")
        .with_decl(TypeDecl::constant("NIL"))
        .with_decl(TypeDecl::constructor(
            "Cons",
            vec![TypeExpr::id("Integer"), TypeExpr::id("List")],
        ))
        .with_decl(TypeDecl::union(
            "List",
            TypeExpr::union(vec![
                TypeExpr::id("Cons"),
                TypeExpr::enumeration(vec![EnumElem::id("NIL")]),
            ]),
        ))
}

fn nested_list(index: &TermIndex, element: BaseSortKind, depth: usize) -> Term {
    let cons = index.symbols().resolve("Cons", None).expect("Cons");
    let list = index.symbols().resolve("List", None).expect("List");
    let element = index.base_sort_term(element);
    let mut t = index.mk_apply(&list, &[]).0;
    for _ in 0..depth {
        t = index.mk_apply(&cons, &[element.clone(), t]).0;
    }
    t
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_millis(300));
    targets = bench_compile_scaling, bench_intersection_depth, bench_ground_membership
}
criterion_main!(benches);
