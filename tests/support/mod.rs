#![allow(dead_code)]

use std::sync::Arc;

use termcore::config::{EngineConfig, EngineSettings};
use termcore::{
    BaseSortKind, CancelToken, Diagnostic, EnumElem, Module, Symbol, SymbolTable, Term, TermIndex,
    TypeDecl, TypeExpr,
};

pub fn id(name: &str) -> TypeExpr {
    TypeExpr::id(name)
}

pub fn ints(lo: i64, hi: i64) -> TypeExpr {
    TypeExpr::enumeration(vec![EnumElem::range(lo, hi)])
}

pub fn strings(values: &[&str]) -> TypeExpr {
    TypeExpr::enumeration(values.iter().map(|v| EnumElem::string(*v)).collect())
}

pub fn union(items: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::union(items)
}

/// Declares and compiles a module, panicking on any diagnostic.
pub fn compile(module: &Module) -> TermIndex {
    let (index, errors, ok) = try_compile(module);
    assert!(ok, "module should compile: {errors:?}");
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    index
}

pub fn try_compile(module: &Module) -> (TermIndex, Vec<Diagnostic>, bool) {
    let mut table = SymbolTable::new();
    let mut errors = table.declare_module(module);
    let index = TermIndex::new(Arc::new(table));
    let ok = index.compile_types(&mut errors, &CancelToken::new());
    (index, errors, ok)
}

pub fn sym(index: &TermIndex, name: &str) -> Symbol {
    index
        .symbols()
        .resolve(name, None)
        .expect("symbol should resolve")
}

/// The type term of a declared name: a union reference or a constructor sort.
pub fn ty(index: &TermIndex, name: &str) -> Term {
    let s = sym(index, name);
    if s.is_data_symbol() {
        index.sort_term(&s)
    } else {
        index.mk_apply(&s, &[]).0
    }
}

pub fn sort(index: &TermIndex, kind: BaseSortKind) -> Term {
    index.base_sort_term(kind)
}

pub fn app(index: &TermIndex, name: &str, args: &[Term]) -> Term {
    index.mk_apply(&sym(index, name), args).0
}

/// A list-shaped module: `Cons(Integer, List)`, `List ::= Cons + NIL`,
/// plus `Pair(Integer, String)` and `Color ::= RED + GREEN + BLUE`.
pub fn sample_module() -> Module {
    Module::new("sample")
        .with_decl(TypeDecl::constant("NIL"))
        .with_decl(TypeDecl::constant("RED"))
        .with_decl(TypeDecl::constant("GREEN"))
        .with_decl(TypeDecl::constant("BLUE"))
        .with_decl(TypeDecl::union(
            "Color",
            TypeExpr::enumeration(vec![
                EnumElem::id("RED"),
                EnumElem::id("GREEN"),
                EnumElem::id("BLUE"),
            ]),
        ))
        .with_decl(TypeDecl::constructor("Cons", vec![id("Integer"), id("List")]))
        .with_decl(TypeDecl::union(
            "List",
            union(vec![
                id("Cons"),
                TypeExpr::enumeration(vec![EnumElem::id("NIL")]),
            ]),
        ))
        .with_decl(TypeDecl::constructor("Pair", vec![id("Integer"), id("String")]))
}

pub fn sample_index() -> TermIndex {
    compile(&sample_module())
}

/// The sample module compiled into an arena that never caches intersections.
pub fn uncached_sample_index() -> TermIndex {
    let mut table = SymbolTable::new();
    assert!(table.declare_module(&sample_module()).is_empty());
    let config = EngineConfig {
        engine: EngineSettings {
            cache_intersections: false,
        },
        ..EngineConfig::default()
    };
    let index = TermIndex::with_config(Arc::new(table), &config);
    assert!(index.compile_types(&mut Vec::new(), &CancelToken::new()));
    index
}
