use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{Module, TypeExpr};
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostic;
use crate::symbols::{Symbol, SymbolKind, SymbolTable};
use crate::term_index::{IndexStats, TermIndex};

pub fn compile_module(
    module: &Module,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<TermIndex, Vec<Diagnostic>> {
    let mut table = SymbolTable::new();
    let mut errors = table.declare_module(module);
    let index = TermIndex::with_config(Arc::new(table), config);
    let compiled = index.compile_types(&mut errors, cancel);
    if !compiled || !errors.is_empty() {
        return Err(errors);
    }
    Ok(index)
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub kind: &'static str,
    pub canonical: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<TypeExpr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub types: Vec<TypeSummary>,
    pub stats: IndexStats,
}

pub fn build_report(index: &TermIndex, module: &Module) -> ModuleReport {
    let table = index.symbols();
    let mut types = Vec::new();
    for decl in &module.decls {
        let Some(sym) = table.lookup(&decl.qualified_name()) else {
            continue;
        };
        types.push(summarize(index, sym));
    }
    ModuleReport {
        module: module.name.clone(),
        types,
        stats: index.stats(),
    }
}

fn summarize(index: &TermIndex, sym: &Symbol) -> TypeSummary {
    let name = sym.printable_name();
    match sym.kind() {
        SymbolKind::Unn => TypeSummary {
            name,
            kind: "union",
            canonical: index
                .union_type(sym)
                .map(|t| t.to_string())
                .unwrap_or_default(),
            arguments: Vec::new(),
            expr: index.union_can_unn(sym).map(|c| c.type_expr().clone()),
        },
        SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
            let arguments = (0..sym.arity())
                .map(|i| {
                    index
                        .canonical_arg_type(sym, i)
                        .map(|t| t.to_string())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>();
            let (kind, canonical) = match sym.kind() {
                SymbolKind::Map { domain_arity } => {
                    let (domain, codomain) = arguments.split_at(*domain_arity);
                    (
                        "map",
                        format!("{name}({} -> {})", domain.join(", "), codomain.join(", ")),
                    )
                }
                _ => ("constructor", format!("{name}({})", arguments.join(", "))),
            };
            TypeSummary {
                canonical,
                name,
                kind,
                arguments,
                expr: None,
            }
        }
        _ => TypeSummary {
            canonical: name.clone(),
            name,
            kind: "constant",
            arguments: Vec::new(),
            expr: None,
        },
    }
}

pub fn render_text(report: &ModuleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {}", report.module);
    for ty in &report.types {
        let _ = writeln!(out, "  {} {} ::= {}", ty.kind, ty.name, ty.canonical);
    }
    let _ = writeln!(
        out,
        "terms: {}, canonical forms: {}, intersections: {}",
        report.stats.terms, report.stats.canonical_forms, report.stats.intersections
    );
    out
}
