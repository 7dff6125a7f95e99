use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigInt;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ast::{EnumElem, TypeExpr};
use crate::cancel::CancelToken;
use crate::diagnostics::{Diagnostic, Span};
use crate::intervals::Intervals;
use crate::lattice::NumericSet;
use crate::symbols::{
    BaseSortKind, CnstValue, OpKind, Symbol, SymbolKind, SymbolTable, TypeDef, UserCnstKind,
    parse_numeral,
};
use crate::term::Term;
use crate::term_index::TermIndex;

/// A canonical, application-free union of type labels, constants and integer intervals.
///
/// Built from syntax (canonized lazily), from a symbol or from terms, then
/// finalized once by [`AppFreeCanUnn::canonize`].
pub struct AppFreeCanUnn {
    elements: BTreeSet<Symbol>,
    intervals: Intervals,
    numeric: NumericSet,
    string_sort: bool,
    contains_constants: bool,
    canonized: bool,
    source: Option<TypeExpr>,
    type_expr: OnceLock<TypeExpr>,
}

impl AppFreeCanUnn {
    fn empty(source: Option<TypeExpr>) -> Self {
        Self {
            elements: BTreeSet::new(),
            intervals: Intervals::new(),
            numeric: NumericSet::new(),
            string_sort: false,
            contains_constants: false,
            canonized: false,
            source,
            type_expr: OnceLock::new(),
        }
    }

    pub fn from_type_expr(expr: &TypeExpr) -> Self {
        Self::empty(Some(expr.clone()))
    }

    pub fn from_symbol(symbol: &Symbol) -> Self {
        let mut out = Self::empty(None);
        out.add_symbol(symbol.clone());
        out
    }

    /// Collects the union structure of type terms. Applications are widened to their sorts.
    pub fn from_terms(index: &TermIndex, terms: &[Term]) -> Self {
        let mut out = Self::empty(None);
        let mut stack: Vec<Term> = terms.iter().rev().cloned().collect();
        while let Some(t) = stack.pop() {
            let sym = t.symbol();
            match sym.kind() {
                SymbolKind::BaseOp(OpKind::TypeUnn) => {
                    stack.push(t.arg(1).clone());
                    stack.push(t.arg(0).clone());
                }
                SymbolKind::BaseOp(OpKind::Range) => {
                    let (lo, hi) = t
                        .range_bounds()
                        .unwrap_or_else(|| panic!("range {t} has non-integer bounds"));
                    out.intervals.add(lo, hi);
                }
                SymbolKind::BaseOp(_) => panic!("{t} is not a type"),
                SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
                    let sort = index
                        .symbols()
                        .sort_of(sym)
                        .unwrap_or_else(|| panic!("{sym:?} has no sort"))
                        .clone();
                    out.add_symbol(sort);
                }
                SymbolKind::UserCnst {
                    kind: UserCnstKind::Variable,
                    ..
                } => panic!("variable {t} is not a type"),
                _ => out.add_symbol(sym.clone()),
            }
        }
        out
    }

    fn add_symbol(&mut self, symbol: Symbol) {
        if let Some(v) = symbol.cnst_value().and_then(CnstValue::as_integer) {
            self.intervals.add(v.clone(), v);
        } else {
            self.elements.insert(symbol);
        }
    }

    pub fn is_canonized(&self) -> bool {
        self.canonized
    }

    pub fn contains_constants(&self) -> bool {
        self.contains_constants
    }

    pub fn elements(&self) -> impl Iterator<Item = &Symbol> {
        self.elements.iter()
    }

    pub fn intervals(&self) -> &Intervals {
        &self.intervals
    }

    pub fn source(&self) -> Option<&TypeExpr> {
        self.source.as_ref()
    }

    pub fn contains_element(&self, symbol: &Symbol) -> bool {
        self.elements.contains(symbol)
    }

    /// Expands, simplifies and finalizes the union.
    ///
    /// `myself` is the named union being defined; references to it are
    /// dropped. On failure diagnostics are appended and nothing changes.
    pub fn canonize(
        &mut self,
        index: &TermIndex,
        myself: Option<&Symbol>,
        flags: &mut Vec<Diagnostic>,
        cancel: &CancelToken,
    ) -> bool {
        if self.canonized {
            return true;
        }
        let table = index.symbols();
        let mut ok = true;
        let mut work: Vec<Symbol> = self.elements.iter().rev().cloned().collect();
        let mut intervals = self.intervals.clone();

        if let Some(expr) = &self.source {
            let raw = resolve_type_expr(table, expr, Some(&mut *flags));
            ok &= raw.ok;
            work.extend(raw.symbols.into_iter().rev());
            intervals.add_all(&raw.intervals);
        }

        let mut visited: FxHashSet<Symbol> = myself.cloned().into_iter().collect();
        let mut labels: BTreeSet<Symbol> = BTreeSet::new();
        while let Some(sym) = work.pop() {
            if cancel.is_cancelled() {
                flags.push(Diagnostic::cancelled(self.span().cloned()));
                return false;
            }
            match sym.kind() {
                SymbolKind::Unn => {
                    if !visited.insert(sym.clone()) {
                        continue;
                    }
                    if let Some(done) = index.union_can_unn(&sym) {
                        labels.extend(done.elements.iter().cloned());
                        intervals.add_all(&done.intervals);
                    } else if let Some(decl) = table.decl(&sym) {
                        let TypeDef::Union(def) = &decl.def else {
                            unreachable!("union {sym:?} declared with arguments")
                        };
                        let raw = resolve_type_expr(table, def, None);
                        work.extend(raw.symbols.into_iter().rev());
                        intervals.add_all(&raw.intervals);
                    }
                }
                SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
                    if let Some(sort) = table.sort_of(&sym) {
                        labels.insert(sort.clone());
                    }
                }
                SymbolKind::BaseCnst(value) => match value.as_integer() {
                    Some(v) => intervals.add(v.clone(), v),
                    None => {
                        labels.insert(sym.clone());
                    }
                },
                _ => {
                    labels.insert(sym.clone());
                }
            }
        }

        if !ok {
            return false;
        }

        let (elements, intervals, numeric, string_sort) = simplify(table, labels, intervals);
        if elements.is_empty() && intervals.is_empty() {
            let name = myself
                .map(Symbol::printable_name)
                .unwrap_or_else(|| "anonymous type".to_string());
            debug!(name = %name, "type has no members");
            flags.push(Diagnostic::no_members(&name, self.span().cloned()));
            return false;
        }

        self.contains_constants = !intervals.is_empty()
            || elements.iter().any(|s| {
                matches!(
                    s.kind(),
                    SymbolKind::BaseCnst(_) | SymbolKind::UserCnst { .. } | SymbolKind::BaseSort(_)
                )
            });
        self.elements = elements;
        self.intervals = intervals;
        self.numeric = numeric;
        self.string_sort = string_sort;
        self.canonized = true;
        true
    }

    fn span(&self) -> Option<&Span> {
        self.source.as_ref().and_then(TypeExpr::span)
    }

    fn assert_canonized(&self) {
        assert!(self.canonized, "canonical union used before canonization");
    }

    /// Syntactic equality, valid only because both sides are canonical.
    pub fn is_equivalent(&self, other: &AppFreeCanUnn) -> bool {
        self.assert_canonized();
        other.assert_canonized();
        self.elements.len() == other.elements.len()
            && self.intervals.len() == other.intervals.len()
            && self.elements.iter().zip(other.elements.iter()).all(|(a, b)| a == b)
            && self.intervals.iter().zip(other.intervals.iter()).all(|(a, b)| a == b)
    }

    pub fn accepts_constant(&self, symbol: &Symbol) -> bool {
        self.assert_canonized();
        match symbol.kind() {
            SymbolKind::BaseCnst(CnstValue::Rational(r)) => self.numeric.accepts_value(r),
            SymbolKind::BaseCnst(CnstValue::String(_)) => {
                self.string_sort || self.elements.contains(symbol)
            }
            SymbolKind::UserCnst { kind, .. } => {
                assert!(
                    *kind != UserCnstKind::Variable,
                    "variable {symbol:?} tested for type membership"
                );
                self.elements.contains(symbol)
            }
            _ => panic!("{symbol:?} is not a constant"),
        }
    }

    pub fn accepts_constants(&self, lo: &BigInt, hi: &BigInt) -> bool {
        self.assert_canonized();
        self.numeric.accepts_range(lo, hi)
    }

    pub fn is_subset_of(&self, other: &AppFreeCanUnn) -> bool {
        self.assert_canonized();
        other.assert_canonized();
        if !self.numeric.is_subset_of(&other.numeric) {
            return false;
        }
        if self.string_sort && !other.string_sort {
            return false;
        }
        self.elements.iter().all(|sym| match sym.kind() {
            SymbolKind::BaseSort(kind) if kind.is_numeric() => true,
            SymbolKind::BaseSort(_) => other.string_sort,
            SymbolKind::BaseCnst(CnstValue::Rational(_)) => true,
            SymbolKind::BaseCnst(CnstValue::String(_)) => {
                other.string_sort || other.elements.contains(sym)
            }
            _ => other.elements.contains(sym),
        })
    }

    pub fn mk_type_term(&self, index: &TermIndex) -> Term {
        self.assert_canonized();
        let mut components = Vec::new();
        for sym in &self.elements {
            components.push(index.mk_apply(sym, &[]).0);
        }
        for (lo, hi) in self.intervals.iter() {
            components.push(index.mk_interval_term(lo.clone(), hi.clone()));
        }
        index.mk_union_of(components)
    }

    pub fn type_expr(&self) -> &TypeExpr {
        self.assert_canonized();
        self.type_expr.get_or_init(|| self.build_type_expr(None))
    }

    pub fn renamed_type_expr(&self, prefix: &str) -> TypeExpr {
        self.assert_canonized();
        self.build_type_expr(Some(prefix))
    }

    fn build_type_expr(&self, prefix: Option<&str>) -> TypeExpr {
        let rename = |sym: &Symbol| match (prefix, sym.kind()) {
            (Some(prefix), SymbolKind::UserCnst { .. } | SymbolKind::UserSort { .. })
                if !sym.is_builtin() =>
            {
                format!("{prefix}.{}", sym.printable_name())
            }
            _ => sym.printable_name(),
        };

        let mut constants = Vec::new();
        let mut labels = Vec::new();
        for sym in &self.elements {
            match sym.kind() {
                SymbolKind::BaseCnst(CnstValue::Rational(r)) => {
                    constants.push(EnumElem::num(format!("{}/{}", r.numer(), r.denom())))
                }
                SymbolKind::BaseCnst(CnstValue::String(s)) => constants.push(EnumElem::string(s.clone())),
                SymbolKind::UserCnst { .. } => constants.push(EnumElem::id(rename(sym))),
                _ => labels.push(TypeExpr::id(rename(sym))),
            }
        }
        let ranges: Vec<EnumElem> = self
            .intervals
            .iter()
            .map(|(lo, hi)| {
                if lo == hi {
                    EnumElem::num(lo.to_string())
                } else {
                    EnumElem::Range {
                        lo: lo.to_string(),
                        hi: hi.to_string(),
                        span: None,
                    }
                }
            })
            .collect();

        let mut items = Vec::new();
        if !constants.is_empty() {
            items.push(TypeExpr::enumeration(constants));
        }
        if !ranges.is_empty() {
            items.push(TypeExpr::enumeration(ranges));
        }
        items.extend(labels);
        if items.len() == 1 {
            items.remove(0)
        } else {
            TypeExpr::union(items)
        }
    }
}

impl fmt::Debug for AppFreeCanUnn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppFreeCanUnn")
            .field("elements", &self.elements)
            .field("intervals", &self.intervals)
            .field("canonized", &self.canonized)
            .finish()
    }
}

impl fmt::Display for AppFreeCanUnn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.elements.iter().map(|s| s.to_string()).collect();
        for (lo, hi) in self.intervals.iter() {
            if lo == hi {
                parts.push(lo.to_string());
            } else {
                parts.push(format!("{lo}..{hi}"));
            }
        }
        write!(f, "{}", parts.join(" + "))
    }
}

struct ResolvedExpr {
    symbols: Vec<Symbol>,
    intervals: Intervals,
    ok: bool,
}

/// Resolves the identifiers and literals of a type expression without expanding unions.
///
/// Diagnostics are reported only when `flags` is given.
fn resolve_type_expr(
    table: &SymbolTable,
    expr: &TypeExpr,
    mut flags: Option<&mut Vec<Diagnostic>>,
) -> ResolvedExpr {
    let mut out = ResolvedExpr {
        symbols: Vec::new(),
        intervals: Intervals::new(),
        ok: true,
    };
    let mut report = |d: Diagnostic, out: &mut ResolvedExpr| {
        out.ok = false;
        if let Some(flags) = flags.as_deref_mut() {
            flags.push(d);
        }
    };

    let mut stack = vec![expr];
    while let Some(expr) = stack.pop() {
        match expr {
            TypeExpr::Union { items, .. } => stack.extend(items.iter().rev()),
            TypeExpr::Id { name, span } => match table.resolve(name, span.as_ref()) {
                Ok(sym) => match sym.kind() {
                    SymbolKind::BaseSort(_)
                    | SymbolKind::Unn
                    | SymbolKind::Con { .. }
                    | SymbolKind::Map { .. }
                    | SymbolKind::UserSort { .. } => out.symbols.push(sym),
                    SymbolKind::UserCnst { kind, .. } if *kind != UserCnstKind::Variable => {
                        out.symbols.push(sym)
                    }
                    _ => report(
                        Diagnostic::bad_id(name, "does not name a type", span.clone()),
                        &mut out,
                    ),
                },
                Err(d) => report(d, &mut out),
            },
            TypeExpr::Enum { elems, .. } => {
                for elem in elems {
                    match elem {
                        EnumElem::Num { value, span } => match parse_numeral(value) {
                            Some(r) if r.is_integer() => {
                                let v = r.to_integer();
                                out.intervals.add(v.clone(), v);
                            }
                            Some(r) => out.symbols.push(table.cnst_symbol(&CnstValue::Rational(r))),
                            None => report(
                                Diagnostic::bad_id(value, "malformed numeral", span.clone()),
                                &mut out,
                            ),
                        },
                        EnumElem::Str { value, .. } => {
                            out.symbols.push(table.cnst_symbol(&CnstValue::String(value.clone())))
                        }
                        EnumElem::Id { name, span } => match table.resolve(name, span.as_ref()) {
                            Ok(sym)
                                if matches!(
                                    sym.kind(),
                                    SymbolKind::UserCnst { kind, .. } if *kind != UserCnstKind::Variable
                                ) =>
                            {
                                out.symbols.push(sym)
                            }
                            Ok(_) => report(
                                Diagnostic::bad_id(
                                    name,
                                    "enumerations accept constants and ranges only",
                                    span.clone(),
                                ),
                                &mut out,
                            ),
                            Err(d) => report(d, &mut out),
                        },
                        EnumElem::Range { lo, hi, span } => {
                            let bounds = parse_numeral(lo)
                                .zip(parse_numeral(hi))
                                .filter(|(lo, hi)| lo.is_integer() && hi.is_integer());
                            match bounds {
                                Some((lo, hi)) => out.intervals.add(lo.to_integer(), hi.to_integer()),
                                None => report(
                                    Diagnostic::bad_id(
                                        &format!("{lo}..{hi}"),
                                        "range bounds must be integers",
                                        span.clone(),
                                    ),
                                    &mut out,
                                ),
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

fn simplify(
    table: &SymbolTable,
    labels: BTreeSet<Symbol>,
    intervals: Intervals,
) -> (BTreeSet<Symbol>, Intervals, NumericSet, bool) {
    let mut numeric = NumericSet {
        intervals,
        ..NumericSet::new()
    };
    let mut string_sort = false;
    let mut rest = BTreeSet::new();
    for sym in labels {
        match sym.kind() {
            SymbolKind::BaseSort(BaseSortKind::String) => string_sort = true,
            SymbolKind::BaseSort(kind) => numeric.add_sort(*kind),
            SymbolKind::BaseCnst(CnstValue::Rational(r)) => numeric.add_constant(r),
            _ => {
                rest.insert(sym);
            }
        }
    }
    numeric.simplify();

    let mut elements: BTreeSet<Symbol> = rest
        .into_iter()
        .filter(|s| !(string_sort && matches!(s.kind(), SymbolKind::BaseCnst(CnstValue::String(_)))))
        .collect();
    if string_sort {
        elements.insert(table.base_sort(BaseSortKind::String).clone());
    }
    for kind in numeric.sorts() {
        elements.insert(table.base_sort(kind).clone());
    }
    for r in &numeric.fractions {
        elements.insert(table.cnst_symbol(&CnstValue::Rational(r.clone())));
    }
    let intervals = numeric.intervals.clone();
    (elements, intervals, numeric, string_sort)
}
