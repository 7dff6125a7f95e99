use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::binned::{self, BinnedUnion};
use crate::can_unn::AppFreeCanUnn;
use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostic;
use crate::symbols::{BaseSortKind, CnstValue, OpKind, Symbol, SymbolKind, SymbolTable, TypeDef};
use crate::term::{ArenaId, Groundness, Term, derive_groundness};

type ArgKey = SmallVec<[u64; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub terms: usize,
    pub canonical_forms: usize,
    pub intersections: usize,
    pub canonical_arg_types: usize,
}

/// The term arena: hash-conses terms, owns the type caches and hosts the
/// type-algebra entry points.
///
/// Every method takes `&self`; interning tables and caches are append-only
/// concurrent maps, so the arena can be shared between threads.
pub struct TermIndex {
    id: ArenaId,
    symbols: Arc<SymbolTable>,
    cache_intersections: bool,
    next_uid: AtomicU64,
    bins: DashMap<Symbol, FxHashMap<ArgKey, Term>>,
    rational_cnsts: DashMap<BigRational, Term>,
    string_cnsts: DashMap<String, Term>,
    vars: DashMap<String, Term>,
    canonical_forms: DashMap<Term, Term>,
    canonical_intrs: DashMap<(Term, Term), Option<Term>>,
    can_type_terms: DashMap<(Symbol, usize), Term>,
    arg_canons: DashMap<(Symbol, usize), Arc<AppFreeCanUnn>>,
    union_canons: DashMap<Symbol, Arc<AppFreeCanUnn>>,
    union_types: DashMap<Symbol, Term>,
    arity_unions: DashMap<usize, Option<Term>>,
    type_uses: DashMap<Term, Arc<[(Symbol, usize)]>>,
    compiled: OnceLock<bool>,
    true_value: Term,
    false_value: Term,
    boolean_type: Term,
    zero: Term,
    one: Term,
    empty_string: Term,
    any_type: Term,
}

impl TermIndex {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self::with_config(symbols, &EngineConfig::default())
    }

    pub fn with_config(symbols: Arc<SymbolTable>, config: &EngineConfig) -> Self {
        let id = ArenaId::fresh();
        let next_uid = AtomicU64::new(0);
        let bins: DashMap<Symbol, FxHashMap<ArgKey, Term>> = DashMap::new();

        // The well-known terms are interned directly so that `Self` is complete on return.
        let intern = |sym: &Symbol, args: &[Term]| -> Term {
            let key: ArgKey = args.iter().map(Term::uid).collect();
            let groundness = derive_groundness(sym, args);
            bins.entry(sym.clone())
                .or_default()
                .entry(key)
                .or_insert_with(|| {
                    Term::new(
                        next_uid.fetch_add(1, AtomicOrdering::Relaxed),
                        id,
                        sym.clone(),
                        args.to_vec().into_boxed_slice(),
                        groundness,
                    )
                })
                .clone()
        };

        let true_value = intern(symbols.true_symbol(), &[]);
        let false_value = intern(symbols.false_symbol(), &[]);
        let type_unn = symbols.op(OpKind::TypeUnn).clone();
        let boolean_type = intern(&type_unn, &[true_value.clone(), false_value.clone()]);
        let zero = intern(&symbols.cnst_symbol(&CnstValue::from(0)), &[]);
        let one = intern(&symbols.cnst_symbol(&CnstValue::from(1)), &[]);
        let empty_string = intern(&symbols.cnst_symbol(&CnstValue::from("")), &[]);

        // Any: Real + String + every user constant + every user sort, in canonical order.
        let mut any_parts: Vec<Term> = Vec::new();
        any_parts.push(intern(symbols.base_sort(BaseSortKind::Real), &[]));
        any_parts.push(intern(symbols.base_sort(BaseSortKind::String), &[]));
        for cnst in symbols.user_constants() {
            any_parts.push(intern(cnst, &[]));
        }
        for data in symbols.data_symbols() {
            if let Some(sort) = symbols.sort_of(data) {
                any_parts.push(intern(sort, &[]));
            }
        }
        any_parts.sort_by(cmp_components);
        let mut any_type = any_parts.pop().unwrap_or_else(|| unreachable!("Any has members"));
        while let Some(part) = any_parts.pop() {
            any_type = intern(&type_unn, &[part, any_type]);
        }

        let index = Self {
            id,
            symbols,
            cache_intersections: config.engine.cache_intersections,
            next_uid,
            bins,
            rational_cnsts: DashMap::new(),
            string_cnsts: DashMap::new(),
            vars: DashMap::new(),
            canonical_forms: DashMap::new(),
            canonical_intrs: DashMap::new(),
            can_type_terms: DashMap::new(),
            arg_canons: DashMap::new(),
            union_canons: DashMap::new(),
            union_types: DashMap::new(),
            arity_unions: DashMap::new(),
            type_uses: DashMap::new(),
            compiled: OnceLock::new(),
            true_value,
            false_value,
            boolean_type,
            zero,
            one,
            empty_string,
            any_type,
        };
        for t in [&index.zero, &index.one] {
            if let Some(r) = t.cnst_value().and_then(CnstValue::as_rational) {
                index.rational_cnsts.insert(r.clone(), t.clone());
            }
        }
        index
            .string_cnsts
            .insert(String::new(), index.empty_string.clone());
        index
            .canonical_forms
            .insert(index.boolean_type.clone(), index.boolean_type.clone());
        index
            .canonical_forms
            .insert(index.any_type.clone(), index.any_type.clone());
        index
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn true_value(&self) -> &Term {
        &self.true_value
    }

    pub fn false_value(&self) -> &Term {
        &self.false_value
    }

    pub fn boolean_type(&self) -> &Term {
        &self.boolean_type
    }

    pub fn zero(&self) -> &Term {
        &self.zero
    }

    pub fn one(&self) -> &Term {
        &self.one
    }

    pub fn empty_string(&self) -> &Term {
        &self.empty_string
    }

    pub fn any_type(&self) -> &Term {
        &self.any_type
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            terms: self.next_uid.load(AtomicOrdering::Relaxed) as usize,
            canonical_forms: self.canonical_forms.len(),
            intersections: self.canonical_intrs.len(),
            canonical_arg_types: self.can_type_terms.len(),
        }
    }

    fn assert_owned(&self, t: &Term) {
        assert!(
            t.owner() == self.id,
            "term {t} belongs to a different arena"
        );
    }

    // ------------------------------------------------------------------
    // Construction

    pub fn mk_apply(&self, symbol: &Symbol, args: &[Term]) -> (Term, bool) {
        assert_eq!(
            args.len(),
            symbol.arity(),
            "{} expects {} arguments",
            symbol.printable_name(),
            symbol.arity()
        );
        for arg in args {
            self.assert_owned(arg);
        }
        let key: ArgKey = args.iter().map(Term::uid).collect();
        if let Some(bin) = self.bins.get(symbol) {
            if let Some(found) = bin.get(&key) {
                return (found.clone(), false);
            }
        }

        let groundness = derive_groundness(symbol, args);
        let mut bin = self.bins.entry(symbol.clone()).or_default();
        match bin.entry(key) {
            Entry::Occupied(e) => (e.get().clone(), false),
            Entry::Vacant(e) => {
                let uid = self.next_uid.fetch_add(1, AtomicOrdering::Relaxed);
                let term = Term::new(
                    uid,
                    self.id,
                    symbol.clone(),
                    args.to_vec().into_boxed_slice(),
                    groundness,
                );
                trace!(symbol = %symbol.printable_name(), uid, "interned term");
                e.insert(term.clone());
                (term, true)
            }
        }
    }

    pub fn mk_cnst(&self, value: impl Into<CnstValue>) -> Term {
        let value = value.into();
        match &value {
            CnstValue::Rational(r) => {
                if let Some(found) = self.rational_cnsts.get(r) {
                    return found.clone();
                }
                let sym = self.symbols.cnst_symbol(&value);
                let term = self.mk_apply(&sym, &[]).0;
                self.rational_cnsts.entry(r.clone()).or_insert(term).clone()
            }
            CnstValue::String(s) => {
                if let Some(found) = self.string_cnsts.get(s) {
                    return found.clone();
                }
                let sym = self.symbols.cnst_symbol(&value);
                let term = self.mk_apply(&sym, &[]).0;
                self.string_cnsts.entry(s.clone()).or_insert(term).clone()
            }
        }
    }

    /// Interns a variable; reusing a name with a different `is_auto_gen` flag panics.
    pub fn mk_var(&self, name: &str, is_auto_gen: bool) -> Term {
        if let Some(found) = self.vars.get(name) {
            if let SymbolKind::UserCnst { auto_gen, .. } = found.symbol().kind() {
                assert_eq!(
                    *auto_gen, is_auto_gen,
                    "variable {name} reused with a different auto-generated flag"
                );
            }
            return found.clone();
        }
        let sym = self.symbols.var_symbol(name, is_auto_gen);
        let term = self.mk_apply(&sym, &[]).0;
        self.vars.entry(name.to_string()).or_insert(term).clone()
    }

    pub fn mk_range(&self, lo: impl Into<BigInt>, hi: impl Into<BigInt>) -> Term {
        let lo = self.mk_cnst(lo.into());
        let hi = self.mk_cnst(hi.into());
        self.mk_apply(self.symbols.op(OpKind::Range), &[lo, hi]).0
    }

    /// Integer intervals stay ranges in type position, `5` included as `5..5`.
    pub(crate) fn mk_interval_term(&self, lo: BigInt, hi: BigInt) -> Term {
        if lo <= hi {
            self.mk_range(lo, hi)
        } else {
            self.mk_range(hi, lo)
        }
    }

    pub fn sort_term(&self, data: &Symbol) -> Term {
        let sort = self
            .symbols
            .sort_of(data)
            .unwrap_or_else(|| panic!("{data:?} is not a constructor or map"));
        self.mk_apply(sort, &[]).0
    }

    pub fn base_sort_term(&self, kind: BaseSortKind) -> Term {
        self.mk_apply(self.symbols.base_sort(kind), &[]).0
    }

    pub(crate) fn mk_union_of(&self, mut components: Vec<Term>) -> Term {
        components.sort_by(cmp_components);
        components.dedup();
        let type_unn = self.symbols.op(OpKind::TypeUnn);
        let mut acc = components
            .pop()
            .unwrap_or_else(|| panic!("cannot build an empty union"));
        while let Some(part) = components.pop() {
            acc = self.mk_apply(type_unn, &[part, acc]).0;
        }
        acc
    }

    pub fn mk_type_union(&self, parts: &[Term]) -> Term {
        assert!(!parts.is_empty(), "cannot build an empty union");
        let type_unn = self.symbols.op(OpKind::TypeUnn);
        let mut acc = parts[parts.len() - 1].clone();
        for part in parts[..parts.len() - 1].iter().rev() {
            acc = self.mk_apply(type_unn, &[part.clone(), acc]).0;
        }
        self.mk_canonical_form(&acc)
    }

    // ------------------------------------------------------------------
    // Type definitions

    /// Canonizes every named union and every constructor/map argument type.
    ///
    /// Reports every failing declaration in one pass. Only successfully
    /// canonized definitions are cached. Later calls return the first result.
    pub fn compile_types(&self, flags: &mut Vec<Diagnostic>, cancel: &CancelToken) -> bool {
        *self
            .compiled
            .get_or_init(|| self.compile_types_once(flags, cancel))
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().copied().unwrap_or(false)
    }

    fn compile_types_once(&self, flags: &mut Vec<Diagnostic>, cancel: &CancelToken) -> bool {
        let mut ok = true;
        for (sym, decl) in self.symbols.decls() {
            if cancel.is_cancelled() {
                flags.push(Diagnostic::cancelled(decl.span.clone()));
                return false;
            }
            match &decl.def {
                TypeDef::Union(def) => {
                    let mut canon = AppFreeCanUnn::from_type_expr(def);
                    if canon.canonize(self, Some(sym), flags, cancel) {
                        debug!(union = %sym.printable_name(), canonical = %canon, "canonized union");
                        self.union_canons.insert(sym.clone(), Arc::new(canon));
                    } else {
                        ok = false;
                    }
                }
                TypeDef::Args(args) => {
                    for (i, arg) in args.iter().enumerate() {
                        let mut canon = AppFreeCanUnn::from_type_expr(arg);
                        if canon.canonize(self, None, flags, cancel) {
                            debug!(
                                symbol = %sym.printable_name(),
                                arg = i,
                                canonical = %canon,
                                "canonized argument type"
                            );
                            self.arg_canons.insert((sym.clone(), i), Arc::new(canon));
                        } else {
                            ok = false;
                        }
                    }
                }
            }
        }

        let unions: Vec<(Symbol, Arc<AppFreeCanUnn>)> = self
            .union_canons
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        for (sym, canon) in unions {
            let term = self.mk_canonical_form(&canon.mk_type_term(self));
            self.union_types.insert(sym, term);
        }
        let args: Vec<((Symbol, usize), Arc<AppFreeCanUnn>)> = self
            .arg_canons
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        for (key, canon) in args {
            let term = self.mk_canonical_form(&canon.mk_type_term(self));
            self.can_type_terms.insert(key, term);
        }
        ok
    }

    pub fn union_can_unn(&self, unn: &Symbol) -> Option<Arc<AppFreeCanUnn>> {
        self.union_canons.get(unn).map(|e| e.value().clone())
    }

    pub fn arg_can_unn(&self, data: &Symbol, index: usize) -> Option<Arc<AppFreeCanUnn>> {
        self.arg_canons
            .get(&(data.clone(), index))
            .map(|e| e.value().clone())
    }

    pub fn union_type(&self, unn: &Symbol) -> Option<Term> {
        self.union_types.get(unn).map(|e| e.value().clone())
    }

    fn expect_union_type(&self, unn: &Symbol) -> Term {
        self.union_type(unn).unwrap_or_else(|| {
            panic!(
                "union {} used before its definition was compiled",
                unn.printable_name()
            )
        })
    }

    pub fn canonical_arg_type(&self, data: &Symbol, index: usize) -> Option<Term> {
        self.can_type_terms
            .get(&(data.clone(), index))
            .map(|e| e.value().clone())
    }

    fn expect_arg_type(&self, data: &Symbol, index: usize) -> Term {
        self.canonical_arg_type(data, index).unwrap_or_else(|| {
            panic!(
                "argument {index} of {} has no compiled type",
                data.printable_name()
            )
        })
    }

    pub fn data_sorts_of_arity(&self, arity: usize) -> Option<Term> {
        if let Some(found) = self.arity_unions.get(&arity) {
            return found.clone();
        }
        let sorts: Vec<Term> = self
            .symbols
            .data_symbols()
            .filter(|s| s.arity() == arity)
            .map(|s| self.sort_term(s))
            .collect();
        let result = if sorts.is_empty() {
            None
        } else {
            Some(self.mk_union_of(sorts))
        };
        self.arity_unions.entry(arity).or_insert(result).clone()
    }

    // ------------------------------------------------------------------
    // Canonical forms

    /// Flattens unions, expands named unions and folds fully general
    /// applications into their sorts. Ground and variable terms are returned unchanged.
    pub fn mk_canonical_form(&self, t: &Term) -> Term {
        self.assert_owned(t);
        if t.groundness() != Groundness::Type {
            return t.clone();
        }
        if let Some(found) = self.canonical_forms.get(t) {
            trace!(uid = t.uid(), cache_hit = true, "canonical form");
            return found.clone();
        }

        let mut stack: Vec<(Term, bool)> = vec![(t.clone(), false)];
        while let Some((cur, expanded)) = stack.pop() {
            if self.canonical_forms.contains_key(&cur) {
                continue;
            }
            if !expanded {
                stack.push((cur.clone(), true));
                for arg in cur.args().iter().rev() {
                    if arg.is_type() && !self.canonical_forms.contains_key(arg) {
                        stack.push((arg.clone(), false));
                    }
                }
                continue;
            }
            let canonical = self.canonicalize_node(&cur);
            self.canonical_forms
                .entry(canonical.clone())
                .or_insert_with(|| canonical.clone());
            self.canonical_forms.entry(cur).or_insert(canonical);
        }
        self.canonical_forms
            .get(t)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| unreachable!("canonical form of {t} was just computed"))
    }

    fn canonical_arg(&self, arg: &Term) -> Term {
        if !arg.is_type() {
            return arg.clone();
        }
        self.canonical_forms
            .get(arg)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| self.mk_canonical_form(arg))
    }

    fn canonicalize_node(&self, t: &Term) -> Term {
        let sym = t.symbol();
        match sym.kind() {
            SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
                let args: Vec<Term> = t.args().iter().map(|a| self.canonical_arg(a)).collect();
                self.fold_app(sym, args)
            }
            SymbolKind::BaseOp(OpKind::TypeUnn | OpKind::Range)
            | SymbolKind::BaseSort(_)
            | SymbolKind::UserSort { .. }
            | SymbolKind::Unn => {
                let args: Vec<Term> = t.args().iter().map(|a| self.canonical_arg(a)).collect();
                let node = self.mk_apply(sym, &args).0;
                BinnedUnion::new(self, &node)
                    .mk_term(self)
                    .unwrap_or_else(|| unreachable!("{t} has members"))
            }
            _ => {
                let args: Vec<Term> = t.args().iter().map(|a| self.canonical_arg(a)).collect();
                self.mk_apply(sym, &args).0
            }
        }
    }

    /// `data(args)`, or the sort of `data` when every argument is the declared argument type.
    pub(crate) fn fold_app(&self, data: &Symbol, args: Vec<Term>) -> Term {
        let folds = !args.is_empty()
            && args.iter().enumerate().all(|(i, a)| {
                self.canonical_arg_type(data, i)
                    .is_some_and(|declared| &declared == a)
            });
        if folds {
            self.sort_term(data)
        } else {
            self.mk_apply(data, &args).0
        }
    }

    pub fn union_components(&self, t: &Term) -> Vec<Term> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<Symbol> = FxHashSet::default();
        let mut stack = vec![t.clone()];
        while let Some(cur) = stack.pop() {
            match cur.symbol().kind() {
                SymbolKind::BaseOp(OpKind::TypeUnn) => {
                    stack.push(cur.arg(1).clone());
                    stack.push(cur.arg(0).clone());
                }
                SymbolKind::Unn => {
                    if seen.insert(cur.symbol().clone()) {
                        stack.push(self.expect_union_type(cur.symbol()));
                    }
                }
                _ => out.push(cur),
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Type algebra

    pub fn mk_intersection(&self, t1: &Term, t2: &Term) -> Option<Term> {
        self.assert_owned(t1);
        self.assert_owned(t2);
        assert!(
            t1.groundness() != Groundness::Variable && t2.groundness() != Groundness::Variable,
            "intersection of non-ground, non-type terms {t1} and {t2}"
        );
        if let Some(done) = self.intersect_fast(t1, t2) {
            return done;
        }

        let c1 = self.mk_canonical_form(t1);
        let c2 = self.mk_canonical_form(t2);
        let result = match self.intersect_fast(&c1, &c2) {
            Some(done) => done,
            None => binned::mk_intersection(self, &c1, &c2),
        };
        self.cache_intersection(t1, t2, result)
    }

    pub(crate) fn intersect_fast(&self, t1: &Term, t2: &Term) -> Option<Option<Term>> {
        if t1 == t2 {
            return Some(Some(t1.clone()));
        }
        if t1 == &self.any_type {
            return Some(Some(t2.clone()));
        }
        if t2 == &self.any_type {
            return Some(Some(t1.clone()));
        }
        if t1.is_ground() {
            return Some(self.is_ground_member(t2, t1).then(|| t1.clone()));
        }
        if t2.is_ground() {
            return Some(self.is_ground_member(t1, t2).then(|| t2.clone()));
        }
        if self.cache_intersections {
            if let Some(found) = self.canonical_intrs.get(&intr_key(t1, t2)) {
                trace!(left = t1.uid(), right = t2.uid(), cache_hit = true, "intersection");
                return Some(found.clone());
            }
        }
        None
    }

    pub(crate) fn cache_intersection(
        &self,
        t1: &Term,
        t2: &Term,
        result: Option<Term>,
    ) -> Option<Term> {
        if !self.cache_intersections {
            return result;
        }
        self.canonical_intrs
            .entry(intr_key(t1, t2))
            .or_insert(result)
            .clone()
    }

    pub fn is_ground_member(&self, ty: &Term, g: &Term) -> bool {
        self.assert_owned(ty);
        self.assert_owned(g);
        assert!(g.is_ground(), "membership test of non-ground term {g}");
        assert!(
            ty.groundness() != Groundness::Variable,
            "membership test against variable term {ty}"
        );

        let mut stack: Vec<(Term, Term)> = vec![(ty.clone(), g.clone())];
        while let Some((ty, g)) = stack.pop() {
            if !self.member_step(&ty, &g, &mut stack) {
                return false;
            }
        }
        true
    }

    fn member_step(&self, ty: &Term, g: &Term, stack: &mut Vec<(Term, Term)>) -> bool {
        if ty.is_ground() {
            return ty == g;
        }
        let sym = ty.symbol();
        match sym.kind() {
            SymbolKind::BaseSort(kind) => g.cnst_value().is_some_and(|v| kind.accepts(v)),
            SymbolKind::BaseOp(OpKind::Range) => match (ty.range_bounds(), g.as_integer()) {
                (Some((lo, hi)), Some(v)) => lo <= v && v <= hi,
                _ => false,
            },
            SymbolKind::BaseOp(OpKind::TypeUnn) | SymbolKind::Unn => {
                let mut descend: Vec<Term> = Vec::new();
                for part in self.union_components(ty) {
                    match part.symbol().kind() {
                        SymbolKind::UserSort { data } if data == g.symbol() => {
                            descend.clear();
                            descend.push(part);
                            break;
                        }
                        SymbolKind::Con { .. } | SymbolKind::Map { .. } if !part.is_ground() => {
                            if part.symbol() == g.symbol() {
                                descend.push(part);
                            }
                        }
                        SymbolKind::UserSort { .. } => {}
                        _ => {
                            let mut nested = Vec::new();
                            if self.member_step(&part, g, &mut nested) && nested.is_empty() {
                                return true;
                            }
                        }
                    }
                }
                match descend.len() {
                    0 => false,
                    1 => {
                        stack.push((descend.remove(0), g.clone()));
                        true
                    }
                    _ => descend.iter().any(|part| self.is_ground_member(part, g)),
                }
            }
            SymbolKind::UserSort { data } => {
                if g.symbol() != data {
                    return false;
                }
                for (i, arg) in g.args().iter().enumerate() {
                    stack.push((self.expect_arg_type(data, i), arg.clone()));
                }
                true
            }
            SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
                if g.symbol() != sym {
                    return false;
                }
                for (arg_ty, arg) in ty.args().iter().zip(g.args()) {
                    stack.push((arg_ty.clone(), arg.clone()));
                }
                true
            }
            SymbolKind::BaseCnst(_)
            | SymbolKind::UserCnst { .. }
            | SymbolKind::BaseOp(_) => false,
        }
    }

    /// Containment after widening every application to its sort.
    pub fn is_subtype_widened(&self, left: &Term, right: &Term) -> bool {
        self.assert_owned(left);
        self.assert_owned(right);
        let cancel = CancelToken::new();
        let mut sink = Vec::new();
        let mut l = AppFreeCanUnn::from_terms(self, std::slice::from_ref(left));
        let mut r = AppFreeCanUnn::from_terms(self, std::slice::from_ref(right));
        if !l.canonize(self, None, &mut sink, &cancel) {
            return true;
        }
        if !r.canonize(self, None, &mut sink, &cancel) {
            return false;
        }
        l.is_subset_of(&r)
    }

    /// The `(constructor, argument index)` positions whose declared type
    /// intersects `leaf`.
    pub fn type_uses(&self, leaf: &Term) -> Arc<[(Symbol, usize)]> {
        if let Some(found) = self.type_uses.get(leaf) {
            return found.clone();
        }
        let mut uses = Vec::new();
        for data in self.symbols.data_symbols() {
            for i in 0..data.arity() {
                let Some(arg_ty) = self.canonical_arg_type(data, i) else {
                    continue;
                };
                if self.mk_intersection(leaf, &arg_ty).is_some() {
                    uses.push((data.clone(), i));
                }
            }
        }
        let uses: Arc<[(Symbol, usize)]> = uses.into();
        self.type_uses
            .entry(leaf.clone())
            .or_insert(uses)
            .clone()
    }
}

impl std::fmt::Debug for TermIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermIndex")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish()
    }
}

fn intr_key(t1: &Term, t2: &Term) -> (Term, Term) {
    if t1.uid() <= t2.uid() {
        (t1.clone(), t2.clone())
    } else {
        (t2.clone(), t1.clone())
    }
}

fn component_class(t: &Term) -> u8 {
    match t.symbol().kind() {
        SymbolKind::BaseCnst(CnstValue::Rational(_)) => 0,
        SymbolKind::BaseOp(OpKind::Range) => 1,
        SymbolKind::BaseCnst(CnstValue::String(_)) => 2,
        SymbolKind::BaseSort(_) => 3,
        SymbolKind::UserCnst { .. } => 4,
        SymbolKind::UserSort { .. } | SymbolKind::Unn => 5,
        _ => 6,
    }
}

/// The order of union components: numeric constants, integer ranges,
/// strings, base sorts, user constants, user sorts, applications.
pub(crate) fn cmp_components(a: &Term, b: &Term) -> Ordering {
    let (ca, cb) = (component_class(a), component_class(b));
    if ca != cb {
        return ca.cmp(&cb);
    }
    match ca {
        0 | 2 => a.cnst_value().cmp(&b.cnst_value()),
        1 => a.range_bounds().cmp(&b.range_bounds()),
        3..=5 => a.symbol().cmp(b.symbol()),
        _ => a.uid().cmp(&b.uid()),
    }
    .then_with(|| a.uid().cmp(&b.uid()))
}
