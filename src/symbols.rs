use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use dashmap::DashMap;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::ast::{DeclKind, EnumElem, Module, TypeDecl, TypeExpr};
use crate::diagnostics::{Diagnostic, Span};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CnstValue {
    Rational(BigRational),
    String(String),
}

impl CnstValue {
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            CnstValue::Rational(r) => Some(r),
            CnstValue::String(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            CnstValue::Rational(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CnstValue::String(s) => Some(s),
            CnstValue::Rational(_) => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, CnstValue::Rational(r) if r.is_integer())
    }
}

impl fmt::Display for CnstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CnstValue::Rational(r) if r.is_integer() => write!(f, "{}", r.numer()),
            CnstValue::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            CnstValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for CnstValue {
    fn from(value: i64) -> Self {
        CnstValue::Rational(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<BigInt> for CnstValue {
    fn from(value: BigInt) -> Self {
        CnstValue::Rational(BigRational::from_integer(value))
    }
}

impl From<BigRational> for CnstValue {
    fn from(value: BigRational) -> Self {
        CnstValue::Rational(value)
    }
}

impl From<&str> for CnstValue {
    fn from(value: &str) -> Self {
        CnstValue::String(value.to_string())
    }
}

impl From<String> for CnstValue {
    fn from(value: String) -> Self {
        CnstValue::String(value)
    }
}

pub fn parse_numeral(raw: &str) -> Option<BigRational> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some((numer, denom)) = raw.split_once('/') {
        let numer = BigInt::from_str(numer.trim()).ok()?;
        let denom = BigInt::from_str(denom.trim()).ok()?;
        if denom.is_zero() {
            return None;
        }
        return Some(BigRational::new(numer, denom));
    }
    if let Some((whole, frac)) = raw.split_once('.') {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let negative = whole.starts_with('-');
        let whole_digits = whole.trim_start_matches(['-', '+']);
        let digits = format!("{}{}", if whole_digits.is_empty() { "0" } else { whole_digits }, frac);
        let mut numer = BigInt::from_str(&digits).ok()?;
        if negative {
            numer = -numer;
        }
        let denom = num_traits::pow(BigInt::from(10), frac.len());
        return Some(BigRational::new(numer, denom));
    }
    BigInt::from_str(raw).ok().map(BigRational::from_integer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BaseSortKind {
    Real,
    Integer,
    Natural,
    PosInteger,
    NegInteger,
    String,
}

impl BaseSortKind {
    pub const ALL: [BaseSortKind; 6] = [
        BaseSortKind::Real,
        BaseSortKind::Integer,
        BaseSortKind::Natural,
        BaseSortKind::PosInteger,
        BaseSortKind::NegInteger,
        BaseSortKind::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BaseSortKind::Real => "Real",
            BaseSortKind::Integer => "Integer",
            BaseSortKind::Natural => "Natural",
            BaseSortKind::PosInteger => "PosInteger",
            BaseSortKind::NegInteger => "NegInteger",
            BaseSortKind::String => "String",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != BaseSortKind::String
    }

    pub fn accepts(self, value: &CnstValue) -> bool {
        match (self, value) {
            (BaseSortKind::String, CnstValue::String(_)) => true,
            (BaseSortKind::String, CnstValue::Rational(_)) => false,
            (_, CnstValue::String(_)) => false,
            (BaseSortKind::Real, CnstValue::Rational(_)) => true,
            (BaseSortKind::Integer, CnstValue::Rational(r)) => r.is_integer(),
            (BaseSortKind::Natural, CnstValue::Rational(r)) => r.is_integer() && !r.is_negative(),
            (BaseSortKind::PosInteger, CnstValue::Rational(r)) => {
                r.is_integer() && r >= &BigRational::one()
            }
            (BaseSortKind::NegInteger, CnstValue::Rational(r)) => {
                r.is_integer() && r.is_negative()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelKind {
    pub const ALL: [RelKind; 6] = [
        RelKind::Eq,
        RelKind::Ne,
        RelKind::Lt,
        RelKind::Le,
        RelKind::Gt,
        RelKind::Ge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelKind::Eq => "=",
            RelKind::Ne => "!=",
            RelKind::Lt => "<",
            RelKind::Le => "<=",
            RelKind::Gt => ">",
            RelKind::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    Range,
    TypeUnn,
    Select,
    Relational(RelKind),
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Range => "..",
            OpKind::TypeUnn => "+",
            OpKind::Select => ".",
            OpKind::Relational(rel) => rel.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCnstKind {
    New,
    Derived,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    BaseCnst(CnstValue),
    BaseSort(BaseSortKind),
    BaseOp(OpKind),
    UserCnst { kind: UserCnstKind, auto_gen: bool },
    Con { is_new: bool },
    Map { domain_arity: usize },
    Unn,
    /// The sort of all well-formed applications of a constructor or map.
    UserSort { data: Symbol },
}

struct SymbolData {
    id: u32,
    builtin: bool,
    name: String,
    namespace: String,
    arity: usize,
    kind: SymbolKind,
}

/// A registered symbol. Two symbols are equal iff they are the same registration.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolData>);

impl Symbol {
    fn new(id: u32, name: &str, namespace: &str, arity: usize, kind: SymbolKind) -> Self {
        Self::with_origin(id, false, name, namespace, arity, kind)
    }

    fn with_origin(
        id: u32,
        builtin: bool,
        name: &str,
        namespace: &str,
        arity: usize,
        kind: SymbolKind,
    ) -> Self {
        Symbol(Arc::new(SymbolData {
            id,
            builtin,
            name: name.to_string(),
            namespace: namespace.to_string(),
            arity,
            kind,
        }))
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_builtin(&self) -> bool {
        self.0.builtin
    }

    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    pub fn printable_name(&self) -> String {
        if self.0.namespace.is_empty() {
            self.0.name.clone()
        } else {
            format!("{}.{}", self.0.namespace, self.0.name)
        }
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.0.kind
    }

    pub fn cnst_value(&self) -> Option<&CnstValue> {
        match &self.0.kind {
            SymbolKind::BaseCnst(v) => Some(v),
            _ => None,
        }
    }

    pub fn base_sort(&self) -> Option<BaseSortKind> {
        match &self.0.kind {
            SymbolKind::BaseSort(k) => Some(*k),
            _ => None,
        }
    }

    pub fn op(&self) -> Option<OpKind> {
        match &self.0.kind {
            SymbolKind::BaseOp(op) => Some(*op),
            _ => None,
        }
    }

    pub fn is_data_symbol(&self) -> bool {
        matches!(self.0.kind, SymbolKind::Con { .. } | SymbolKind::Map { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self.0.kind, SymbolKind::Unn)
    }

    pub fn is_derived_kind(&self) -> bool {
        match &self.0.kind {
            SymbolKind::UserCnst { kind, .. } => *kind != UserCnstKind::New,
            SymbolKind::Con { is_new } => !is_new,
            SymbolKind::UserSort { data } => data.is_derived_kind(),
            SymbolKind::Map { .. } => false,
            SymbolKind::BaseCnst(_)
            | SymbolKind::BaseSort(_)
            | SymbolKind::BaseOp(_)
            | SymbolKind::Unn => false,
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.printable_name(), self.0.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            SymbolKind::BaseCnst(v) => write!(f, "{v}"),
            _ => write!(f, "{}", self.printable_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Union(TypeExpr),
    Args(Vec<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct DeclInfo {
    pub def: TypeDef,
    pub span: Option<Span>,
}

pub struct SymbolTable {
    next_id: AtomicU32,
    base_sorts: FxHashMap<BaseSortKind, Symbol>,
    ops: FxHashMap<OpKind, Symbol>,
    by_name: FxHashMap<String, Symbol>,
    by_simple_name: FxHashMap<String, Vec<Symbol>>,
    decls: IndexMap<Symbol, DeclInfo>,
    sorts: FxHashMap<Symbol, Symbol>,
    user_cnsts: Vec<Symbol>,
    cnsts: DashMap<CnstValue, Symbol>,
    vars: DashMap<String, Symbol>,
    true_symbol: Symbol,
    false_symbol: Symbol,
    boolean_symbol: Symbol,
}

impl SymbolTable {
    pub fn new() -> Self {
        let next_id = AtomicU32::new(0);
        let fresh = |name: &str, arity: usize, kind: SymbolKind| {
            Symbol::with_origin(
                next_id.fetch_add(1, AtomicOrdering::Relaxed),
                true,
                name,
                "",
                arity,
                kind,
            )
        };

        let mut base_sorts = FxHashMap::default();
        for kind in BaseSortKind::ALL {
            base_sorts.insert(kind, fresh(kind.name(), 0, SymbolKind::BaseSort(kind)));
        }

        let mut ops = FxHashMap::default();
        let mut op_kinds = vec![OpKind::Range, OpKind::TypeUnn, OpKind::Select];
        op_kinds.extend(RelKind::ALL.into_iter().map(OpKind::Relational));
        for op in op_kinds {
            ops.insert(op, fresh(op.name(), 2, SymbolKind::BaseOp(op)));
        }

        let user_cnst = SymbolKind::UserCnst {
            kind: UserCnstKind::New,
            auto_gen: false,
        };
        let true_symbol = fresh("TRUE", 0, user_cnst.clone());
        let false_symbol = fresh("FALSE", 0, user_cnst);
        let boolean_symbol = fresh("Boolean", 0, SymbolKind::Unn);

        let mut table = Self {
            next_id,
            base_sorts,
            ops,
            by_name: FxHashMap::default(),
            by_simple_name: FxHashMap::default(),
            decls: IndexMap::new(),
            sorts: FxHashMap::default(),
            user_cnsts: Vec::new(),
            cnsts: DashMap::new(),
            vars: DashMap::new(),
            true_symbol: true_symbol.clone(),
            false_symbol: false_symbol.clone(),
            boolean_symbol: boolean_symbol.clone(),
        };

        let sorts: Vec<Symbol> = BaseSortKind::ALL
            .iter()
            .map(|k| table.base_sorts[k].clone())
            .collect();
        for sym in sorts {
            table.index_name(&sym);
        }
        table.index_name(&true_symbol);
        table.index_name(&false_symbol);
        table.user_cnsts.push(true_symbol);
        table.user_cnsts.push(false_symbol);
        table.index_name(&boolean_symbol);
        table.decls.insert(
            boolean_symbol,
            DeclInfo {
                def: TypeDef::Union(TypeExpr::enumeration(vec![
                    EnumElem::id("TRUE"),
                    EnumElem::id("FALSE"),
                ])),
                span: None,
            },
        );
        table
    }

    fn fresh_id(&self) -> u32 {
        self.next_id.fetch_add(1, AtomicOrdering::Relaxed)
    }

    fn index_name(&mut self, sym: &Symbol) {
        self.by_name.insert(sym.printable_name(), sym.clone());
        self.by_simple_name
            .entry(sym.name().to_string())
            .or_default()
            .push(sym.clone());
    }

    pub fn declare_module(&mut self, module: &Module) -> Vec<Diagnostic> {
        let mut errors = Vec::new();
        for decl in &module.decls {
            self.declare(decl, &mut errors);
        }
        errors
    }

    /// Registers one declaration; on failure a diagnostic is appended and nothing is registered.
    pub fn declare(&mut self, decl: &TypeDecl, flags: &mut Vec<Diagnostic>) -> Option<Symbol> {
        if !is_valid_identifier(&decl.name) {
            flags.push(Diagnostic::bad_id(
                &decl.name,
                "declaration names must be non-empty identifiers",
                decl.span.clone(),
            ));
            return None;
        }
        if !decl.namespace.is_empty() && !decl.namespace.split('.').all(is_valid_identifier) {
            flags.push(Diagnostic::bad_id(
                &decl.namespace,
                "namespaces are dot-separated identifiers",
                decl.span.clone(),
            ));
            return None;
        }
        let qualified = decl.qualified_name();
        if self.by_name.contains_key(&qualified) {
            flags.push(Diagnostic::duplicate_definition(&qualified, decl.span.clone()));
            return None;
        }

        let (arity, kind, def) = match &decl.kind {
            DeclKind::Constant { derived } => (
                0,
                SymbolKind::UserCnst {
                    kind: if *derived {
                        UserCnstKind::Derived
                    } else {
                        UserCnstKind::New
                    },
                    auto_gen: false,
                },
                None,
            ),
            DeclKind::Constructor { derived, args } => {
                if args.is_empty() {
                    flags.push(Diagnostic::bad_id(
                        &qualified,
                        "constructors need at least one argument",
                        decl.span.clone(),
                    ));
                    return None;
                }
                (
                    args.len(),
                    SymbolKind::Con { is_new: !derived },
                    Some(TypeDef::Args(args.clone())),
                )
            }
            DeclKind::Map { domain, codomain } => {
                if domain.is_empty() || codomain.is_empty() {
                    flags.push(Diagnostic::bad_id(
                        &qualified,
                        "maps need a non-empty domain and codomain",
                        decl.span.clone(),
                    ));
                    return None;
                }
                let mut args = domain.clone();
                args.extend(codomain.iter().cloned());
                (
                    args.len(),
                    SymbolKind::Map {
                        domain_arity: domain.len(),
                    },
                    Some(TypeDef::Args(args)),
                )
            }
            DeclKind::Union { def } => (0, SymbolKind::Unn, Some(TypeDef::Union(def.clone()))),
        };

        let sym = Symbol::new(self.fresh_id(), &decl.name, &decl.namespace, arity, kind);
        self.index_name(&sym);
        if sym.is_data_symbol() {
            let sort = Symbol::new(
                self.fresh_id(),
                &decl.name,
                &decl.namespace,
                0,
                SymbolKind::UserSort { data: sym.clone() },
            );
            self.sorts.insert(sym.clone(), sort);
        }
        match def {
            Some(def) => {
                self.decls.insert(
                    sym.clone(),
                    DeclInfo {
                        def,
                        span: decl.span.clone(),
                    },
                );
            }
            None => self.user_cnsts.push(sym.clone()),
        }
        Some(sym)
    }

    /// Resolves a possibly qualified name. Bare names are looked up in every namespace.
    pub fn resolve(&self, name: &str, span: Option<&Span>) -> Result<Symbol, Diagnostic> {
        if name.contains('.') {
            return self
                .by_name
                .get(name)
                .cloned()
                .ok_or_else(|| Diagnostic::undefined_symbol(name, span.cloned()));
        }
        match self.by_simple_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(Diagnostic::undefined_symbol(name, span.cloned())),
            Some([only]) => Ok(only.clone()),
            Some(many) => {
                let candidates: Vec<String> = many.iter().map(Symbol::printable_name).collect();
                Err(Diagnostic::ambiguous_symbol(name, &candidates, span.cloned()))
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name)
    }

    pub fn base_sort(&self, kind: BaseSortKind) -> &Symbol {
        &self.base_sorts[&kind]
    }

    pub fn op(&self, op: OpKind) -> &Symbol {
        &self.ops[&op]
    }

    pub fn true_symbol(&self) -> &Symbol {
        &self.true_symbol
    }

    pub fn false_symbol(&self) -> &Symbol {
        &self.false_symbol
    }

    pub fn boolean_symbol(&self) -> &Symbol {
        &self.boolean_symbol
    }

    pub fn sort_of(&self, data: &Symbol) -> Option<&Symbol> {
        self.sorts.get(data)
    }

    pub fn decl(&self, sym: &Symbol) -> Option<&DeclInfo> {
        self.decls.get(sym)
    }

    pub fn decls(&self) -> impl Iterator<Item = (&Symbol, &DeclInfo)> {
        self.decls.iter()
    }

    pub fn data_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.decls.keys().filter(|s| s.is_data_symbol())
    }

    pub fn union_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.decls.keys().filter(|s| s.is_union())
    }

    pub fn user_constants(&self) -> &[Symbol] {
        &self.user_cnsts
    }

    pub fn cnst_symbol(&self, value: &CnstValue) -> Symbol {
        if let Some(found) = self.cnsts.get(value) {
            return found.clone();
        }
        self.cnsts
            .entry(value.clone())
            .or_insert_with(|| {
                Symbol::new(
                    self.fresh_id(),
                    &value.to_string(),
                    "",
                    0,
                    SymbolKind::BaseCnst(value.clone()),
                )
            })
            .clone()
    }

    pub fn var_symbol(&self, name: &str, auto_gen: bool) -> Symbol {
        let sym = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| {
                Symbol::new(
                    self.fresh_id(),
                    name,
                    "",
                    0,
                    SymbolKind::UserCnst {
                        kind: UserCnstKind::Variable,
                        auto_gen,
                    },
                )
            })
            .clone();
        if let SymbolKind::UserCnst { auto_gen: existing, .. } = sym.kind() {
            assert_eq!(
                *existing, auto_gen,
                "variable {name} reused with a different auto-generated flag"
            );
        }
        sym
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("declarations", &self.decls.len())
            .field("constants", &self.cnsts.len())
            .field("variables", &self.vars.len())
            .finish()
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '#' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
}
