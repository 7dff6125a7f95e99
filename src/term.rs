use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use num_bigint::BigInt;

use crate::symbols::{CnstValue, OpKind, Symbol, SymbolKind, UserCnstKind};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    pub(crate) fn fresh() -> Self {
        ArenaId(NEXT_ARENA_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Groundness {
    Ground,
    Variable,
    Type,
}

/// Groundness of `symbol(args)`.
///
/// Panics if Variable and Type arguments are mixed.
pub fn derive_groundness(symbol: &Symbol, args: &[Term]) -> Groundness {
    match symbol.kind() {
        SymbolKind::BaseCnst(_) => Groundness::Ground,
        SymbolKind::BaseSort(_) | SymbolKind::UserSort { .. } | SymbolKind::Unn => {
            Groundness::Type
        }
        SymbolKind::UserCnst {
            kind: UserCnstKind::Variable,
            ..
        } => Groundness::Variable,
        SymbolKind::UserCnst { .. } => Groundness::Ground,
        SymbolKind::BaseOp(OpKind::Range | OpKind::TypeUnn) => Groundness::Type,
        SymbolKind::BaseOp(_) | SymbolKind::Con { .. } | SymbolKind::Map { .. } => {
            let has_var = args.iter().any(|a| a.groundness() == Groundness::Variable);
            let has_type = args.iter().any(|a| a.groundness() == Groundness::Type);
            assert!(
                !(has_var && has_type),
                "{} applied to both variable and type arguments",
                symbol.printable_name()
            );
            if has_var {
                Groundness::Variable
            } else if has_type {
                Groundness::Type
            } else {
                Groundness::Ground
            }
        }
    }
}

struct TermData {
    uid: u64,
    owner: ArenaId,
    symbol: Symbol,
    args: Box<[Term]>,
    groundness: Groundness,
}

/// An immutable, hash-consed term. Equality, hashing and ordering use the
/// arena-assigned uid, never the memory address.
#[derive(Clone)]
pub struct Term(Arc<TermData>);

impl Term {
    pub(crate) fn new(
        uid: u64,
        owner: ArenaId,
        symbol: Symbol,
        args: Box<[Term]>,
        groundness: Groundness,
    ) -> Self {
        Term(Arc::new(TermData {
            uid,
            owner,
            symbol,
            args,
            groundness,
        }))
    }

    pub fn uid(&self) -> u64 {
        self.0.uid
    }

    pub fn owner(&self) -> ArenaId {
        self.0.owner
    }

    pub fn symbol(&self) -> &Symbol {
        &self.0.symbol
    }

    pub fn args(&self) -> &[Term] {
        &self.0.args
    }

    pub fn arg(&self, index: usize) -> &Term {
        &self.0.args[index]
    }

    pub fn groundness(&self) -> Groundness {
        self.0.groundness
    }

    pub fn is_ground(&self) -> bool {
        self.0.groundness == Groundness::Ground
    }

    pub fn is_type(&self) -> bool {
        self.0.groundness == Groundness::Type
    }

    pub fn cnst_value(&self) -> Option<&CnstValue> {
        self.0.symbol.cnst_value()
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        self.cnst_value().and_then(CnstValue::as_integer)
    }

    pub fn is_op(&self, op: OpKind) -> bool {
        self.0.symbol.op() == Some(op)
    }

    pub fn range_bounds(&self) -> Option<(BigInt, BigInt)> {
        if !self.is_op(OpKind::Range) {
            return None;
        }
        let lo = self.arg(0).as_integer()?;
        let hi = self.arg(1).as_integer()?;
        Some(if lo <= hi { (lo, hi) } else { (hi, lo) })
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.0.uid == other.0.uid && self.0.owner == other.0.owner
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.uid.hash(state);
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .uid
            .cmp(&other.0.uid)
            .then_with(|| self.0.owner.0.cmp(&other.0.owner.0))
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term#{}({self})", self.0.uid)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = self.symbol();
        match sym.kind() {
            SymbolKind::BaseOp(OpKind::Range) => write!(f, "{}..{}", self.arg(0), self.arg(1)),
            SymbolKind::BaseOp(OpKind::TypeUnn) => {
                let mut cur = self;
                let mut first = true;
                loop {
                    if !first {
                        write!(f, " + ")?;
                    }
                    first = false;
                    if cur.is_op(OpKind::TypeUnn) {
                        write!(f, "{}", cur.arg(0))?;
                        cur = cur.arg(1);
                    } else {
                        return write!(f, "{cur}");
                    }
                }
            }
            SymbolKind::BaseOp(OpKind::Select) => match self.arg(1).cnst_value() {
                Some(CnstValue::String(label)) => write!(f, "{}.{label}", self.arg(0)),
                _ => write!(f, "{}.{}", self.arg(0), self.arg(1)),
            },
            SymbolKind::BaseOp(OpKind::Relational(rel)) => {
                write!(f, "{} {} {}", self.arg(0), rel.name(), self.arg(1))
            }
            _ if self.args().is_empty() => write!(f, "{sym}"),
            _ => {
                write!(f, "{}(", sym.printable_name())?;
                for (idx, arg) in self.args().iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
