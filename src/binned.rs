use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use tracing::trace;

use crate::lattice::NumericSet;
use crate::symbols::{BaseSortKind, CnstValue, OpKind, Symbol, SymbolKind, UserCnstKind};
use crate::term::Term;
use crate::term_index::TermIndex;

type TermSet = IndexSet<Term, FxBuildHasher>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinLabel {
    Real,
    String,
    True,
    Data(Symbol),
}

impl BinLabel {
    pub fn of(t: &Term) -> BinLabel {
        let sym = t.symbol();
        match sym.kind() {
            SymbolKind::BaseSort(BaseSortKind::String) => BinLabel::String,
            SymbolKind::BaseSort(_) => BinLabel::Real,
            SymbolKind::BaseCnst(CnstValue::Rational(_)) => BinLabel::Real,
            SymbolKind::BaseCnst(CnstValue::String(_)) => BinLabel::String,
            SymbolKind::BaseOp(OpKind::Range) => BinLabel::Real,
            SymbolKind::UserCnst {
                kind: UserCnstKind::New | UserCnstKind::Derived,
                ..
            } => BinLabel::True,
            SymbolKind::UserSort { data } => BinLabel::Data(data.clone()),
            SymbolKind::Con { .. } | SymbolKind::Map { .. } => BinLabel::Data(sym.clone()),
            _ => panic!("{t} cannot be a union disjunct"),
        }
    }
}

/// A union split into bins by label.
///
/// The Real bin keeps its content as a [`NumericSet`]. A String or Data bin
/// that holds its sort holds nothing else.
#[derive(Debug, Clone, Default)]
pub struct BinnedUnion {
    numeric: NumericSet,
    bins: IndexMap<BinLabel, TermSet, FxBuildHasher>,
}

impl BinnedUnion {
    pub fn new(index: &TermIndex, t: &Term) -> Self {
        Self::from_terms(index, std::slice::from_ref(t))
    }

    pub fn from_terms(index: &TermIndex, terms: &[Term]) -> Self {
        let mut out = BinnedUnion::default();
        for t in terms {
            for part in index.union_components(t) {
                out.add(index, part);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.bins.values().all(IndexSet::is_empty)
    }

    pub fn labels(&self) -> impl Iterator<Item = &BinLabel> {
        self.bins.keys()
    }

    pub fn numeric(&self) -> &NumericSet {
        &self.numeric
    }

    pub fn add(&mut self, index: &TermIndex, t: Term) {
        let label = BinLabel::of(&t);
        if label == BinLabel::Real {
            match t.symbol().kind() {
                SymbolKind::BaseSort(kind) => self.numeric.add_sort(*kind),
                SymbolKind::BaseCnst(CnstValue::Rational(r)) => self.numeric.add_constant(r),
                _ => {
                    let (lo, hi) = t
                        .range_bounds()
                        .unwrap_or_else(|| panic!("range {t} has non-integer bounds"));
                    self.numeric.add_range(lo, hi);
                }
            }
            return;
        }

        let maximal = is_maximal(index, &label, &t);
        let bin = self.bins.entry(label.clone()).or_default();
        if maximal {
            bin.clear();
            bin.insert(t);
        } else if !bin.first().is_some_and(|m| is_maximal(index, &label, m)) {
            bin.insert(t);
        }
    }

    fn add_numeric(&mut self, numeric: NumericSet) {
        self.numeric.add_all(&numeric);
    }

    fn maximal_of(&self, index: &TermIndex, label: &BinLabel) -> Option<&Term> {
        self.bins
            .get(label)
            .and_then(|bin| bin.first())
            .filter(|m| is_maximal(index, label, m))
    }

    pub fn mk_term(&self, index: &TermIndex) -> Option<Term> {
        let mut numeric = self.numeric.clone();
        numeric.simplify();

        let mut components = Vec::new();
        for kind in numeric.sorts() {
            components.push(index.base_sort_term(kind));
        }
        for fraction in &numeric.fractions {
            components.push(index.mk_cnst(fraction.clone()));
        }
        for (lo, hi) in numeric.intervals.iter() {
            components.push(index.mk_interval_term(lo.clone(), hi.clone()));
        }
        for bin in self.bins.values() {
            components.extend(bin.iter().cloned());
        }
        if components.is_empty() {
            return None;
        }
        Some(index.mk_union_of(components))
    }
}

fn is_maximal(index: &TermIndex, label: &BinLabel, t: &Term) -> bool {
    match label {
        BinLabel::String => t.symbol() == index.symbols().base_sort(BaseSortKind::String),
        BinLabel::Data(_) => matches!(t.symbol().kind(), SymbolKind::UserSort { .. }),
        BinLabel::Real | BinLabel::True => false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    frame: usize,
    app: usize,
    arg: usize,
}

#[derive(Debug)]
struct DelayedIntersection {
    left: Term,
    right: Term,
    slot: Slot,
}

#[derive(Debug)]
struct PendingApp {
    symbol: Symbol,
    args: Vec<Option<Term>>,
    failed: bool,
}

#[derive(Debug)]
struct Frame {
    left: Term,
    right: Term,
    parent: Option<Slot>,
    result: BinnedUnion,
    pending: Vec<PendingApp>,
    outstanding: usize,
}

/// Intersects two canonical types.
///
/// Nested argument intersections go through an explicit work stack, so the
/// depth of the types does not grow the call stack. Every level is finished
/// before its result is stored in the parent's argument slot.
pub fn mk_intersection(index: &TermIndex, t1: &Term, t2: &Term) -> Option<Term> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut stack: Vec<DelayedIntersection> = Vec::new();
    let mut root_result: Option<Option<Term>> = None;

    open_frame(index, t1, t2, None, &mut frames, &mut stack, &mut root_result);
    while let Some(job) = stack.pop() {
        match index.intersect_fast(&job.left, &job.right) {
            Some(done) => deliver(index, job.slot, done, &mut frames, &mut root_result),
            None => open_frame(
                index,
                &job.left,
                &job.right,
                Some(job.slot),
                &mut frames,
                &mut stack,
                &mut root_result,
            ),
        }
    }

    root_result.unwrap_or_else(|| unreachable!("intersection frames left unfinished"))
}

fn open_frame(
    index: &TermIndex,
    t1: &Term,
    t2: &Term,
    parent: Option<Slot>,
    frames: &mut Vec<Frame>,
    stack: &mut Vec<DelayedIntersection>,
    root_result: &mut Option<Option<Term>>,
) {
    trace!(left = %t1, right = %t2, "intersect");
    let left = BinnedUnion::new(index, t1);
    let right = BinnedUnion::new(index, t2);
    let frame_id = frames.len();
    let mut frame = Frame {
        left: t1.clone(),
        right: t2.clone(),
        parent,
        result: BinnedUnion::default(),
        pending: Vec::new(),
        outstanding: 0,
    };

    frame
        .result
        .add_numeric(left.numeric.intersect(&right.numeric));

    let mut deferred: Vec<DelayedIntersection> = Vec::new();
    for (label, lbin) in &left.bins {
        let Some(rbin) = right.bins.get(label) else {
            continue;
        };
        let lmax = left.maximal_of(index, label);
        let rmax = right.maximal_of(index, label);
        match (lmax, rmax) {
            (Some(l), Some(_)) => frame.result.add(index, l.clone()),
            (Some(sort), None) => pass_through(index, sort, rbin, &mut frame.result),
            (None, Some(sort)) => pass_through(index, sort, lbin, &mut frame.result),
            (None, None) => {
                for a in lbin {
                    for b in rbin {
                        intersect_members(index, a, b, frame_id, &mut frame, &mut deferred);
                    }
                }
            }
        }
    }

    frame.outstanding = deferred.len();
    frames.push(frame);
    if deferred.is_empty() {
        finish(index, frame_id, frames, root_result);
    } else {
        stack.extend(deferred);
    }
}

/// Members of a bin intersected with the bin's sort: type members are kept,
/// ground members must belong to the sort.
fn pass_through(index: &TermIndex, sort: &Term, members: &TermSet, out: &mut BinnedUnion) {
    for m in members {
        if !m.is_ground() || index.is_ground_member(sort, m) {
            out.add(index, m.clone());
        }
    }
}

fn intersect_members(
    index: &TermIndex,
    a: &Term,
    b: &Term,
    frame_id: usize,
    frame: &mut Frame,
    deferred: &mut Vec<DelayedIntersection>,
) {
    if a.is_ground() || b.is_ground() {
        if let Some(Some(t)) = index.intersect_fast(a, b) {
            frame.result.add(index, t);
        }
        return;
    }
    if a == b {
        frame.result.add(index, a.clone());
        return;
    }
    if a.symbol() != b.symbol() {
        return;
    }

    let app = frame.pending.len();
    let mut pending = PendingApp {
        symbol: a.symbol().clone(),
        args: vec![None; a.args().len()],
        failed: false,
    };
    for (arg, (x, y)) in a.args().iter().zip(b.args()).enumerate() {
        match index.intersect_fast(x, y) {
            Some(Some(t)) => pending.args[arg] = Some(t),
            Some(None) => {
                pending.failed = true;
                break;
            }
            None => deferred.push(DelayedIntersection {
                left: x.clone(),
                right: y.clone(),
                slot: Slot {
                    frame: frame_id,
                    app,
                    arg,
                },
            }),
        }
    }
    if pending.failed {
        deferred.retain(|d| !(d.slot.frame == frame_id && d.slot.app == app));
    }
    frame.pending.push(pending);
}

fn deliver(
    index: &TermIndex,
    slot: Slot,
    value: Option<Term>,
    frames: &mut [Frame],
    root_result: &mut Option<Option<Term>>,
) {
    let frame = &mut frames[slot.frame];
    let pending = &mut frame.pending[slot.app];
    match value {
        Some(t) => pending.args[slot.arg] = Some(t),
        None => pending.failed = true,
    }
    frame.outstanding -= 1;
    if frame.outstanding == 0 {
        finish(index, slot.frame, frames, root_result);
    }
}

fn finish(
    index: &TermIndex,
    mut frame_id: usize,
    frames: &mut [Frame],
    root_result: &mut Option<Option<Term>>,
) {
    loop {
        let frame = &mut frames[frame_id];
        for pending in std::mem::take(&mut frame.pending) {
            if pending.failed {
                continue;
            }
            let args: Vec<Term> = pending
                .args
                .into_iter()
                .map(|a| a.unwrap_or_else(|| unreachable!("argument slot never filled")))
                .collect();
            let app = index.fold_app(&pending.symbol, args);
            frame.result.add(index, app);
        }
        let result = frame
            .result
            .mk_term(index)
            .map(|t| index.mk_canonical_form(&t));
        let result = index.cache_intersection(&frame.left, &frame.right, result);

        let Some(slot) = frame.parent else {
            *root_result = Some(result);
            return;
        };
        let parent = &mut frames[slot.frame];
        let pending = &mut parent.pending[slot.app];
        match result {
            Some(t) => pending.args[slot.arg] = Some(t),
            None => pending.failed = true,
        }
        parent.outstanding -= 1;
        if parent.outstanding > 0 {
            return;
        }
        frame_id = slot.frame;
    }
}
