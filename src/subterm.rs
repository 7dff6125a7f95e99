use std::collections::BTreeSet;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::debug;

use crate::symbols::{Symbol, SymbolKind, UserCnstKind};
use crate::term::Term;
use crate::term_index::TermIndex;

#[derive(Debug, Clone, Default)]
pub struct MatchLevel {
    leaves: Vec<Term>,
    triggers: IndexMap<Symbol, BTreeSet<usize>, FxBuildHasher>,
}

impl MatchLevel {
    pub fn leaves(&self) -> &[Term] {
        &self.leaves
    }

    /// `(constructor, argument index)` positions through which this level is
    /// reached from the level above.
    pub fn triggers(&self) -> impl Iterator<Item = (&Symbol, usize)> {
        self.triggers
            .iter()
            .flat_map(|(sym, args)| args.iter().map(move |i| (sym, *i)))
    }
}

/// Matches a chain `t0 ⊒ t1 ⊒ ... ⊒ tn` of nested proper subterms, where
/// every `tk` belongs to the k-th type.
///
/// Levels are computed from the innermost outwards: a level keeps only the
/// part of its type that can contain the next level.
#[derive(Debug, Clone)]
pub struct SubtermMatcher {
    only_new_kinds: bool,
    types: Vec<Term>,
    levels: Vec<MatchLevel>,
    satisfiable: bool,
}

impl SubtermMatcher {
    pub fn new(index: &TermIndex, only_new_kinds: bool, types: &[Term]) -> Self {
        assert!(!types.is_empty(), "subterm pattern needs at least one level");
        let mut levels = vec![MatchLevel::default(); types.len()];
        let mut satisfiable = true;
        let mut reachable: Option<Term> = None;

        for k in (0..types.len()).rev() {
            let ty = index.mk_canonical_form(&types[k]);
            let narrowed = match &reachable {
                None => Some(ty),
                Some(r) => index.mk_intersection(&ty, r),
            };
            let Some(narrowed) = narrowed else {
                debug!(level = k, "subterm level unreachable");
                satisfiable = false;
                break;
            };

            let mut leaves = index.union_components(&narrowed);
            if only_new_kinds {
                leaves.retain(|l| !is_derived(l.symbol()));
            }
            if leaves.is_empty() {
                satisfiable = false;
                break;
            }
            levels[k].leaves = leaves.clone();
            if k == 0 {
                break;
            }

            let mut containing: Vec<Term> = Vec::new();
            let mut seen: FxHashSet<Symbol> = FxHashSet::default();
            let mut frontier = leaves;
            while !frontier.is_empty() {
                let mut next = Vec::new();
                for leaf in &frontier {
                    for (data, arg) in index.type_uses(leaf).iter() {
                        if only_new_kinds && is_derived(data) {
                            continue;
                        }
                        levels[k]
                            .triggers
                            .entry(data.clone())
                            .or_default()
                            .insert(*arg);
                        if seen.insert(data.clone()) {
                            let sort = index.sort_term(data);
                            containing.push(sort.clone());
                            next.push(sort);
                        }
                    }
                }
                frontier = next;
            }

            if containing.is_empty() {
                debug!(level = k, "no constructor can hold this level");
                satisfiable = false;
                break;
            }
            reachable = Some(index.mk_type_union(&containing));
        }

        if !satisfiable {
            levels.iter_mut().for_each(|l| *l = MatchLevel::default());
        }
        SubtermMatcher {
            only_new_kinds,
            types: types.to_vec(),
            levels,
            satisfiable,
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.satisfiable
    }

    pub fn only_new_kinds(&self) -> bool {
        self.only_new_kinds
    }

    pub fn types(&self) -> &[Term] {
        &self.types
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, k: usize) -> &MatchLevel {
        &self.levels[k]
    }

    pub fn can_match(&self, index: &TermIndex, k: usize, leaf: &Term) -> bool {
        self.satisfiable
            && self.levels[k]
                .leaves
                .iter()
                .any(|l| index.mk_intersection(l, leaf).is_some())
    }

    pub fn is_trigger(&self, k: usize, data: &Symbol, arg: usize) -> bool {
        self.levels[k]
            .triggers
            .get(data)
            .is_some_and(|args| args.contains(&arg))
    }
}

fn is_derived(sym: &Symbol) -> bool {
    match sym.kind() {
        SymbolKind::UserSort { data } => data.is_derived_kind(),
        SymbolKind::UserCnst {
            kind: UserCnstKind::Derived,
            ..
        } => true,
        _ => sym.is_derived_kind(),
    }
}
