use std::collections::BTreeSet;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::intervals::Intervals;
use crate::symbols::BaseSortKind;

/// The numeric part of a union: numeric base sorts, non-integral constants
/// and integer intervals.
///
/// After [`NumericSet::simplify`] no member is subsumed by another one:
/// `Real` absorbs everything, `Integer` absorbs the integer sorts and all
/// intervals, `PosInteger + 0` becomes `Natural`, `Natural + NegInteger`
/// becomes `Integer`, and the remaining sorts trim the intervals they cover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NumericSet {
    pub real: bool,
    pub integer: bool,
    pub natural: bool,
    pub pos: bool,
    pub neg: bool,
    pub fractions: BTreeSet<BigRational>,
    pub intervals: Intervals,
}

impl NumericSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.real
            && !self.integer
            && !self.natural
            && !self.pos
            && !self.neg
            && self.fractions.is_empty()
            && self.intervals.is_empty()
    }

    pub fn add_sort(&mut self, kind: BaseSortKind) {
        match kind {
            BaseSortKind::Real => self.real = true,
            BaseSortKind::Integer => self.integer = true,
            BaseSortKind::Natural => self.natural = true,
            BaseSortKind::PosInteger => self.pos = true,
            BaseSortKind::NegInteger => self.neg = true,
            BaseSortKind::String => {
                panic!("String is not a numeric sort")
            }
        }
    }

    pub fn has_sort(&self, kind: BaseSortKind) -> bool {
        match kind {
            BaseSortKind::Real => self.real,
            BaseSortKind::Integer => self.integer,
            BaseSortKind::Natural => self.natural,
            BaseSortKind::PosInteger => self.pos,
            BaseSortKind::NegInteger => self.neg,
            BaseSortKind::String => false,
        }
    }

    pub fn sorts(&self) -> Vec<BaseSortKind> {
        BaseSortKind::ALL
            .into_iter()
            .filter(|k| self.has_sort(*k))
            .collect()
    }

    pub fn add_constant(&mut self, value: &BigRational) {
        if value.is_integer() {
            let v = value.to_integer();
            self.intervals.add(v.clone(), v);
        } else {
            self.fractions.insert(value.clone());
        }
    }

    pub fn add_range(&mut self, lo: BigInt, hi: BigInt) {
        self.intervals.add(lo, hi);
    }

    pub fn add_all(&mut self, other: &NumericSet) {
        self.real |= other.real;
        self.integer |= other.integer;
        self.natural |= other.natural;
        self.pos |= other.pos;
        self.neg |= other.neg;
        self.fractions.extend(other.fractions.iter().cloned());
        self.intervals.add_all(&other.intervals);
    }

    pub fn simplify(&mut self) {
        if self.real {
            *self = NumericSet {
                real: true,
                ..NumericSet::default()
            };
            return;
        }

        let zero = BigInt::zero();
        if self.pos && !self.natural && self.intervals.contains_point(&zero) {
            self.natural = true;
        }
        if self.natural && self.neg {
            self.integer = true;
        }
        if self.integer {
            self.natural = false;
            self.pos = false;
            self.neg = false;
            self.intervals = Intervals::new();
            return;
        }
        if self.natural {
            self.pos = false;
            self.intervals.remove_at_least(&zero);
        }
        if self.pos {
            self.intervals.remove_at_least(&BigInt::one());
        }
        if self.neg {
            self.intervals.remove_at_most(&-BigInt::one());
        }
    }

    pub fn accepts_value(&self, value: &BigRational) -> bool {
        if self.real {
            return true;
        }
        if !value.is_integer() {
            return self.fractions.contains(value);
        }
        if self.integer {
            return true;
        }
        let v = value.to_integer();
        (self.natural && !v.is_negative())
            || (self.pos && v.is_positive())
            || (self.neg && v.is_negative())
            || self.intervals.contains_point(&v)
    }

    pub fn accepts_range(&self, lo: &BigInt, hi: &BigInt) -> bool {
        if self.real || self.integer {
            return true;
        }
        let mut rest = Intervals::single(lo.clone(), hi.clone());
        if self.natural {
            rest.remove_at_least(&BigInt::zero());
        }
        if self.pos {
            rest.remove_at_least(&BigInt::one());
        }
        if self.neg {
            rest.remove_at_most(&-BigInt::one());
        }
        for (a, b) in self.intervals.iter() {
            if rest.is_empty() {
                break;
            }
            rest.remove(a, b);
        }
        rest.is_empty()
    }

    /// Whether `self` is contained in `other`. Both sides must be simplified.
    pub fn is_subset_of(&self, other: &NumericSet) -> bool {
        if other.real {
            return true;
        }
        if self.real {
            return false;
        }
        if !self.fractions.iter().all(|f| other.fractions.contains(f)) {
            return false;
        }
        if other.integer {
            return true;
        }
        if self.integer {
            return false;
        }
        if self.natural && !other.natural {
            return false;
        }
        if self.pos && !(other.natural || other.pos) {
            return false;
        }
        if self.neg && !other.neg {
            return false;
        }
        self.intervals
            .iter()
            .all(|(lo, hi)| other.accepts_range(lo, hi))
    }

    pub fn intersect(&self, other: &NumericSet) -> NumericSet {
        if self.real {
            return other.clone();
        }
        if other.real {
            return self.clone();
        }

        let mut out = NumericSet {
            fractions: self
                .fractions
                .intersection(&other.fractions)
                .cloned()
                .collect(),
            ..NumericSet::default()
        };

        if self.integer || other.integer {
            let narrower = if self.integer { other } else { self };
            out.integer = narrower.integer;
            out.natural = narrower.natural;
            out.pos = narrower.pos;
            out.neg = narrower.neg;
            out.intervals = narrower.intervals.clone();
            out.simplify();
            return out;
        }

        out.natural = self.natural && other.natural;
        out.pos = (self.pos && (other.pos || other.natural)) || (other.pos && self.natural);
        out.neg = self.neg && other.neg;

        out.intervals = self.intervals.intersect(&other.intervals);
        let clipped_other = other.clip_to_sorts(&self.intervals);
        let clipped_self = self.clip_to_sorts(&other.intervals);
        out.intervals.add_all(&clipped_other);
        out.intervals.add_all(&clipped_self);
        out.simplify();
        out
    }

    fn clip_to_sorts(&self, intervals: &Intervals) -> Intervals {
        let mut out = Intervals::new();
        let zero = BigInt::zero();
        let one = BigInt::one();
        let minus_one = -BigInt::one();
        if self.natural {
            out.add_all(&intervals.clipped(Some(&zero), None));
        } else if self.pos {
            out.add_all(&intervals.clipped(Some(&one), None));
        }
        if self.neg {
            out.add_all(&intervals.clipped(None, Some(&minus_one)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lo: i64, hi: i64) -> NumericSet {
        let mut set = NumericSet::new();
        set.add_range(BigInt::from(lo), BigInt::from(hi));
        set
    }

    fn sort(kind: BaseSortKind) -> NumericSet {
        let mut set = NumericSet::new();
        set.add_sort(kind);
        set
    }

    #[test]
    fn pos_integer_and_zero_is_natural() {
        let mut set = sort(BaseSortKind::PosInteger);
        set.add_constant(&BigRational::zero());
        set.simplify();
        assert_eq!(set, sort(BaseSortKind::Natural));
    }

    #[test]
    fn natural_and_neg_integer_is_integer() {
        let mut set = sort(BaseSortKind::Natural);
        set.add_sort(BaseSortKind::NegInteger);
        set.add_range(BigInt::from(-3), BigInt::from(3));
        set.simplify();
        assert_eq!(set, sort(BaseSortKind::Integer));
    }

    #[test]
    fn sorts_trim_covered_intervals() {
        let mut set = sort(BaseSortKind::PosInteger);
        set.add_range(BigInt::from(-5), BigInt::from(-1));
        set.add_range(BigInt::from(3), BigInt::from(5));
        set.simplify();
        assert!(set.pos && !set.natural);
        assert_eq!(set.intervals, Intervals::single(BigInt::from(-5), BigInt::from(-1)));
    }

    #[test]
    fn pos_integer_over_a_range_with_zero_widens_to_natural() {
        let mut set = sort(BaseSortKind::PosInteger);
        set.add_range(BigInt::from(-5), BigInt::from(5));
        set.simplify();
        assert!(set.natural && !set.pos);
        assert_eq!(set.intervals, Intervals::single(BigInt::from(-5), BigInt::from(-1)));
    }

    #[test]
    fn intersect_sorts_with_intervals() {
        let mut a = sort(BaseSortKind::Natural);
        a.simplify();
        let b = range(-5, 5);
        let got = a.intersect(&b);
        assert_eq!(got, range(0, 5));
        assert_eq!(got, b.intersect(&a));

        let neg = sort(BaseSortKind::NegInteger);
        assert!(a.intersect(&neg).is_empty());
        let pos = sort(BaseSortKind::PosInteger);
        assert_eq!(a.intersect(&pos), pos);
    }

    #[test]
    fn accepts_range_mixes_sorts_and_intervals() {
        let mut set = sort(BaseSortKind::NegInteger);
        set.add_range(BigInt::from(0), BigInt::from(10));
        set.simplify();
        assert!(set.accepts_range(&BigInt::from(-5), &BigInt::from(5)));
        assert!(!set.accepts_range(&BigInt::from(-5), &BigInt::from(11)));
    }
}
