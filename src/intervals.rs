use std::fmt;

use num_bigint::BigInt;
use num_traits::One;

/// A set of integers kept as sorted, disjoint and non-adjacent closed intervals.
///
/// Two sets are equal iff their interval lists are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Intervals {
    items: Vec<(BigInt, BigInt)>,
}

impl Intervals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(lo: BigInt, hi: BigInt) -> Self {
        let mut out = Self::new();
        out.add(lo, hi);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BigInt, &BigInt)> {
        self.items.iter().map(|(lo, hi)| (lo, hi))
    }

    pub fn add(&mut self, lo: BigInt, hi: BigInt) {
        let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let mut merged = Vec::with_capacity(self.items.len() + 1);
        let mut placed = false;
        for (a, b) in self.items.drain(..) {
            if &b + BigInt::one() < lo {
                merged.push((a, b));
            } else if &hi + BigInt::one() < a {
                if !placed {
                    merged.push((lo.clone(), hi.clone()));
                    placed = true;
                }
                merged.push((a, b));
            } else {
                if a < lo {
                    lo = a;
                }
                if b > hi {
                    hi = b;
                }
            }
        }
        if !placed {
            merged.push((lo, hi));
        }
        self.items = merged;
    }

    pub fn add_all(&mut self, other: &Intervals) {
        for (lo, hi) in &other.items {
            self.add(lo.clone(), hi.clone());
        }
    }

    pub fn contains_point(&self, value: &BigInt) -> bool {
        self.items
            .binary_search_by(|(lo, hi)| {
                if hi < value {
                    std::cmp::Ordering::Less
                } else if lo > value {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn remove(&mut self, lo: &BigInt, hi: &BigInt) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let mut kept = Vec::with_capacity(self.items.len() + 1);
        for (a, b) in self.items.drain(..) {
            if &b < lo || &a > hi {
                kept.push((a, b));
                continue;
            }
            if &a < lo {
                kept.push((a.clone(), lo - BigInt::one()));
            }
            if &b > hi {
                kept.push((hi + BigInt::one(), b));
            }
        }
        self.items = kept;
    }

    pub fn remove_at_least(&mut self, lo: &BigInt) {
        self.clip(None, Some(&(lo - BigInt::one())));
    }

    pub fn remove_at_most(&mut self, hi: &BigInt) {
        self.clip(Some(&(hi + BigInt::one())), None);
    }

    pub fn clip(&mut self, lower: Option<&BigInt>, upper: Option<&BigInt>) {
        let mut kept = Vec::with_capacity(self.items.len());
        for (mut a, mut b) in self.items.drain(..) {
            if let Some(lower) = lower {
                if &b < lower {
                    continue;
                }
                if &a < lower {
                    a = lower.clone();
                }
            }
            if let Some(upper) = upper {
                if &a > upper {
                    continue;
                }
                if &b > upper {
                    b = upper.clone();
                }
            }
            kept.push((a, b));
        }
        self.items = kept;
    }

    pub fn clipped(&self, lower: Option<&BigInt>, upper: Option<&BigInt>) -> Intervals {
        let mut out = self.clone();
        out.clip(lower, upper);
        out
    }

    pub fn intersect(&self, other: &Intervals) -> Intervals {
        let mut out = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.items.len() && j < other.items.len() {
            let (a1, b1) = &self.items[i];
            let (a2, b2) = &other.items[j];
            let lo = if a1 > a2 { a1 } else { a2 };
            let hi = if b1 < b2 { b1 } else { b2 };
            if lo <= hi {
                out.push((lo.clone(), hi.clone()));
            }
            if b1 < b2 {
                i += 1;
            } else {
                j += 1;
            }
        }
        Intervals { items: out }
    }
}

impl fmt::Display for Intervals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (lo, hi)) in self.items.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            if lo == hi {
                write!(f, "{lo}")?;
            } else {
                write!(f, "{lo}..{hi}")?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ivs(items: &[(i64, i64)]) -> Intervals {
        let mut out = Intervals::new();
        for (lo, hi) in items {
            out.add(BigInt::from(*lo), BigInt::from(*hi));
        }
        out
    }

    fn pairs(set: &Intervals) -> Vec<(i64, i64)> {
        set.iter()
            .map(|(lo, hi)| {
                (
                    i64::try_from(lo).expect("small"),
                    i64::try_from(hi).expect("small"),
                )
            })
            .collect()
    }

    #[test]
    fn add_merges_overlapping_and_adjacent() {
        let set = ivs(&[(1, 3), (4, 5), (10, 12), (2, 2)]);
        assert_eq!(pairs(&set), vec![(1, 5), (10, 12)]);
        let set = ivs(&[(10, 12), (0, 20)]);
        assert_eq!(pairs(&set), vec![(0, 20)]);
    }

    #[test]
    fn add_normalises_reversed_bounds() {
        assert_eq!(pairs(&ivs(&[(5, 1)])), vec![(1, 5)]);
    }

    #[test]
    fn remove_splits_intervals() {
        let mut set = ivs(&[(0, 10)]);
        set.remove(&BigInt::from(3), &BigInt::from(4));
        assert_eq!(pairs(&set), vec![(0, 2), (5, 10)]);
        set.remove_at_least(&BigInt::from(8));
        assert_eq!(pairs(&set), vec![(0, 2), (5, 7)]);
        set.remove_at_most(&BigInt::from(0));
        assert_eq!(pairs(&set), vec![(1, 2), (5, 7)]);
    }

    #[test]
    fn intersect_is_a_linear_merge() {
        let a = ivs(&[(0, 5), (10, 20), (30, 40)]);
        let b = ivs(&[(3, 12), (18, 35)]);
        assert_eq!(pairs(&a.intersect(&b)), vec![(3, 5), (10, 12), (18, 20), (30, 35)]);
        assert_eq!(a.intersect(&b), b.intersect(&a));
        assert!(a.intersect(&Intervals::new()).is_empty());
    }

    #[test]
    fn point_queries() {
        let set = ivs(&[(0, 10), (20, 30)]);
        assert!(set.contains_point(&BigInt::from(20)));
        assert!(!set.contains_point(&BigInt::from(15)));
    }
}
