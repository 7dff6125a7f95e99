mod support;

use num_rational::BigRational;
use proptest::prelude::*;
use support::{app, sample_index, sort, ty, uncached_sample_index};
use termcore::{BaseSortKind, Term, TermIndex};

const NUMERIC_SORTS: [BaseSortKind; 4] = [
    BaseSortKind::Integer,
    BaseSortKind::Natural,
    BaseSortKind::PosInteger,
    BaseSortKind::NegInteger,
];

#[derive(Debug, Clone)]
enum Head {
    Range(i64, i64),
    Sort(BaseSortKind),
}

#[derive(Debug, Clone)]
enum Tail {
    Nil,
    List,
    Cons(Head),
}

#[derive(Debug, Clone)]
enum Second {
    Str(&'static str),
    Strings,
}

#[derive(Debug, Clone)]
enum Part {
    Range(i64, i64),
    Str(&'static str),
    Sort(BaseSortKind),
    Named(&'static str),
    Half,
    Cons(Head, Tail),
    Pair(Head, Second),
}

#[derive(Debug, Clone)]
enum Value {
    Int(i64),
    Str(&'static str),
    Named(&'static str),
    Half,
    List(Vec<i64>),
    Pair(i64, &'static str),
}

fn head() -> impl Strategy<Value = Head> {
    prop_oneof![
        (-4i64..4, 0i64..4).prop_map(|(lo, len)| Head::Range(lo, lo + len)),
        prop::sample::select(NUMERIC_SORTS.to_vec()).prop_map(Head::Sort),
    ]
}

fn tail() -> impl Strategy<Value = Tail> {
    prop_oneof![
        Just(Tail::Nil),
        Just(Tail::List),
        head().prop_map(Tail::Cons),
    ]
}

fn second() -> impl Strategy<Value = Second> {
    prop_oneof![
        prop::sample::select(vec!["a", "b"]).prop_map(Second::Str),
        Just(Second::Strings),
    ]
}

fn part() -> impl Strategy<Value = Part> {
    prop_oneof![
        (-6i64..6, 1i64..5).prop_map(|(lo, len)| Part::Range(lo, lo + len)),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(Part::Str),
        prop::sample::select(BaseSortKind::ALL.to_vec()).prop_map(Part::Sort),
        prop::sample::select(vec!["Color", "List", "Cons", "Pair", "RED", "NIL"])
            .prop_map(Part::Named),
        Just(Part::Half),
        (head(), tail()).prop_map(|(h, t)| Part::Cons(h, t)),
        (head(), second()).prop_map(|(h, s)| Part::Pair(h, s)),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-8i64..8).prop_map(Value::Int),
        prop::sample::select(vec!["a", "b", "d"]).prop_map(Value::Str),
        prop::sample::select(vec!["RED", "BLUE", "NIL", "TRUE"]).prop_map(Value::Named),
        Just(Value::Half),
        prop::collection::vec(-6i64..6, 0..3).prop_map(Value::List),
        (-6i64..6, prop::sample::select(vec!["a", "c"])).prop_map(|(n, s)| Value::Pair(n, s)),
    ]
}

fn half(index: &TermIndex) -> Term {
    index.mk_cnst(BigRational::new(1.into(), 2.into()))
}

fn build_head(index: &TermIndex, h: &Head) -> Term {
    match h {
        Head::Range(lo, hi) => index.mk_range(*lo, *hi),
        Head::Sort(kind) => sort(index, *kind),
    }
}

fn build_part(index: &TermIndex, p: &Part) -> Term {
    match p {
        Part::Range(lo, hi) => index.mk_range(*lo, *hi),
        Part::Str(s) => index.mk_cnst(*s),
        Part::Sort(kind) => sort(index, *kind),
        Part::Named(name) => ty(index, name),
        Part::Half => half(index),
        Part::Cons(h, t) => {
            let nil = ty(index, "NIL");
            let rest = match t {
                Tail::Nil => nil,
                Tail::List => ty(index, "List"),
                Tail::Cons(inner) => app(index, "Cons", &[build_head(index, inner), nil]),
            };
            app(index, "Cons", &[build_head(index, h), rest])
        }
        Part::Pair(h, s) => {
            let second = match s {
                Second::Str(s) => index.mk_cnst(*s),
                Second::Strings => sort(index, BaseSortKind::String),
            };
            app(index, "Pair", &[build_head(index, h), second])
        }
    }
}

fn build(index: &TermIndex, parts: &[Part]) -> Term {
    let terms: Vec<Term> = parts.iter().map(|p| build_part(index, p)).collect();
    index.mk_type_union(&terms)
}

fn ground(index: &TermIndex, v: &Value) -> Term {
    match v {
        Value::Int(n) => index.mk_cnst(*n),
        Value::Str(s) => index.mk_cnst(*s),
        Value::Named(name) => ty(index, name),
        Value::Half => half(index),
        Value::List(items) => items.iter().rev().fold(ty(index, "NIL"), |rest, n| {
            app(index, "Cons", &[index.mk_cnst(*n), rest])
        }),
        Value::Pair(n, s) => app(index, "Pair", &[index.mk_cnst(*n), index.mk_cnst(*s)]),
    }
}

fn types() -> impl Strategy<Value = Vec<Part>> {
    prop::collection::vec(part(), 1..4)
}

proptest! {
    #[test]
    fn intersection_members_are_members_of_both(
        a in types(),
        b in types(),
        values in prop::collection::vec(value(), 1..8),
    ) {
        let index = sample_index();
        let (ta, tb) = (build(&index, &a), build(&index, &b));
        let meet = index.mk_intersection(&ta, &tb);
        for v in &values {
            let g = ground(&index, v);
            let expected = index.is_ground_member(&ta, &g) && index.is_ground_member(&tb, &g);
            let got = meet.as_ref().is_some_and(|t| index.is_ground_member(t, &g));
            prop_assert_eq!(got, expected, "{} in {:?}", g, meet);
        }
    }

    #[test]
    fn intersection_is_commutative(a in types(), b in types()) {
        let index = uncached_sample_index();
        let (ta, tb) = (build(&index, &a), build(&index, &b));
        prop_assert_eq!(index.mk_intersection(&ta, &tb), index.mk_intersection(&tb, &ta));
    }

    #[test]
    fn canonical_forms_are_fixed_points(a in types()) {
        let index = sample_index();
        let t = build(&index, &a);
        prop_assert_eq!(index.mk_canonical_form(&t), t.clone());
        prop_assert_eq!(index.mk_intersection(&t, &t), Some(t));
    }

    #[test]
    fn union_membership_is_any_component(a in types(), v in value()) {
        let index = sample_index();
        let t = build(&index, &a);
        let g = ground(&index, &v);
        let any = index
            .union_components(&t)
            .iter()
            .any(|c| index.is_ground_member(c, &g));
        prop_assert_eq!(index.is_ground_member(&t, &g), any);
    }

    #[test]
    fn widened_subtypes_keep_their_members(
        a in types(),
        b in types(),
        values in prop::collection::vec(value(), 1..8),
    ) {
        let index = sample_index();
        let ta = build(&index, &a);
        let wider = build(&index, &[a.clone(), b.clone()].concat());
        prop_assert!(index.is_subtype_widened(&ta, &wider));
        if let Some(meet) = index.mk_intersection(&ta, &build(&index, &b)) {
            prop_assert!(index.is_subtype_widened(&meet, &ta), "{} not within {}", meet, ta);
        }
        for v in &values {
            let g = ground(&index, v);
            if index.is_ground_member(&ta, &g) {
                prop_assert!(index.is_ground_member(&wider, &g), "{} escapes {}", g, wider);
            }
        }
    }

    #[test]
    fn interning_is_structural(lo in -50i64..50, len in 0i64..50) {
        let index = sample_index();
        let first = index.mk_range(lo, lo + len);
        let second = index.mk_range(lo, lo + len);
        prop_assert_eq!(first.uid(), second.uid());
        prop_assert!(first.is_type());
        prop_assert_eq!(index.mk_canonical_form(&first), first);
    }
}
