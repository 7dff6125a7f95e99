mod support;

use support::{compile, id, sample_index, sample_module, sort, sym, ty};
use termcore::{BaseSortKind, SubtermMatcher, TypeDecl};

#[test]
fn integers_are_reachable_inside_lists() {
    let index = sample_index();
    let matcher = SubtermMatcher::new(
        &index,
        false,
        &[ty(&index, "List"), sort(&index, BaseSortKind::Integer)],
    );
    assert!(matcher.is_satisfiable());
    assert_eq!(matcher.num_levels(), 2);
    assert_eq!(matcher.level(0).leaves(), &[ty(&index, "Cons")]);
    assert_eq!(matcher.level(1).leaves(), &[sort(&index, BaseSortKind::Integer)]);

    let cons = sym(&index, "Cons");
    let pair = sym(&index, "Pair");
    assert!(matcher.is_trigger(1, &cons, 0));
    assert!(matcher.is_trigger(1, &cons, 1));
    assert!(matcher.is_trigger(1, &pair, 0));
    assert!(!matcher.is_trigger(1, &pair, 1));
    assert!(matcher.can_match(&index, 1, index.one()));
    assert!(!matcher.can_match(&index, 1, &index.mk_cnst("a")));
}

#[test]
fn strings_only_reach_pairs() {
    let index = sample_index();
    let matcher = SubtermMatcher::new(
        &index,
        false,
        &[index.any_type().clone(), sort(&index, BaseSortKind::String)],
    );
    assert!(matcher.is_satisfiable());
    assert_eq!(matcher.level(0).leaves(), &[ty(&index, "Pair")]);
    let triggers: Vec<_> = matcher.level(1).triggers().collect();
    assert_eq!(triggers, vec![(&sym(&index, "Pair"), 1)]);
}

#[test]
fn unreachable_chain_is_unsatisfiable() {
    let index = sample_index();
    let matcher = SubtermMatcher::new(
        &index,
        false,
        &[ty(&index, "Color"), sort(&index, BaseSortKind::Integer)],
    );
    assert!(!matcher.is_satisfiable());
    assert!(matcher.level(0).leaves().is_empty());
    assert!(!matcher.can_match(&index, 0, &ty(&index, "Color")));
}

#[test]
fn single_level_matches_its_own_type() {
    let index = sample_index();
    let matcher = SubtermMatcher::new(&index, false, &[ty(&index, "Color")]);
    assert!(matcher.is_satisfiable());
    assert_eq!(matcher.level(0).leaves().len(), 3);
    assert_eq!(matcher.level(0).triggers().count(), 0);
}

#[test]
fn derived_kinds_are_skipped_on_request() {
    let module = sample_module()
        .with_decl(TypeDecl::derived_constructor("Seen", vec![id("Integer")]))
        .with_decl(TypeDecl::derived_constant("DONE"));
    let index = compile(&module);
    let outer = index.mk_type_union(&[ty(&index, "Seen"), ty(&index, "Pair")]);
    let inner = sort(&index, BaseSortKind::Integer);

    let all = SubtermMatcher::new(&index, false, &[outer.clone(), inner.clone()]);
    assert_eq!(all.level(0).leaves().len(), 2);
    assert!(all.is_trigger(1, &sym(&index, "Seen"), 0));

    let fresh = SubtermMatcher::new(&index, true, &[outer, inner]);
    assert!(fresh.only_new_kinds());
    assert_eq!(fresh.level(0).leaves(), &[ty(&index, "Pair")]);
    assert!(!fresh.is_trigger(1, &sym(&index, "Seen"), 0));

    let derived_only = SubtermMatcher::new(
        &index,
        true,
        &[index.mk_type_union(&[ty(&index, "Seen"), ty(&index, "DONE")])],
    );
    assert!(!derived_only.is_satisfiable());
}
