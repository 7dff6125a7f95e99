mod support;

use support::{id, ints};
use termcore::report::render_text;
use termcore::{CancelToken, EngineConfig, Module, TypeDecl, build_report, compile_module};

#[test]
fn maps_render_domain_and_codomain() {
    let module = Module::new("tables")
        .with_decl(TypeDecl::map(
            "Lookup",
            vec![id("String"), id("Natural")],
            vec![id("Integer")],
        ))
        .with_decl(TypeDecl::constructor("Point", vec![id("Integer"), id("Integer")]))
        .with_decl(TypeDecl::union("Small", ints(0, 3)));
    let index =
        compile_module(&module, &EngineConfig::default(), &CancelToken::new()).expect("compiles");
    let report = build_report(&index, &module);

    let lookup = &report.types[0];
    assert_eq!(lookup.kind, "map");
    assert_eq!(lookup.canonical, "Lookup(String, Natural -> Integer)");
    assert_eq!(lookup.arguments, vec!["String", "Natural", "Integer"]);

    let point = &report.types[1];
    assert_eq!(point.kind, "constructor");
    assert_eq!(point.canonical, "Point(Integer, Integer)");

    let text = render_text(&report);
    assert!(text.contains("  map Lookup ::= Lookup(String, Natural -> Integer)"));
    assert!(text.contains("  union Small ::= 0..3"));
}
