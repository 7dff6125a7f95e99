use std::fs;
use std::path::Path;

use tempfile::tempdir;
use termcore::config::{
    CONFIG_TEMPLATE, DEFAULT_CONFIG_FILENAME, load_module, parse_config, resolve_config,
};
use termcore::diagnostics::Span;
use termcore::{DeclKind, DiagCode, Diagnostic, EngineConfig, LoadError, OutputFormat};

#[test]
fn template_parses_to_defaults() {
    let config = parse_config(CONFIG_TEMPLATE, Path::new("termcore.toml")).expect("template");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn engine_and_output_sections_are_read() {
    let body = r#"
version = 1

[engine]
cache_intersections = false

[output]
format = "json"
"#;
    let config = parse_config(body, Path::new("x.toml")).expect("valid config");
    assert!(!config.engine.cache_intersections);
    assert_eq!(config.format, OutputFormat::Json);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let config = parse_config("version = 1\n", Path::new("x.toml")).expect("valid config");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn bad_version_and_format_are_rejected() {
    let err = parse_config("version = 2\n", Path::new("x.toml")).expect_err("bad version");
    assert!(matches!(err, LoadError::InvalidConfig(_)));
    assert!(err.to_string().contains("version must be 1"));

    let body = "version = 1\n[output]\nformat = \"yaml\"\n";
    let err = parse_config(body, Path::new("x.toml")).expect_err("bad format");
    assert!(err.to_string().contains("yaml"));

    let err = parse_config("version = \n", Path::new("x.toml")).expect_err("bad toml");
    assert!(matches!(err, LoadError::Toml { .. }));
}

#[test]
fn config_is_discovered_next_to_the_input() {
    let dir = tempdir().expect("tempdir");
    assert_eq!(
        resolve_config(None, dir.path()).expect("defaults"),
        EngineConfig::default()
    );

    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILENAME),
        "version = 1\n[engine]\ncache_intersections = false\n",
    )
    .expect("write config");
    let found = resolve_config(None, dir.path()).expect("discovered");
    assert!(!found.engine.cache_intersections);

    let missing = dir.path().join("nope.toml");
    let err = resolve_config(Some(&missing), dir.path()).expect_err("explicit path must exist");
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn modules_load_from_json() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("m.json");
    fs::write(
        &path,
        r#"{
  "name": "shapes",
  "decls": [
    { "name": "Point", "decl": "constructor", "args": [
      { "kind": "id", "name": "Integer" },
      { "kind": "id", "name": "Integer" }
    ] },
    { "name": "ORIGIN", "decl": "constant" }
  ]
}"#,
    )
    .expect("write module");
    let module = load_module(&path).expect("module parses");
    assert_eq!(module.name, "shapes");
    assert_eq!(module.decls.len(), 2);
    assert!(matches!(module.decls[0].kind, DeclKind::Constructor { .. }));

    fs::write(&path, "{ not json").expect("write module");
    assert!(matches!(load_module(&path), Err(LoadError::Module { .. })));
}

#[test]
fn diagnostics_render_code_location_and_hint() {
    let span = Span {
        start: 3,
        end: 4,
        line: 2,
        column: 2,
        file_id: None,
    };
    let diag = Diagnostic::no_members("Empty", Some(span)).with_source("types.json");
    assert_eq!(
        diag.to_string(),
        "types.json: error[105] E-NO-MEMBERS: type has no members: Empty at 2:2 \
         (hint: a type must contain at least one value)"
    );

    let cancelled = Diagnostic::cancelled(None);
    assert_eq!(cancelled.code, DiagCode::Cancelled);
    assert_eq!(
        cancelled.to_string(),
        "error[106] E-CANCELLED: canonization was cancelled"
    );
}

#[test]
fn diagnostics_serialize_with_snake_case_codes() {
    let diag = Diagnostic::undefined_symbol("Missing", None);
    let json = serde_json::to_value(&diag).expect("serializes");
    assert_eq!(json["code"], "undefined_symbol");
    assert!(json["span"].is_null());
    assert_eq!(json["message"], "undefined symbol: Missing");
}

#[test]
fn log_format_defaults_to_text() {
    use termcore::tracing_config::LogFormat;
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    assert_eq!(LogFormat::parse(""), LogFormat::Text);
    assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
}
