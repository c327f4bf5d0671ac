//! Integration tests for the structure parsers.
//!
//! These tests validate extraction against the fixtures in `testdata/`.

use std::path::PathBuf;

use codedoc::{
    parse_path, ComplexityAnalyzer, Dialect, Error, JsParser, Language, Module, PythonParser,
    StructureParser,
};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn parse_fixture(name: &str) -> Module {
    parse_path(&testdata_path().join(name)).expect("fixture should parse")
}

// =============================================================================
// Python Parser Tests
// =============================================================================

#[test]
fn test_python_module_overview() {
    let module = parse_fixture("sample.py");

    assert_eq!(module.language, Language::Python);
    assert_eq!(module.line_count, 43);
    assert_eq!(
        module.docstring.as_deref(),
        Some("Inventory helpers.\n\nUsed by the warehouse service.")
    );

    let functions: Vec<_> = module.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(functions, vec!["load", "sync"], "nested _pick must not be promoted");
    assert_eq!(module.classes.len(), 1);
}

#[test]
fn test_python_imports() {
    let module = parse_fixture("sample.py");
    let imports = &module.imports;
    assert_eq!(imports.len(), 4);

    assert_eq!(imports[0].module, "os");
    assert_eq!(imports[0].line_number, 6);
    assert_eq!(imports[1].module, "json");
    assert_eq!(imports[1].alias.as_deref(), Some("j"));

    assert_eq!(imports[2].module, "typing");
    assert_eq!(imports[2].names, vec!["List", "Optional"]);
    assert!(imports[2].is_selective_import);

    assert_eq!(imports[3].module, ".models");
    assert_eq!(imports[3].names, vec!["Item"]);
}

#[test]
fn test_python_function_details() {
    let module = parse_fixture("sample.py");

    let load = module.function("load").expect("load should exist");
    assert_eq!(load.line_number, 12);
    assert_eq!(load.end_line_number, 19);
    assert_eq!(load.return_type.as_deref(), Some("dict"));
    assert_eq!(load.docstring.as_deref(), Some("Load an inventory file."));
    assert_eq!(load.parameters[1].name, "strict");
    assert_eq!(load.parameters[1].type_hint.as_deref(), Some("bool"));
    assert_eq!(load.parameters[1].default_value.as_deref(), Some("False"));
    assert!(load.source.as_deref().unwrap().starts_with("def load("));

    let sync = module.function("sync").expect("sync should exist");
    assert!(sync.is_async);
    let params: Vec<_> = sync.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["sources", "timeout", "options"]);
    assert!(sync.parameters[0].is_variadic_positional);
    assert_eq!(sync.parameters[1].default_value.as_deref(), Some("30"));
    assert!(sync.parameters[2].is_variadic_keyword);
}

#[test]
fn test_python_class_details() {
    let module = parse_fixture("sample.py");
    let class = module.class("Inventory").expect("Inventory should exist");

    assert_eq!(class.base_classes, vec!["Base"]);
    assert_eq!(class.decorators, vec!["dataclass"]);
    assert_eq!(class.docstring.as_deref(), Some("A collection of items."));
    assert_eq!(class.line_number, 29);

    let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["__init__", "size", "find"]);

    let size = class.method("size").unwrap();
    assert!(size.has_decorator("property"));
    assert_eq!(size.line_number, 36);

    let init = class.method("__init__").unwrap();
    assert_eq!(init.parameters[1].type_hint.as_deref(), Some("Optional[List[str]]"));
    assert_eq!(init.parameters[1].default_value.as_deref(), Some("None"));
}

#[test]
fn test_python_syntax_error_is_all_or_nothing() {
    let path = testdata_path().join("broken.py");
    let err = PythonParser::new().parse_file(&path).unwrap_err();

    match err {
        Error::SyntaxInvalid { path: reported, line } => {
            assert!(reported.ends_with("broken.py"));
            assert!(line >= 5, "error reported at line {line}");
        }
        other => panic!("expected SyntaxInvalid, got {other:?}"),
    }
}

#[test]
fn test_python_rejects_what_python3_rejects() {
    let cases = [
        ("def f(a=1, b):\n    pass\n", 1),
        ("print \"hi\"\n", 1),
        ("exec \"x = 1\"\n", 1),
        ("def g():\n    return\nclass C:\n  x = 1\n    y = 2\n", 5),
    ];

    for (source, expected_line) in cases {
        match PythonParser::new().parse_source(source, "bad.py") {
            Err(Error::SyntaxInvalid { path, line }) => {
                assert_eq!(path, "bad.py");
                assert_eq!(line, expected_line, "wrong line for {source:?}");
            }
            other => panic!("expected SyntaxInvalid for {source:?}, got {other:?}"),
        }

        let err = ComplexityAnalyzer::default()
            .analyze_source(source, "bad.py")
            .unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }), "{source:?}: {err:?}");
    }
}

#[test]
fn test_python_missing_file() {
    let err = PythonParser::new()
        .parse_file(&testdata_path().join("missing.py"))
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

// =============================================================================
// JavaScript Parser Tests
// =============================================================================

#[test]
fn test_javascript_functions_and_bindings() {
    let module = parse_fixture("sample.js");
    assert_eq!(module.language, Language::JavaScript);

    let names: Vec<_> = module.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["buildRouter", "mul", "handler"]);

    let router = module.function("buildRouter").unwrap();
    assert_eq!(
        router.docstring.as_deref(),
        Some("Build the application router.\n\n@param {string} prefix mount point")
    );
    assert_eq!(router.parameters[0].default_value.as_deref(), Some("\"/api\""));
    assert!(router.parameters[1].is_variadic_positional);
    assert_eq!(router.parameters[1].name, "middleware");

    let mul = module.function("mul").unwrap();
    assert_eq!(mul.parameters.len(), 2);
    assert!(!mul.is_async);
    assert_eq!(mul.line_number, 13);

    let handler = module.function("handler").unwrap();
    assert!(handler.is_async);
    assert_eq!(handler.line_number, 15);
    assert_eq!(handler.end_line_number, 17);
}

#[test]
fn test_javascript_imports() {
    let module = parse_fixture("sample.js");
    assert_eq!(module.imports.len(), 2);

    assert_eq!(module.imports[0].module, "express");
    assert_eq!(module.imports[0].names, vec!["express", "Router"]);
    assert!(module.imports[0].is_selective_import);

    assert_eq!(module.imports[1].module, "path");
    assert_eq!(module.imports[1].alias.as_deref(), Some("path"));
}

#[test]
fn test_javascript_class_accessors() {
    let module = parse_fixture("sample.js");
    let class = module.class("StaticServer").expect("StaticServer should exist");

    assert_eq!(class.base_classes, vec!["BaseServer"]);
    assert_eq!(class.docstring.as_deref(), Some("Serves static files."));
    assert_eq!(class.methods.len(), 4);

    assert_eq!(class.methods[0].name, "constructor");
    assert!(class.methods[0].decorators.is_empty());
    assert_eq!(class.methods[1].decorators, vec!["getter"]);
    assert_eq!(class.methods[2].decorators, vec!["setter"]);
    assert_eq!(class.methods[3].decorators, vec!["static"]);
}

// =============================================================================
// TypeScript Parser Tests
// =============================================================================

#[test]
fn test_typescript_class() {
    let module = parse_fixture("sample.ts");
    assert_eq!(module.language, Language::TypeScript);

    let service = module.class("UserService").expect("UserService should exist");
    assert_eq!(service.base_classes, vec!["ApiClient"]);
    assert_eq!(service.decorators, vec!["Injectable()"]);
    assert_eq!(service.docstring.as_deref(), Some("Fetches users from the backend."));

    let ctor = service.method("constructor").unwrap();
    assert_eq!(ctor.parameters[0].name, "http");
    assert_eq!(ctor.parameters[0].type_hint.as_deref(), Some("HttpClient"));

    let find = service.method("find").unwrap();
    assert!(find.is_async);
    assert_eq!(find.return_type.as_deref(), Some("Promise<User | null>"));
    assert_eq!(find.parameters[1].name, "includeDeleted");
    assert_eq!(find.parameters[1].type_hint.as_deref(), Some("boolean"));

    assert_eq!(
        service.method("ngOnDestroy").unwrap().return_type.as_deref(),
        Some("void")
    );
}

#[test]
fn test_typescript_functions() {
    let module = parse_fixture("sample.ts");

    let sum = module.function("sum").unwrap();
    assert_eq!(sum.return_type.as_deref(), Some("number"));
    assert_eq!(sum.parameters[0].name, "values");
    assert_eq!(sum.parameters[0].type_hint.as_deref(), Some("number[]"));
    assert!(sum.parameters[0].is_variadic_positional);

    let greet = module.function("greet").unwrap();
    assert_eq!(greet.return_type.as_deref(), Some("string"));
    assert_eq!(greet.parameters[0].name, "name");
    assert_eq!(greet.parameters[0].type_hint.as_deref(), Some("string"));
    assert_eq!(greet.parameters[0].default_value.as_deref(), Some("\"world\""));
}

#[test]
fn test_dialect_override_for_source_strings() {
    let source = "function id<T>(value: T): T { return value; }\n";

    let typed = JsParser::new(Dialect::TypeScript)
        .parse_source(source, "<memory>")
        .unwrap();
    assert_eq!(typed.language, Language::TypeScript);
    assert_eq!(typed.functions[0].return_type.as_deref(), Some("T"));

    // the untyped grammar cannot read annotations; extraction degrades
    // instead of failing
    let untyped = JsParser::new(Dialect::JavaScript).parse_source(source, "<memory>");
    assert!(untyped.is_ok());
}

#[test]
fn test_javascript_missing_file() {
    let err = JsParser::default()
        .parse_file(&testdata_path().join("missing.js"))
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}
