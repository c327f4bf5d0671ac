//! Integration tests for the dictionary form of the structure model.

use serde_json::{json, Value};

use codedoc::{
    Class, DependencyGraph, DictRepr, Error, Function, Import, Language, Module, Parameter,
    PythonParser, StructureParser,
};

fn roundtrip<T: DictRepr + PartialEq + std::fmt::Debug>(value: &T) {
    let dict = value.to_dict();
    let restored = T::from_dict(&dict).expect("dictionary form should deserialize");
    assert_eq!(&restored, value);
}

fn full_function() -> Function {
    Function {
        name: "fetch".to_string(),
        parameters: vec![
            Parameter {
                name: "url".to_string(),
                type_hint: Some("str".to_string()),
                default_value: None,
                ..Parameter::default()
            },
            Parameter {
                name: "args".to_string(),
                is_variadic_positional: true,
                ..Parameter::default()
            },
            Parameter {
                name: "kwargs".to_string(),
                is_variadic_keyword: true,
                ..Parameter::default()
            },
        ],
        return_type: Some("bytes".to_string()),
        docstring: Some("Fetch a URL.\n\nRetries twice.".to_string()),
        decorators: vec!["retry(times=2)".to_string()],
        is_async: true,
        line_number: 10,
        end_line_number: 24,
        complexity: Some(3),
        source: Some("async def fetch(url: str, *args, **kwargs) -> bytes:\n    ...".to_string()),
    }
}

fn full_module() -> Module {
    let mut class = Class::new("Client");
    class.base_classes = vec!["Base".to_string(), "Mixin".to_string()];
    class.methods = vec![full_function()];
    class.docstring = Some("HTTP client.".to_string());
    class.decorators = vec!["dataclass".to_string()];
    class.line_number = 5;
    class.end_line_number = 30;
    class.source = Some("class Client(Base, Mixin): ...".to_string());

    let mut import = Import::new("typing");
    import.names = vec!["List".to_string(), "Dict".to_string()];
    import.is_selective_import = true;
    import.line_number = 1;

    let mut aliased = Import::new("numpy");
    aliased.alias = Some("np".to_string());
    aliased.line_number = 2;

    Module {
        file_path: "pkg/client.py".to_string(),
        language: Language::Python,
        docstring: Some("Client module.".to_string()),
        functions: vec![full_function()],
        classes: vec![class],
        imports: vec![import, aliased],
        line_count: 30,
    }
}

#[test]
fn test_minimal_entities_roundtrip() {
    roundtrip(&Parameter::named("x"));
    roundtrip(&Function::new("f"));
    roundtrip(&Class::new("C"));
    roundtrip(&Import::new("os"));
    roundtrip(&Module::new("a.js", Language::JavaScript));
}

#[test]
fn test_full_entities_roundtrip() {
    roundtrip(&full_function());
    roundtrip(&full_module());

    let mut ts = full_module();
    ts.language = Language::TypeScript;
    roundtrip(&ts);
}

#[test]
fn test_parsed_module_roundtrip() {
    let source = "\"\"\"Doc.\"\"\"\nfrom a import b\n\n@dec(1)\ndef f(x: int = 0, *rest, **kw) -> None:\n    pass\n\nclass K(Base):\n    def m(self):\n        return 1\n";
    let module = PythonParser::new().parse_source(source, "k.py").unwrap();
    roundtrip(&module);
}

#[test]
fn test_dict_shape() {
    let dict = full_module().to_dict();

    assert_eq!(dict["language"], "python");
    assert_eq!(dict["functions"][0]["parameters"][1]["is_variadic_positional"], true);
    assert_eq!(dict["classes"][0]["methods"][0]["complexity"], 3);
    assert_eq!(dict["imports"][1]["alias"], "np");
    assert_eq!(dict["imports"][1]["names"], json!([]));
    assert!(dict["classes"][0]["methods"][0]["return_type"].is_string());
}

#[test]
fn test_missing_optional_fields_default() {
    let module = Module::from_dict(&json!({ "file_path": "legacy.py" })).unwrap();
    assert_eq!(module.language, Language::Python);
    assert!(module.functions.is_empty());
    assert_eq!(module.line_count, 0);

    let func = Function::from_dict(&json!({ "name": "f", "complexity": null })).unwrap();
    assert_eq!(func, Function::new("f"));
}

fn without(mut dict: Value, field: &str) -> Value {
    dict.as_object_mut().unwrap().remove(field);
    dict
}

fn assert_missing(err: Error, field: &str) {
    assert!(
        matches!(&err, Error::MissingField(f) if f == field),
        "expected MissingField({field}), got {err:?}"
    );
}

#[test]
fn test_missing_required_fields() {
    let param = without(Parameter::named("x").to_dict(), "name");
    assert_missing(Parameter::from_dict(&param).unwrap_err(), "name");

    let func = without(Function::new("f").to_dict(), "name");
    assert_missing(Function::from_dict(&func).unwrap_err(), "name");

    let class = without(Class::new("C").to_dict(), "name");
    assert_missing(Class::from_dict(&class).unwrap_err(), "name");

    let import = without(Import::new("os").to_dict(), "module");
    assert_missing(Import::from_dict(&import).unwrap_err(), "module");

    let module = without(Module::new("a.py", Language::Python).to_dict(), "file_path");
    assert_missing(Module::from_dict(&module).unwrap_err(), "file_path");
}

#[test]
fn test_unknown_language_rejected() {
    let err = Module::from_dict(&json!({ "file_path": "a.rb", "language": "ruby" })).unwrap_err();
    assert!(matches!(err, Error::UnknownLanguage(tag) if tag == "ruby"));
}

#[test]
fn test_legacy_flag_names() {
    let param = Parameter::from_dict(&json!({ "name": "a", "is_args": true })).unwrap();
    assert!(param.is_variadic_positional);

    let param = Parameter::from_dict(&json!({ "name": "k", "is_kwargs": true })).unwrap();
    assert!(param.is_variadic_keyword);

    let import = Import::from_dict(&json!({ "module": "x", "is_from_import": true })).unwrap();
    assert!(import.is_selective_import);
}

#[test]
fn test_graph_roundtrip_keeps_duplicate_edges() {
    let mut module = Module::new("app.py", Language::Python);
    module.imports.push(Import::new("os"));

    let mut graph = DependencyGraph::new();
    graph.record_module(module);
    graph.add_import_edge("app.py", "os");
    graph.add_call_edge("app.main", "os.getenv");

    let dict = graph.to_dict();
    assert_eq!(dict["import_edges"], json!([["app.py", "os"], ["app.py", "os"]]));
    assert_eq!(dict["call_edges"], json!([["app.main", "os.getenv"]]));

    let restored = DependencyGraph::from_dict(&dict).unwrap();
    assert_eq!(restored, graph);
    assert_eq!(restored.import_edges.len(), 2);
}

#[test]
fn test_graph_survives_json_text() {
    let mut graph = DependencyGraph::new();
    graph.add_module(full_module());
    graph.add_import_edge("pkg/client.py", "typing");
    graph.add_call_edge("Client.fetch", "retry");

    let text = serde_json::to_string(&graph.to_dict()).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(DependencyGraph::from_dict(&value).unwrap(), graph);
}
