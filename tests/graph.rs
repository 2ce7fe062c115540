use std::fs;

use compile_modules::graph::{GraphAccumulator, GraphError, GRAPH_FILE_NAME};
use serde_json::json;

fn requires(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn disabled_accumulator_records_and_writes_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let mut accumulator = GraphAccumulator::new(false);

    accumulator.append_node("a", &requires(&["b"])).unwrap();

    assert!(accumulator.graph().is_none());
    assert_eq!(accumulator.flush(temp.path()).unwrap(), None);
    assert!(!temp.path().join(GRAPH_FILE_NAME).exists());
}

#[test]
fn flush_writes_every_node() {
    let temp = tempfile::tempdir().unwrap();
    let mut accumulator = GraphAccumulator::new(true);
    accumulator.append_node("a", &requires(&["b"])).unwrap();
    accumulator.append_node("b", &[]).unwrap();

    let path = accumulator.flush(temp.path()).unwrap().unwrap();

    assert_eq!(path, temp.path().join("graph.json"));
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written,
        json!({"a": {"requires": ["b"]}, "b": {"requires": []}})
    );
}

#[test]
fn requires_keep_declaration_order() {
    let mut accumulator = GraphAccumulator::new(true);
    accumulator
        .append_node("app", &requires(&["zlib", "assert", "models/user"]))
        .unwrap();

    let graph = accumulator.graph().unwrap();
    assert_eq!(
        graph.get("app").unwrap().requires,
        requires(&["zlib", "assert", "models/user"])
    );
}

#[test]
fn output_is_sorted_and_pretty() {
    let temp = tempfile::tempdir().unwrap();
    let mut accumulator = GraphAccumulator::new(true);
    accumulator.append_node("zeta", &[]).unwrap();
    accumulator.append_node("alpha", &requires(&["zeta"])).unwrap();

    let path = accumulator.flush(temp.path()).unwrap().unwrap();
    let text = fs::read_to_string(path).unwrap();

    assert!(text.find("\"alpha\"").unwrap() < text.find("\"zeta\": {").unwrap());
    assert!(text.contains('\n'));
    assert!(text.ends_with("}\n"));
}

#[test]
fn duplicate_module_name_is_rejected() {
    let mut accumulator = GraphAccumulator::new(true);
    accumulator.append_node("index", &[]).unwrap();

    let err = accumulator
        .append_node("index", &requires(&["other"]))
        .unwrap_err();

    assert!(matches!(err, GraphError::DuplicateModule { ref name } if name == "index"));
    assert!(accumulator.graph().unwrap().get("index").unwrap().requires.is_empty());
}

#[test]
fn flush_creates_the_destination() {
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("build/out");
    let accumulator = GraphAccumulator::new(true);
    assert!(accumulator.graph().unwrap().is_empty());

    let path = accumulator.flush(&destination).unwrap().unwrap();

    assert_eq!(fs::read_to_string(path).unwrap(), "{}\n");
}
