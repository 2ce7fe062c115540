mod common;

use std::{
    fs,
    path::{Path, PathBuf},
};

use compile_modules::graph::{GraphError, GRAPH_FILE_NAME};
use compile_modules::walker::count_files;
use compile_modules::{
    CompileOptions, CompileRequest, Error, OutputFormat, RunSummary, TreeCompilation,
};
use serde_json::json;

use common::{fake_compile, reject_value};

fn options(graph: bool) -> CompileOptions {
    CompileOptions {
        format: OutputFormat::Cjs,
        graph,
        ..CompileOptions::default()
    }
}

fn read_graph(destination: &Path) -> serde_json::Value {
    let text = fs::read_to_string(destination.join(GRAPH_FILE_NAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn output_files(destination: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut pending = vec![destination.to_owned()];
    while let Some(directory) = pending.pop() {
        for entry in fs::read_dir(directory).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path.strip_prefix(destination).unwrap().to_owned());
            }
        }
    }
    files.sort();
    files
}

#[test]
fn compiles_each_visible_file_once() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("out");

    let summary = TreeCompilation::new(&fake_compile, options(false), &out)
        .run(["test-data/scenario"])
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            files: 2,
            graph: None,
        }
    );
    assert_eq!(
        output_files(&out),
        vec![PathBuf::from("a.js"), PathBuf::from("b.js")]
    );
    assert!(!out.join(".hidden.js").exists());
    assert!(!out.join(GRAPH_FILE_NAME).exists());
}

#[test]
fn outputs_hold_the_compiled_code() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(false);

    TreeCompilation::new(&fake_compile, options.clone(), temp.path())
        .run(["test-data/scenario"])
        .unwrap();

    let source = fs::read_to_string("test-data/scenario/b.js").unwrap();
    let expected = fake_compile(CompileRequest {
        source: &source,
        module_name: None,
        options: &options,
    })
    .unwrap();
    assert_eq!(
        fs::read_to_string(temp.path().join("b.js")).unwrap(),
        expected.code
    );
}

#[test]
fn graph_lists_each_module_once() {
    let temp = tempfile::tempdir().unwrap();

    let summary = TreeCompilation::new(&fake_compile, options(true), temp.path())
        .run(["test-data/scenario"])
        .unwrap();

    assert_eq!(summary.graph, Some(temp.path().join("graph.json")));
    assert_eq!(
        read_graph(temp.path()),
        json!({"a": {"requires": ["b"]}, "b": {"requires": []}})
    );
}

#[test]
fn nested_tree_with_inferred_names() {
    let temp = tempfile::tempdir().unwrap();
    let options = CompileOptions {
        infer_name: true,
        ..options(true)
    };

    let summary = TreeCompilation::new(&fake_compile, options, temp.path())
        .jobs(2)
        .run(["test-data/nested"])
        .unwrap();

    assert_eq!(summary.files, count_files(["test-data/nested"]).unwrap());
    assert_eq!(
        output_files(temp.path()),
        vec![
            PathBuf::from("graph.json"),
            PathBuf::from("index.js"),
            PathBuf::from("lib/math.js"),
            PathBuf::from("lib/strings.js"),
        ]
    );
    assert_eq!(
        read_graph(temp.path()),
        json!({
            "index": {"requires": ["lib/math", "lib/strings"]},
            "lib/math": {"requires": []},
            "lib/strings": {"requires": ["lib/math"]},
        })
    );
    assert!(fs::read_to_string(temp.path().join("lib/math.js"))
        .unwrap()
        .starts_with("/* cjs lib/math */"));
}

#[test]
fn several_roots_share_one_graph() {
    let temp = tempfile::tempdir().unwrap();

    let summary = TreeCompilation::new(&fake_compile, options(true), temp.path())
        .run(["test-data/scenario", "test-data/nested/lib"])
        .unwrap();

    assert_eq!(summary.files, 4);
    let graph = read_graph(temp.path());
    let names: Vec<&String> = graph.as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["a", "b", "math", "strings"]);
}

#[test]
fn rerunning_over_existing_output_is_fine() {
    let temp = tempfile::tempdir().unwrap();
    let compilation = TreeCompilation::new(&fake_compile, options(true), temp.path());

    let first = compilation.run(["test-data/scenario"]).unwrap();
    let second = compilation.run(["test-data/scenario"]).unwrap();

    assert_eq!(first, second);
    assert_eq!(output_files(temp.path()).len(), 3);
}

#[test]
fn failed_compile_fails_the_run_without_a_graph() {
    let temp = tempfile::tempdir().unwrap();

    let err = TreeCompilation::new(&reject_value, options(true), temp.path())
        .run(["test-data/scenario"])
        .unwrap_err();

    assert!(matches!(err, Error::Compile { .. }));
    assert!(!temp.path().join(GRAPH_FILE_NAME).exists());
}

#[test]
fn colliding_module_names_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let options = CompileOptions {
        module_name: Some("bundle".to_owned()),
        ..options(true)
    };

    let err = TreeCompilation::new(&fake_compile, options, temp.path())
        .run(["test-data/scenario"])
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Graph(GraphError::DuplicateModule { ref name }) if name == "bundle"
    ));
    assert!(!temp.path().join(GRAPH_FILE_NAME).exists());
}

#[test]
fn missing_root_fails_before_any_output() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("out");

    let err = TreeCompilation::new(&fake_compile, options(true), &out)
        .run(["test-data/scenario", "test-data/does-not-exist"])
        .unwrap_err();

    assert!(matches!(err, Error::Walk(_)));
    assert!(!err.is_directory_read());
    assert!(!out.exists());
}

#[test]
fn empty_tree_still_writes_a_graph() {
    let input = tempfile::tempdir().unwrap();
    fs::write(input.path().join(".only-hidden.js"), "import \"x\";").unwrap();
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("out");

    let summary = TreeCompilation::new(&fake_compile, options(true), &out)
        .run([input.path()])
        .unwrap();

    assert_eq!(summary.files, 0);
    assert_eq!(read_graph(&out), json!({}));
}

#[test]
fn repeated_root_compiles_each_output_once() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("out");
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let counting = |request: CompileRequest<'_>| {
        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        fake_compile(request)
    };

    let summary = TreeCompilation::new(&counting, options(true), &out)
        .run(["test-data/scenario", "test-data/scenario"])
        .unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(
        output_files(&out),
        vec![
            PathBuf::from("a.js"),
            PathBuf::from("b.js"),
            PathBuf::from(GRAPH_FILE_NAME)
        ]
    );
    assert_eq!(
        read_graph(&out),
        json!({"a": {"requires": ["b"]}, "b": {"requires": []}})
    );
}

#[cfg(unix)]
#[test]
fn unlistable_directory_fails_the_run_as_a_directory_read() {
    let tree = match common::LockedTree::new() {
        Some(tree) => tree,
        None => return,
    };
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("out");

    let err = TreeCompilation::new(&fake_compile, options(true), &out)
        .run([tree.root()])
        .unwrap_err();

    assert!(matches!(err, Error::Walk(_)));
    assert!(err.is_directory_read());
    assert!(!out.exists());
}
