use std::{fs, thread};

use compile_modules::directory::ensure_dir;

#[test]
fn creates_missing_ancestors() {
    let temp = tempfile::tempdir().unwrap();
    let target = temp.path().join("a/b/c");

    ensure_dir(&target).unwrap();

    assert!(target.is_dir());
    assert!(temp.path().join("a/b").is_dir());
}

#[test]
fn second_call_is_a_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let target = temp.path().join("lib/util");
    ensure_dir(&target).unwrap();
    fs::write(target.join("keep.js"), "1").unwrap();

    ensure_dir(&target).unwrap();

    let entries: Vec<_> = fs::read_dir(&target).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(fs::read_to_string(target.join("keep.js")).unwrap(), "1");
}

#[test]
fn concurrent_callers_all_succeed() {
    let temp = tempfile::tempdir().unwrap();
    let target = temp.path().join("x/y/z/w");

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| ensure_dir(&target))).collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
    });

    assert!(target.is_dir());
}

#[test]
fn file_in_the_way_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    assert!(ensure_dir(blocker.join("child")).is_err());
}
