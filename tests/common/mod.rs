#![allow(dead_code)]

use std::path::{Path, PathBuf};

use compile_modules::{CompileError, CompileRequest, CompiledModule};

/// The string between the first pair of matching quotes on `line`.
fn quoted(line: &str) -> Option<&str> {
    let start = line.find(|c: char| c == '"' || c == '\'')?;
    let quote = &line[start..start + 1];
    let rest = &line[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

/// Modules named by `import` statements, in source order.
pub fn imports(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("import"))
        .filter_map(quoted)
        .map(ToOwned::to_owned)
        .collect()
}

/// Stands in for a real transpiler: prefixes the source with a comment
/// naming the format and module, and reports its imports as dependencies.
pub fn fake_compile(request: CompileRequest<'_>) -> Result<CompiledModule, CompileError> {
    Ok(CompiledModule {
        code: format!(
            "/* {} {} */\n{}",
            request.options.format,
            request.module_name.unwrap_or("<anonymous>"),
            request.source
        ),
        dependencies: imports(request.source),
    })
}

/// Rejects any module whose source mentions `value`.
pub fn reject_value(request: CompileRequest<'_>) -> Result<CompiledModule, CompileError> {
    if request.source.contains("value") {
        return Err(CompileError::rejected("unsupported syntax"));
    }
    fake_compile(request)
}

/// A scratch tree holding `a.js` and an empty directory `locked` whose
/// permissions forbid listing it. Permissions are restored on drop so the
/// tree can be removed.
#[cfg(unix)]
pub struct LockedTree {
    temp: tempfile::TempDir,
    locked: PathBuf,
}

#[cfg(unix)]
impl LockedTree {
    /// `None` when the current user can list the directory anyway, as root
    /// can, since then there is no failure to observe.
    pub fn new() -> Option<Self> {
        use std::{fs, os::unix::fs::PermissionsExt};

        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.js"), "export default 1;\n").unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let tree = LockedTree { temp, locked };
        if fs::read_dir(&tree.locked).is_ok() {
            return None;
        }
        Some(tree)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn locked(&self) -> &Path {
        &self.locked
    }
}

#[cfg(unix)]
impl Drop for LockedTree {
    fn drop(&mut self) {
        use std::{fs, os::unix::fs::PermissionsExt};

        let _ = fs::set_permissions(&self.locked, fs::Permissions::from_mode(0o755));
    }
}
