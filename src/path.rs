use std::{
    error::Error,
    fmt::Display,
    path::{self, Component, Path, PathBuf},
};

#[derive(Debug)]
#[non_exhaustive]
pub struct StripPrefixError {
    path: PathBuf,
    root: PathBuf,
    inner: path::StripPrefixError,
}

impl Display for StripPrefixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot strip input root {:?} from path {:?}",
            self.root, self.path
        )
    }
}

impl Error for StripPrefixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.inner)
    }
}

/// Path of `path` relative to the input root it was discovered under.
///
/// A root that is itself a file is relative to its parent directory, so
/// `lib/a.js` given directly on the command line maps to `a.js`.
pub fn relative_to_root(
    root: &Path,
    root_is_file: bool,
    path: &Path,
) -> Result<PathBuf, StripPrefixError> {
    let base = match (root_is_file, root.parent()) {
        (true, Some(parent)) => parent,
        _ => root,
    };
    path.strip_prefix(base)
        .map(ToOwned::to_owned)
        .map_err(|inner| StripPrefixError {
            path: path.to_owned(),
            root: base.to_owned(),
            inner,
        })
}

/// Join the normal components of `path` with forward slashes, regardless of
/// the platform separator.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Module name for a source file: its path with the last extension removed,
/// using forward slashes. `lib/util.min.js` becomes `lib/util.min`.
pub fn infer_module_name(relative: &Path) -> String {
    normalize_path(&relative.with_extension(""))
}

/// Entries whose name begins with a dot never take part in a run.
pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
