//! Discovery of the files a run will compile.
//!
//! Discovery is a single depth-first pass over each input root in turn,
//! visiting directory entries in file name order. The orchestrator collects
//! it into a finite list of [`FileTask`]s and sizes its completion barrier
//! from that list, so the number of completions it waits for is exactly the
//! number of tasks it started.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Display,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::{
    options::CompileOptions,
    path::{self, infer_module_name, is_hidden, relative_to_root},
};

#[derive(Debug)]
#[non_exhaustive]
pub struct WalkError {
    path: PathBuf,
    kind: WalkErrorKind,
}

impl WalkError {
    fn from_walkdir(root: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(root).to_owned();
        if let Some(ancestor) = err.loop_ancestor() {
            return WalkError {
                kind: WalkErrorKind::Loop {
                    ancestor: ancestor.to_owned(),
                },
                path,
            };
        }
        // walkdir reports failed stats and failed listings alike. A path
        // that still stats as a directory is one that could not be listed.
        let kind = if path.is_dir() {
            WalkErrorKind::ReadDirectory(err)
        } else {
            WalkErrorKind::Stat(err)
        };
        WalkError { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    pub fn is_directory_read(&self) -> bool {
        matches!(self.kind, WalkErrorKind::ReadDirectory(_))
    }
}

impl Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            WalkErrorKind::Stat(_) => write!(f, "unable to stat {:?}", self.path),
            WalkErrorKind::ReadDirectory(_) => {
                write!(f, "unable to read directory {:?}", self.path)
            }
            WalkErrorKind::Loop { ancestor } => write!(
                f,
                "filesystem loop: {:?} leads back to {:?}",
                self.path, ancestor
            ),
            WalkErrorKind::Path(_) => {
                write!(f, "unable to resolve output path for {:?}", self.path)
            }
            WalkErrorKind::OutputCollision { first, output } => write!(
                f,
                "{:?} and {:?} would both be compiled to {:?}",
                first, self.path, output
            ),
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            WalkErrorKind::Stat(err) => Some(err),
            WalkErrorKind::ReadDirectory(err) => Some(err),
            WalkErrorKind::Path(err) => Some(err),
            WalkErrorKind::Loop { .. } | WalkErrorKind::OutputCollision { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum WalkErrorKind {
    #[non_exhaustive]
    Stat(walkdir::Error),
    #[non_exhaustive]
    ReadDirectory(walkdir::Error),
    /// A followed symlink points at a directory already being walked.
    #[non_exhaustive]
    Loop { ancestor: PathBuf },
    #[non_exhaustive]
    Path(path::StripPrefixError),
    /// Two different inputs map to the same output file.
    #[non_exhaustive]
    OutputCollision { first: PathBuf, output: PathBuf },
}

/// A regular file found under one of the input roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `path` relative to the root it was found under.
    pub relative: PathBuf,
}

/// One unit of work: compile `input` into `output`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTask {
    pub input: PathBuf,
    pub relative: PathBuf,
    pub output: PathBuf,
    /// Name handed to the compiler, if any.
    pub module_name: Option<String>,
    /// Key of this module in the dependency graph.
    pub node_name: String,
}

impl FileTask {
    pub fn new(source: SourceFile, destination: &Path, options: &CompileOptions) -> Self {
        let inferred = infer_module_name(&source.relative);
        let module_name = match (&options.module_name, options.infer_name) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, true) => Some(inferred.clone()),
            (None, false) => None,
        };
        FileTask {
            output: destination.join(&source.relative),
            node_name: module_name.clone().unwrap_or(inferred),
            module_name,
            input: source.path,
            relative: source.relative,
        }
    }
}

type Entries = walkdir::FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>;

fn is_visible(entry: &DirEntry) -> bool {
    if entry.depth() > 0 && is_hidden(entry.file_name()) {
        trace!("skipping hidden entry {:?}", entry.path());
        return false;
    }
    true
}

struct Root {
    path: PathBuf,
    entries: Entries,
}

impl Root {
    fn new(path: PathBuf) -> Self {
        let entries = WalkDir::new(&path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_visible as fn(&DirEntry) -> bool);
        Root { path, entries }
    }

    fn source_file(&self, entry: DirEntry) -> Result<Option<SourceFile>, WalkError> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return Ok(None);
        }
        if !file_type.is_file() {
            debug!("skipping {:?}: not a regular file", entry.path());
            return Ok(None);
        }
        // Only a root named directly is a file at depth 0.
        let relative = relative_to_root(&self.path, entry.depth() == 0, entry.path())
            .map_err(|err| WalkError {
                path: entry.path().to_owned(),
                kind: WalkErrorKind::Path(err),
            })?;
        Ok(Some(SourceFile {
            path: entry.into_path(),
            relative,
        }))
    }
}

/// Lazy depth-first walk over `roots`, one root after another. Hidden
/// entries inside directories are skipped along with everything below them;
/// roots are always visited. Symlinks are followed. The walk ends after the
/// first error.
pub struct Walk {
    roots: std::vec::IntoIter<PathBuf>,
    current: Option<Root>,
    failed: bool,
}

impl std::fmt::Debug for Walk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walk")
            .field("current", &self.current.as_ref().map(|root| &root.path))
            .field("roots", &self.roots.as_slice())
            .field("failed", &self.failed)
            .finish()
    }
}

pub fn walk<I>(roots: I) -> Walk
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    Walk {
        roots: roots
            .into_iter()
            .map(|root| root.as_ref().to_owned())
            .collect::<Vec<_>>()
            .into_iter(),
        current: None,
        failed: false,
    }
}

impl Walk {
    fn fail(&mut self, err: WalkError) -> Option<Result<SourceFile, WalkError>> {
        self.failed = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for Walk {
    type Item = Result<SourceFile, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if self.current.is_none() {
                let path = self.roots.next()?;
                trace!("walking {:?}", path);
                self.current = Some(Root::new(path));
            }
            let root = self.current.as_mut()?;
            let entry = match root.entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    let err = WalkError::from_walkdir(&root.path, err);
                    return self.fail(err);
                }
                None => {
                    self.current = None;
                    continue;
                }
            };
            match root.source_file(entry) {
                Ok(Some(file)) => return Some(Ok(file)),
                Ok(None) => {}
                Err(err) => return self.fail(err),
            }
        }
    }
}

/// Count the non-hidden regular files reachable from `roots`.
///
/// This is a separate pass over the filesystem. A count taken here and a
/// later traversal that does the actual work can disagree if files are added
/// or removed in between, so nothing that waits on completions should be
/// sized from it. [`discover`] yields the list to size from instead.
pub fn count_files<I>(roots: I) -> Result<usize, WalkError>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    walk(roots).try_fold(0, |count, file| file.map(|_| count + 1))
}

/// Walk `roots` once and build the task for every file found, in discovery
/// order. Stops at the first error.
///
/// Every output path gets exactly one task. A file reached more than once,
/// through a repeated or overlapping root, is compiled once. Two different
/// files that would land on the same output are an error.
pub fn discover<I, P>(
    roots: I,
    destination: P,
    options: &CompileOptions,
) -> Result<Vec<FileTask>, WalkError>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
    P: AsRef<Path>,
{
    let destination = destination.as_ref();
    let mut inputs: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut tasks = Vec::new();
    for file in walk(roots) {
        let task = FileTask::new(file?, destination, options);
        match inputs.entry(task.output.clone()) {
            Entry::Occupied(first) if *first.get() == task.input => {
                debug!("{:?} found more than once, compiling it once", task.input);
            }
            Entry::Occupied(first) => {
                return Err(WalkError {
                    kind: WalkErrorKind::OutputCollision {
                        first: first.get().clone(),
                        output: task.output,
                    },
                    path: task.input,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(task.input.clone());
                tasks.push(task);
            }
        }
    }
    debug!("discovered {} files", tasks.len());
    Ok(tasks)
}
