//! Compile options and the usage rules an invocation must satisfy before any
//! file is touched.

use std::{collections::BTreeMap, fmt::Display, path::PathBuf, str::FromStr};

/// The four module-wrapping conventions the compiler can emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Amd,
    Yui,
    Cjs,
    Globals,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Amd => "amd",
            OutputFormat::Yui => "yui",
            OutputFormat::Cjs => "cjs",
            OutputFormat::Globals => "globals",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd" => Ok(OutputFormat::Amd),
            "yui" => Ok(OutputFormat::Yui),
            "cjs" => Ok(OutputFormat::Cjs),
            "globals" => Ok(OutputFormat::Globals),
            other => Err(UsageError::UnknownFormat(other.to_owned())),
        }
    }
}

/// External import path to the global identifier it is exposed as, e.g.
/// `jquery` to `$`. Only meaningful for [`OutputFormat::Globals`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportMap(BTreeMap<String, String>);

impl ImportMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(path, global)| (path.as_str(), global.as_str()))
    }
}

impl Display for ImportMap {
    /// The same `path:global,path:global` shape the map is parsed from.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .iter()
            .map(|(path, global)| format!("{}:{}", path, global))
            .collect();
        f.write_str(&pairs.join(","))
    }
}

impl FromStr for ImportMap {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once(':') {
                Some((path, global)) if !path.is_empty() && !global.is_empty() => {
                    Ok((path.to_owned(), global.to_owned()))
                }
                _ => Err(UsageError::MalformedImport(pair.to_owned())),
            })
            .collect::<Result<_, _>>()
            .map(ImportMap)
    }
}

/// Settings shared by every compile of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub format: OutputFormat,
    pub imports: ImportMap,
    pub module_name: Option<String>,
    pub infer_name: bool,
    pub graph: bool,
    /// Name of the global to export into, for [`OutputFormat::Globals`].
    pub global_name: Option<String>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("unknown output type {0:?}, expected one of \"amd\", \"yui\", \"cjs\" or \"globals\"")]
    UnknownFormat(String),

    #[error("malformed import mapping {0:?}, expected PATH:GLOBAL")]
    MalformedImport(String),

    #[error("--infer-name and --module-name cannot be used together")]
    InferNameWithModuleName,

    #[error("--infer-name cannot be used with --stdio for {0} output")]
    InferNameWithStdio(OutputFormat),

    #[error("an output directory (--to) is required unless --stdio is used")]
    MissingDestination,

    #[error("--imports is required for globals output")]
    MissingImports,

    #[error("--imports is only valid for globals output, not {0}")]
    UnexpectedImports(OutputFormat),

    #[error("no input paths given")]
    NoInputs,
}

/// Everything an invocation asked for, before validation.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub inputs: Vec<PathBuf>,
    pub stdio: bool,
    pub to: Option<PathBuf>,
    pub format: OutputFormat,
    pub imports: Option<ImportMap>,
    pub graph: bool,
    pub infer_name: bool,
    pub module_name: Option<String>,
    pub global: Option<String>,
}

/// A validated invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Stdio {
        options: CompileOptions,
    },
    Files {
        roots: Vec<PathBuf>,
        destination: PathBuf,
        options: CompileOptions,
    },
}

impl Invocation {
    pub fn validate(self) -> Result<Mode, UsageError> {
        if self.infer_name && self.module_name.is_some() {
            return Err(UsageError::InferNameWithModuleName);
        }
        if self.stdio
            && self.infer_name
            && matches!(self.format, OutputFormat::Amd | OutputFormat::Yui)
        {
            return Err(UsageError::InferNameWithStdio(self.format));
        }
        // `--imports ""` maps nothing, so it counts as not given.
        let imports = self.imports.filter(|imports| !imports.is_empty());
        match (&imports, self.format) {
            (None, OutputFormat::Globals) => return Err(UsageError::MissingImports),
            (Some(_), OutputFormat::Globals) | (None, _) => {}
            (Some(_), format) => return Err(UsageError::UnexpectedImports(format)),
        }

        let options = CompileOptions {
            format: self.format,
            imports: imports.unwrap_or_default(),
            module_name: self.module_name,
            infer_name: self.infer_name,
            graph: self.graph,
            global_name: self.global,
        };

        if self.stdio {
            return Ok(Mode::Stdio { options });
        }
        let destination = self.to.ok_or(UsageError::MissingDestination)?;
        if self.inputs.is_empty() {
            return Err(UsageError::NoInputs);
        }
        Ok(Mode::Files {
            roots: self.inputs,
            destination,
            options,
        })
    }
}
