//! The compile step itself lives outside this crate. The orchestration only
//! needs something implementing [`Compile`]: usually a [`CommandCompiler`]
//! wrapping an external transpiler, or a closure in tests.

use std::{
    fmt::Display,
    io::{self, Write},
    process::{Command, Stdio},
    string, thread,
};

use log::trace;
use serde::Deserialize;

use crate::options::CompileOptions;

/// Input to a single compile.
#[derive(Clone, Copy, Debug)]
pub struct CompileRequest<'a> {
    pub source: &'a str,
    pub module_name: Option<&'a str>,
    pub options: &'a CompileOptions,
}

/// The compiled text of one module plus the names of the modules it
/// requires, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CompiledModule {
    pub code: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

pub trait Compile: Sync {
    fn compile(&self, request: CompileRequest<'_>) -> Result<CompiledModule, CompileError>;
}

impl<F> Compile for F
where
    F: Fn(CompileRequest<'_>) -> Result<CompiledModule, CompileError> + Sync,
{
    fn compile(&self, request: CompileRequest<'_>) -> Result<CompiledModule, CompileError> {
        self(request)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct CompileError {
    kind: CompileErrorKind,
}

impl CompileError {
    /// For in-process compilers that refuse their input.
    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self {
            kind: CompileErrorKind::Rejected(reason.into()),
        }
    }

    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            CompileErrorKind::Spawn(_) => write!(f, "unable to spawn compiler process"),
            CompileErrorKind::Stdin(_) => write!(f, "unable to send source to compiler process"),
            CompileErrorKind::Exit { command, stderr } => {
                writeln!(
                    f,
                    "compiler exited with non-zero status code for command {:?}:",
                    command
                )?;
                write!(f, "{}", String::from_utf8_lossy(stderr))
            }
            CompileErrorKind::InvalidUtf8(_) => {
                write!(f, "compiler output included invalid UTF-8")
            }
            CompileErrorKind::Response(_) => write!(f, "unable to parse compiler response"),
            CompileErrorKind::Rejected(reason) => write!(f, "compile failed: {}", reason),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            CompileErrorKind::Spawn(err) => Some(err),
            CompileErrorKind::Stdin(err) => Some(err),
            CompileErrorKind::Exit {
                command: _,
                stderr: _,
            } => None,
            CompileErrorKind::InvalidUtf8(err) => Some(err),
            CompileErrorKind::Response(err) => Some(err),
            CompileErrorKind::Rejected(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum CompileErrorKind {
    #[non_exhaustive]
    Spawn(io::Error),
    #[non_exhaustive]
    Stdin(io::Error),
    #[non_exhaustive]
    Exit { command: String, stderr: Vec<u8> },
    #[non_exhaustive]
    InvalidUtf8(string::FromUtf8Error),
    #[non_exhaustive]
    Response(serde_json::Error),
    #[non_exhaustive]
    Rejected(String),
}

impl From<CompileErrorKind> for CompileError {
    fn from(kind: CompileErrorKind) -> Self {
        Self { kind }
    }
}

impl From<string::FromUtf8Error> for CompileErrorKind {
    fn from(err: string::FromUtf8Error) -> Self {
        Self::InvalidUtf8(err)
    }
}

/// Runs an external transpiler once per module.
///
/// The program is invoked as
/// `PROGRAM [ARGS...] --type TYPE [--module-name NAME] [--global NAME] [--imports PATH:GLOBAL,...]`
/// with the module source on stdin, and must print
/// `{"code": "...", "dependencies": ["..."]}` to stdout.
#[derive(Clone, Debug)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn arguments(&self, request: &CompileRequest<'_>) -> Vec<String> {
        let options = request.options;
        let mut arguments = self.args.clone();
        arguments.push("--type".to_owned());
        arguments.push(options.format.to_string());
        if let Some(module_name) = request.module_name {
            arguments.push("--module-name".to_owned());
            arguments.push(module_name.to_owned());
        }
        if let Some(global) = &options.global_name {
            arguments.push("--global".to_owned());
            arguments.push(global.clone());
        }
        if !options.imports.is_empty() {
            arguments.push("--imports".to_owned());
            arguments.push(options.imports.to_string());
        }
        arguments
    }
}

impl Compile for CommandCompiler {
    fn compile(&self, request: CompileRequest<'_>) -> Result<CompiledModule, CompileError> {
        let arguments = self.arguments(&request);
        trace!("{} {}", self.program, arguments.join(" "));

        let mut child = Command::new(&self.program)
            .args(&arguments)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CompileErrorKind::Spawn)?;

        // Feed stdin from its own thread so a child that writes before it has
        // read everything cannot deadlock against us.
        let mut stdin = child.stdin.take();
        let source = request.source.as_bytes();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin.as_mut() {
                Some(stdin) => stdin.write_all(source),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output.map_err(CompileErrorKind::Spawn)?;

        if output.status.code() != Some(0) {
            return Err(CompileErrorKind::Exit {
                command: format!("{} {}", self.program, arguments.join(" ")),
                stderr: output.stderr,
            }
            .into());
        }
        match written {
            Ok(Ok(())) => {}
            // The child exited successfully without reading all of its input.
            Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(err)) => return Err(CompileErrorKind::Stdin(err).into()),
            Err(_) => {
                return Err(CompileErrorKind::Stdin(io::Error::new(
                    io::ErrorKind::Other,
                    "stdin writer panicked",
                ))
                .into())
            }
        }

        let stdout = String::from_utf8(output.stdout).map_err(CompileErrorKind::from)?;
        let compiled = serde_json::from_str(&stdout).map_err(CompileErrorKind::Response)?;
        Ok(compiled)
    }
}
