//! Compile a tree of ES6 modules, or a single stream, into one of the AMD,
//! CommonJS, YUI or globals module formats, optionally recording which
//! modules require which in a `graph.json` dependency graph.
//!
//! This crate does not parse JavaScript. The transformation of a single
//! module is delegated to an implementation of [`Compile`], typically a
//! [`CommandCompiler`] wrapping an external transpiler. What the crate does
//! own is everything around it:
//!
//! - discovering the files to compile under a set of input roots, skipping
//!   hidden entries (names starting with a dot);
//! - mirroring the input layout into a destination directory, creating
//!   directories as needed;
//! - compiling files in parallel, buffering each module fully before it is
//!   compiled and writing the result verbatim;
//! - knowing when every discovered file has been written, and only then
//!   writing the dependency graph, exactly once.
//!
//! ```no_run
//! use compile_modules::{CommandCompiler, CompileOptions, OutputFormat, TreeCompilation};
//!
//! # fn main() -> Result<(), compile_modules::Error> {
//! let compiler = CommandCompiler::new("es6-module-transpiler-json");
//! let options = CompileOptions {
//!     format: OutputFormat::Cjs,
//!     infer_name: true,
//!     graph: true,
//!     ..CompileOptions::default()
//! };
//! let summary = TreeCompilation::new(&compiler, options, "out").run(["lib"])?;
//! println!("compiled {} files", summary.files);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_debug_implementations)]

pub mod barrier;
pub mod compiler;
pub mod directory;
mod error;
pub mod graph;
pub mod io;
pub mod options;
pub mod path;
pub mod run;
pub mod stream;
pub mod walker;

pub use compiler::{Compile, CommandCompiler, CompileError, CompileRequest, CompiledModule};
pub use error::Error;
pub use options::{CompileOptions, ImportMap, Invocation, Mode, OutputFormat, UsageError};
pub use run::{compile_stdio, RunSummary, TreeCompilation};
