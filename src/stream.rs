use std::io::{Read, Write};

use log::trace;

use crate::{
    compiler::{Compile, CompileRequest, CompiledModule},
    io::{read_all, write_all, Endpoint},
    options::CompileOptions,
    Error,
};

/// A reader and where it reads from.
#[derive(Debug)]
pub struct Input<R> {
    pub reader: R,
    pub endpoint: Endpoint,
}

impl<R: Read> Input<R> {
    pub fn new(reader: R, endpoint: Endpoint) -> Self {
        Self { reader, endpoint }
    }
}

/// A writer and where it writes to.
#[derive(Debug)]
pub struct Output<W> {
    pub writer: W,
    pub endpoint: Endpoint,
}

impl<W: Write> Output<W> {
    pub fn new(writer: W, endpoint: Endpoint) -> Self {
        Self { writer, endpoint }
    }
}

/// Compile everything readable from `input` into `output`.
///
/// The input is buffered in full before the compiler runs, and the compiler
/// runs exactly once. `on_compiled` sees the compiled module before any byte
/// of it reaches `output`, so a caller recording dependencies never records a
/// module whose compile failed. The output receives the compiled code
/// verbatim and is then flushed.
pub fn compile_stream<C, R, W, F>(
    compiler: &C,
    input: Input<R>,
    output: Output<W>,
    module_name: Option<&str>,
    options: &CompileOptions,
    on_compiled: F,
) -> Result<CompiledModule, Error>
where
    C: Compile + ?Sized,
    R: Read,
    W: Write,
    F: FnOnce(&CompiledModule) -> Result<(), Error>,
{
    let source = read_all(input.reader, &input.endpoint)?;
    trace!("read {} bytes from {}", source.len(), input.endpoint);

    let compiled = compiler
        .compile(CompileRequest {
            source: &source,
            module_name,
            options,
        })
        .map_err(|source| Error::Compile {
            endpoint: input.endpoint,
            source,
        })?;

    on_compiled(&compiled)?;
    write_all(output.writer, compiled.code.as_bytes(), &output.endpoint)?;
    Ok(compiled)
}
