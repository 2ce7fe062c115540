use std::{
    error::Error,
    fmt::Display,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

/// One side of a compile: a file on disk or a process-level stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    File(PathBuf),
    Stdin,
    Stdout,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::File(path) => write!(f, "{:?}", path),
            Endpoint::Stdin => write!(f, "standard input"),
            Endpoint::Stdout => write!(f, "standard output"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct StreamError {
    endpoint: Endpoint,
    kind: StreamErrorKind,
}

impl StreamError {
    pub(crate) fn new(endpoint: Endpoint, kind: StreamErrorKind) -> Self {
        Self { endpoint, kind }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn kind(&self) -> &StreamErrorKind {
        &self.kind
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            StreamErrorKind::Open(_) => write!(f, "unable to open {}", self.endpoint),
            StreamErrorKind::Create(_) => write!(f, "unable to create {}", self.endpoint),
            StreamErrorKind::CreateDirectory(_) => {
                write!(f, "unable to create directory {}", self.endpoint)
            }
            StreamErrorKind::Read(_) => write!(f, "unable to read {}", self.endpoint),
            StreamErrorKind::Write(_) => write!(f, "unable to write {}", self.endpoint),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            StreamErrorKind::Open(err) => Some(err),
            StreamErrorKind::Create(err) => Some(err),
            StreamErrorKind::CreateDirectory(err) => Some(err),
            StreamErrorKind::Read(err) => Some(err),
            StreamErrorKind::Write(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub enum StreamErrorKind {
    #[non_exhaustive]
    Open(io::Error),
    #[non_exhaustive]
    Create(io::Error),
    #[non_exhaustive]
    CreateDirectory(io::Error),
    #[non_exhaustive]
    Read(io::Error),
    #[non_exhaustive]
    Write(io::Error),
}

pub fn open_input<P: AsRef<Path>>(path: P) -> Result<File, StreamError> {
    let path = path.as_ref();
    File::open(path).map_err(|err| {
        StreamError::new(Endpoint::File(path.to_owned()), StreamErrorKind::Open(err))
    })
}

/// Create (or truncate) the output file for a compiled module.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>, StreamError> {
    let path = path.as_ref();
    File::create(path).map(BufWriter::new).map_err(|err| {
        StreamError::new(Endpoint::File(path.to_owned()), StreamErrorKind::Create(err))
    })
}

/// Buffer the whole of `input` into memory.
pub(crate) fn read_all<R: Read>(mut input: R, endpoint: &Endpoint) -> Result<String, StreamError> {
    let mut string = String::new();
    input
        .read_to_string(&mut string)
        .map_err(|err| StreamError::new(endpoint.clone(), StreamErrorKind::Read(err)))?;
    Ok(string)
}

/// Write one chunk, then terminate the stream by flushing it.
pub(crate) fn write_all<W: Write>(
    mut output: W,
    chunk: &[u8],
    endpoint: &Endpoint,
) -> Result<(), StreamError> {
    (|| {
        output.write_all(chunk)?;
        output.flush()
    })()
    .map_err(|err| StreamError::new(endpoint.clone(), StreamErrorKind::Write(err)))
}
