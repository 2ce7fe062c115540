use std::{fs, io, path::Path};

use log::trace;

use crate::io::{Endpoint, StreamError, StreamErrorKind};

/// Make sure `directory` and every missing ancestor exist.
///
/// Existing directories are left alone, so calling this twice for the same
/// path is a no-op the second time. Another worker creating the same
/// directory between the existence check and `create_dir` is not an error.
pub fn ensure_dir<P: AsRef<Path>>(directory: P) -> Result<(), StreamError> {
    let directory = directory.as_ref();
    if directory.as_os_str().is_empty() || directory.exists() {
        return Ok(());
    }
    if let Some(parent) = directory.parent() {
        ensure_dir(parent)?;
    }
    trace!("creating directory {:?}", directory);
    match fs::create_dir(directory) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && directory.is_dir() => Ok(()),
        Err(err) => Err(StreamError::new(
            Endpoint::File(directory.to_owned()),
            StreamErrorKind::CreateDirectory(err),
        )),
    }
}
