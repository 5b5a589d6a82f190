//! Failures that abort the processing of a file (or of the whole run).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to open '{}' for reading: {source}", path.display())]
    OpenInput { path: PathBuf, source: io::Error },

    #[error("unable to open '{}' for writing: {source}", path.display())]
    OpenOutput { path: PathBuf, source: io::Error },

    #[error("unable to rename '{}' to '{}': {source}", from.display(), to.display())]
    Backup {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("unable to rename '{}' to '{}': {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Boilerplate is injected into every header; losing it is fatal to the run.
    #[error("unable to open '{}' to read: {source}", path.display())]
    Boilerplate { path: PathBuf, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::OpenInput { .. } => 1,
            Error::OpenOutput { .. } => 2,
            Error::Backup { .. } => 3,
            Error::Rename { .. } => 4,
            Error::Io(_) => 5,
            Error::Boilerplate { .. } => 6,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Boilerplate { .. })
    }
}
