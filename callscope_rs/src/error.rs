//! Error kinds surfaced by the callscope core.
//!
//! Analysis paths swallow per-file failures and keep going; I/O paths report
//! through these variants so callers can decide what is fatal.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The index file could not be read or written.
    #[error("index I/O failed for {path}: {source}")]
    IndexIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The index file did not contain a valid index record.
    #[error("malformed index {path}: {source}")]
    IndexFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A query was pointed at a trace log that does not exist.
    #[error("trace file {path} not found")]
    MissingTrace { path: PathBuf },

    /// The event log could not be read or written.
    #[error("trace I/O failed for {path}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The event log did not contain a valid event array.
    #[error("malformed trace {path}: {source}")]
    TraceFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The Python interpreter for the traced script could not be launched.
    #[error("could not launch {interpreter}: {source}")]
    Interpreter {
        interpreter: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
