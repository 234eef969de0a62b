// Error taxonomy for the public routekit surface
//
// Construction-time failures (profile, dataset, query, settings) are returned
// synchronously from the constructing call. Execution only fails on internal
// dataset corruption or when the engine goes away with work still queued.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{path} not found")]
    DatasetNotFound { path: String },

    #[error("{path} is empty")]
    DatasetEmpty { path: String },

    #[error("{path} is malformed: {reason}")]
    MalformedProfile { path: String, reason: String },

    #[error("{path} not found")]
    ReferencedFileMissing { kind: FileKind, path: String },

    #[error("{kind} file {path} {reason}")]
    ReferencedFileCorrupt {
        kind: FileKind,
        path: String,
        reason: String,
    },

    #[error("Insufficient coordinates: need at least {required}, got {got}")]
    InsufficientCoordinates { required: usize, got: usize },

    #[error("Replay hints and checksum must be given together (missing {missing})")]
    MalformedHintPair { missing: &'static str },

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("Dataset corrupt: {0}")]
    DatasetCorrupt(String),

    #[error("Engine shut down before the query completed")]
    EngineShutdown,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable discriminant for matching on error categories without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    DatasetNotFound,
    DatasetEmpty,
    MalformedProfile,
    ReferencedFileMissing,
    ReferencedFileCorrupt,
    InsufficientCoordinates,
    MalformedHintPair,
    InvalidSettings,
    DatasetCorrupt,
    EngineShutdown,
    Io,
    Serialization,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::DatasetNotFound { .. } => ErrorKind::DatasetNotFound,
            Error::DatasetEmpty { .. } => ErrorKind::DatasetEmpty,
            Error::MalformedProfile { .. } => ErrorKind::MalformedProfile,
            Error::ReferencedFileMissing { .. } => ErrorKind::ReferencedFileMissing,
            Error::ReferencedFileCorrupt { .. } => ErrorKind::ReferencedFileCorrupt,
            Error::InsufficientCoordinates { .. } => ErrorKind::InsufficientCoordinates,
            Error::MalformedHintPair { .. } => ErrorKind::MalformedHintPair,
            Error::InvalidSettings(_) => ErrorKind::InvalidSettings,
            Error::DatasetCorrupt(_) => ErrorKind::DatasetCorrupt,
            Error::EngineShutdown => ErrorKind::EngineShutdown,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }


    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Files a dataset profile points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Graph,
    Nodes,
    Names,
    Timestamp,
}

impl FileKind {
    /// Profile key naming this file.
    pub fn profile_key(&self) -> &'static str {
        match self {
            FileKind::Graph => "graph",
            FileKind::Nodes => "nodes",
            FileKind::Names => "names",
            FileKind::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.profile_key())
    }
}
