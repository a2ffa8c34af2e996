use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("No matching package found for {0:?}")]
    NoMatch(String),
    #[error("Invalid path {0}")]
    InvalidPath(PathBuf),
    #[error("Unable to determine the workspace root")]
    RootMissing,
    #[error("Unable to determine the user cache directory")]
    CacheDirMissing,
    #[error("Invalid depth limit {0}, expected -1 or a non-negative integer")]
    InvalidDepthLimit(i64),
    #[error("{0} is not inside a vendor directory")]
    NoVendorParent(PathBuf),
    #[error("Failed to read the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Failed to create directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("Failed to read directory index {path}: {source}")]
    IndexRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write directory index {path}: {source}")]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode directory index: {0}")]
    IndexDecode(#[source] bincode::Error),
    #[error("Failed to encode directory index: {0}")]
    IndexEncode(#[source] bincode::Error),
    #[error("Unsupported directory index version {found}, expected {expected}")]
    IndexVersion { found: u32, expected: u32 },

    #[error("Failed to open history database env: {0}")]
    EnvOpen(#[source] heed::Error),
    #[error("Failed to create history database: {0}")]
    DbCreate(#[source] heed::Error),
    #[error("Failed to clear stale readers for history database: {0}")]
    DbClearStaleReaders(#[source] heed::Error),
    #[error("Failed to start read transaction for history database: {0}")]
    DbStartReadTxn(#[source] heed::Error),
    #[error("Failed to start write transaction for history database: {0}")]
    DbStartWriteTxn(#[source] heed::Error),
    #[error("Failed to read from history database: {0}")]
    DbRead(#[source] heed::Error),
    #[error("Failed to write to history database: {0}")]
    DbWrite(#[source] heed::Error),
    #[error("Failed to commit write transaction to history database: {0}")]
    DbCommit(#[source] heed::Error),
    #[error("No previous result at position {0}")]
    HistoryOutOfRange(usize),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to open log file {path}: {source}")]
    LogFileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
