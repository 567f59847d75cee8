use std::path::PathBuf;

/// Errors reported by point cloud readers, writers and the `PointBuffer` itself
#[derive(thiserror::Error, Debug)]
pub enum CloudIoError {
    #[error("file {0} does not exist")]
    NotFound(PathBuf),
    #[error("file {path} does not have the expected `.{expected}` extension")]
    BadExtension {
        path: PathBuf,
        expected: &'static str,
    },
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },
    #[error("malformed file header: {0}")]
    Format(String),
    #[error("invalid configuration")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudIoError>;
