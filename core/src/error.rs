use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The path does not exist. The caller skips it and carries on.
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed input in {location}: {reason}")]
    Malformed { location: String, reason: String },

    /// Writing a result or index file failed. What was computed stays in memory.
    #[error("unable to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IndexError {
    /// Classifies a read failure on `path`.
    pub fn from_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::InvalidData => Self::Malformed { location: path.display().to_string(), reason: source.to_string() },
            _ => Self::Io { path, source },
        }
    }
}
