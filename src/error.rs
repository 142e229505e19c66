use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a script never started.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("{0} not found")]
    NotFound(PathBuf),
    #[error("permission denied for {0}")]
    PermissionDenied(PathBuf),
    #[error("failed to start {path}: {source}")]
    Other {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    pub fn from_io(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SpawnError::NotFound(path),
            io::ErrorKind::PermissionDenied => SpawnError::PermissionDenied(path),
            _ => SpawnError::Other { path, source: err },
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_io_errors() {
        let p = PathBuf::from("/nope");
        let e = SpawnError::from_io(p.clone(), io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, SpawnError::NotFound(_)));

        let e = SpawnError::from_io(p.clone(), io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, SpawnError::PermissionDenied(_)));

        let e = SpawnError::from_io(p, io::Error::other("exec format error"));
        assert!(matches!(e, SpawnError::Other { .. }));
        assert!(e.to_string().contains("exec format error"));
    }
}
