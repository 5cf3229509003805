use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PacketError>;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Conflicting metadata for {}: {} candidate files ({})",
        packet.display(), candidates.len(), candidates.join(", "))]
    ConflictingMetadata { packet: PathBuf, candidates: Vec<String> },
    #[error("Malformed data in {}: {reason}", path.display())]
    MalformedData { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Some members were already moved when `failed` could not be.
    /// Nothing is rolled back; re-scan the directory before continuing.
    #[error("Partial rename: {completed} file(s) moved before {} failed: {source}", failed.display())]
    PartialRename {
        completed: usize,
        failed:    PathBuf,
        #[source]
        source:    io::Error,
    },
    #[error("Name is empty after sanitizing: {0:?}")]
    EmptyName(String),
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),
}

impl PacketError {
    /// Attach `path` to a collaborator error, keeping `NotFound` distinct.
    pub(crate) fn at(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PacketError::NotFound { path: path.to_owned() },
            _                       => PacketError::Io(err),
        }
    }
}
