use thiserror::Error;

use crate::collab::{CacheError, DirectoryError, LedgerError};

/// Failure inside a dialogue step. These are non-fatal to the engine: the
/// conversation answers with the generic failure response and terminates
/// cleanly rather than getting stuck or crashing the transport layer.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("conversation state missing: {0}")]
    MissingState(&'static str),
}
