//! Store error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the persistence layer and the store coordinator.
///
/// Durability errors are never silently swallowed: journal and snapshot
/// failures are surfaced to callers (and re-arm the dirty flag where a retry
/// is possible). Malformed journal entries during recovery are logged and
/// skipped rather than reported here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot file exists but could not be read. Fatal at startup.
    #[error("failed to read snapshot {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot file is not valid JSON. Fatal at startup.
    #[error("failed to decode snapshot {path}: {source}")]
    SnapshotDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The journal file could not be opened for read/append. Fatal at startup.
    #[error("failed to open journal {path}: {source}")]
    JournalOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A modification could not be encoded for the journal.
    #[error("failed to encode journal entry: {0}")]
    JournalEncode(#[source] serde_json::Error),

    /// A journal append or flush failed at runtime. The modification is not
    /// applied to memory.
    #[error("failed to append to journal: {0}")]
    JournalWrite(#[source] io::Error),

    /// Writing or renaming the snapshot temp file failed during sync.
    #[error("failed to write snapshot: {0}")]
    SnapshotWrite(#[source] io::Error),

    /// The writer thread could not be spawned.
    #[error("failed to spawn store writer thread: {0}")]
    WriterSpawn(#[source] io::Error),

    /// The coordinator has shut down and no longer accepts commands.
    #[error("store is shut down")]
    Closed,
}
