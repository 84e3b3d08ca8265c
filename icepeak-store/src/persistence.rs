//! Crash-safe durability: snapshot loading, journal replay, append-then-apply,
//! and periodic atomic sync.
//!
//! The snapshot file holds the full document as one JSON value; the journal
//! (optional) holds one modification per line appended since the last sync.
//! `sync` rewrites the snapshot via temp-file + atomic rename and then
//! truncates the journal, so a crash at any point leaves either the old
//! snapshot plus a replayable journal, or the new snapshot plus a stale
//! journal whose entries re-apply as no-ops.

use crate::error::StoreError;
use crate::metrics::StoreMetrics;
use crate::store::{apply_modification, Modification};
use crate::Value;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File locations for the persistence layer.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Snapshot file holding the full document.
    pub data_file: PathBuf,
    /// Append-only journal; journaling is disabled when `None`.
    pub journal_file: Option<PathBuf>,
}

/// The durable document: in-memory value plus its snapshot and journal files.
///
/// Owned exclusively by the coordinator's writer thread; all methods take
/// `&mut self` and perform blocking file I/O.
#[derive(Debug)]
pub struct Persistence {
    value: Value,
    dirty: bool,
    data_file: PathBuf,
    journal: Option<Journal>,
    metrics: Arc<StoreMetrics>,
}

#[derive(Debug)]
struct Journal {
    file: File,
    path: PathBuf,
}

impl Persistence {
    /// Load the snapshot, replay the journal, and return the live handle.
    ///
    /// A missing or empty snapshot file starts the document from JSON `null`;
    /// the file is first created by a later sync. A non-empty snapshot that
    /// fails to read or decode is fatal. Malformed journal lines are counted,
    /// summarized in a warning, and skipped: the journal is best-effort
    /// recovery. After replay the recovered state is synced so the journal is
    /// truncated before the store goes live.
    pub fn load(config: &PersistenceConfig, metrics: Arc<StoreMetrics>) -> Result<Self, StoreError> {
        let value = read_snapshot(&config.data_file)?;

        let mut persistence = Persistence {
            value,
            dirty: false,
            data_file: config.data_file.clone(),
            journal: None,
            metrics,
        };

        if let Some(journal_path) = &config.journal_file {
            let mut file = OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(journal_path)
                .map_err(|source| StoreError::JournalOpen {
                    path: journal_path.clone(),
                    source,
                })?;
            persistence.replay(&mut file, journal_path)?;
            persistence.journal = Some(Journal {
                file,
                path: journal_path.clone(),
            });
            persistence.sync()?;
        }

        Ok(persistence)
    }

    /// Stream journal lines from the start of `file`, applying each parsed
    /// modification in order.
    fn replay(&mut self, file: &mut File, path: &FsPath) -> Result<(), StoreError> {
        file.seek(SeekFrom::Start(0))
            .map_err(|source| StoreError::JournalOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let mut applied = 0usize;
        let mut failed = 0usize;
        for line in BufReader::new(&*file).lines() {
            let line = line.map_err(|source| StoreError::JournalOpen {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Modification>(&line) {
                Ok(modification) => {
                    let value = std::mem::take(&mut self.value);
                    self.value = apply_modification(value, &modification);
                    applied += 1;
                }
                Err(error) => {
                    debug!(%error, "skipping malformed journal entry");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            warn!(
                applied,
                failed,
                journal = %path.display(),
                "journal recovery skipped malformed entries"
            );
        }
        if applied > 0 || failed > 0 {
            info!(applied, journal = %path.display(), "replayed journal");
            self.dirty = true;
        }
        Ok(())
    }

    /// Append-then-apply a modification.
    ///
    /// The journal line is written and flushed before the in-memory value
    /// changes; a failed append leaves the document untouched so the caller
    /// can surface the error without observing partial application.
    pub fn apply(&mut self, modification: &Modification) -> Result<(), StoreError> {
        if let Some(journal) = &mut self.journal {
            let mut line =
                serde_json::to_string(modification).map_err(StoreError::JournalEncode)?;
            line.push('\n');
            journal
                .file
                .write_all(line.as_bytes())
                .and_then(|()| journal.file.flush())
                .map_err(StoreError::JournalWrite)?;
            self.metrics.journal_written_bytes.inc_by(line.len() as u64);
        }

        let value = std::mem::take(&mut self.value);
        self.value = apply_modification(value, modification);
        self.dirty = true;
        self.metrics.modifications_applied.inc();
        Ok(())
    }

    /// Materialize the current value on disk and truncate the journal.
    ///
    /// No-op when the document is clean. The snapshot is written to
    /// `data_file + ".new"` and renamed over `data_file` (atomic on POSIX);
    /// only then is the journal truncated. On failure the dirty flag is
    /// re-armed so the next tick retries.
    pub fn sync(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;

        if let Err(error) = self.write_snapshot() {
            self.dirty = true;
            return Err(error);
        }

        if let Some(journal) = &mut self.journal {
            if let Err(source) = journal.file.set_len(0) {
                self.dirty = true;
                return Err(StoreError::JournalWrite(source));
            }
        }
        Ok(())
    }

    fn write_snapshot(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.value)
            .map_err(|e| StoreError::SnapshotWrite(std::io::Error::other(e)))?;
        let temp = temp_path(&self.data_file);
        std::fs::write(&temp, &bytes).map_err(StoreError::SnapshotWrite)?;
        std::fs::rename(&temp, &self.data_file).map_err(StoreError::SnapshotWrite)?;

        self.metrics.data_size_bytes.set(bytes.len() as i64);
        self.metrics.data_written_bytes.inc_by(bytes.len() as u64);
        debug!(bytes = bytes.len(), file = %self.data_file.display(), "wrote snapshot");
        Ok(())
    }

    /// The current in-memory document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether there are unsynced modifications.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

fn read_snapshot(data_file: &FsPath) -> Result<Value, StoreError> {
    match std::fs::read(data_file) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Value::Null),
        Ok(bytes) => {
            serde_json::from_slice(&bytes).map_err(|source| StoreError::SnapshotDecode {
                path: data_file.to_path_buf(),
                source,
            })
        }
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(Value::Null),
        Err(source) => Err(StoreError::SnapshotRead {
            path: data_file.to_path_buf(),
            source,
        }),
    }
}

fn temp_path(data_file: &FsPath) -> PathBuf {
    let mut name = OsString::from(data_file.as_os_str());
    name.push(".new");
    PathBuf::from(name)
}
