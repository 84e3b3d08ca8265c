//! Modifications and their canonical journal encoding.
//!
//! A [`Modification`] is the unit of change: put a value at a path or delete
//! the value at a path. The journal stores one modification per line as
//! `{"op":"put","path":["a","b"],"value":…}` or
//! `{"op":"delete","path":["a","b"]}`.

use crate::path::Path;
use crate::value;
use crate::Value;
use serde::{Deserialize, Serialize};

/// A single change to the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JournalEntry", into = "JournalEntry")]
pub enum Modification {
    /// Place `value` at `path`, creating missing intermediate objects.
    Put { path: Path, value: Value },
    /// Remove the key at the final segment of `path`.
    Delete { path: Path },
}

impl Modification {
    /// Construct a put modification.
    pub fn put(path: Path, value: Value) -> Self {
        Modification::Put { path, value }
    }

    /// Construct a delete modification.
    pub fn delete(path: Path) -> Self {
        Modification::Delete { path }
    }

    /// The path this modification changes.
    pub fn path(&self) -> &Path {
        match self {
            Modification::Put { path, .. } => path,
            Modification::Delete { path } => path,
        }
    }
}

/// Apply a modification to a document, returning the new document.
///
/// Total: any modification applied to any value yields a well-formed value.
pub fn apply_modification(value: Value, modification: &Modification) -> Value {
    match modification {
        Modification::Put { path, value: new } => value::put(value, path, new.clone()),
        Modification::Delete { path } => value::delete(value, path),
    }
}

/// Wire form of a journal line.
///
/// Kept as a plain struct (rather than an internally tagged enum) so the
/// `value` field deserializes `serde_json::Value` directly; this matters with
/// the `arbitrary_precision` feature, which does not survive serde's content
/// buffering.
#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    op: Op,
    path: Path,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Op {
    Put,
    Delete,
}

impl TryFrom<JournalEntry> for Modification {
    type Error = String;

    fn try_from(entry: JournalEntry) -> Result<Self, Self::Error> {
        match (entry.op, entry.value) {
            (Op::Put, Some(value)) => Ok(Modification::Put {
                path: entry.path,
                value,
            }),
            (Op::Put, None) => Err("put entry is missing a value".to_string()),
            (Op::Delete, None) => Ok(Modification::Delete { path: entry.path }),
            (Op::Delete, Some(_)) => Err("delete entry carries a value".to_string()),
        }
    }
}

impl From<Modification> for JournalEntry {
    fn from(modification: Modification) -> Self {
        match modification {
            Modification::Put { path, value } => JournalEntry {
                op: Op::Put,
                path,
                value: Some(value),
            },
            Modification::Delete { path } => JournalEntry {
                op: Op::Delete,
                path,
                value: None,
            },
        }
    }
}
