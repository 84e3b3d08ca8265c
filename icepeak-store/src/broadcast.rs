//! Per-subscriber delivery channels.
//!
//! The coordinator fans out the new **root** value as an `Arc` to every
//! affected subscriber; extraction of the value at the subscription path and
//! JSON serialization happen on the subscriber's own task, keeping the writer
//! hot path short. A subscriber whose channel is full is dropped.

use crate::coordinator::Command;
use crate::path::Path;
use crate::value;
use crate::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier distinguishing subscribers that share a path.
pub type SubscriberId = u64;

/// The sending half registered in the subscription tree.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    path: Path,
    updates: mpsc::Sender<Arc<Value>>,
}

impl Subscriber {
    pub(crate) fn new(id: SubscriberId, path: Path, updates: mpsc::Sender<Arc<Value>>) -> Self {
        Subscriber { id, path, updates }
    }

    /// The subscription path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The subscriber id.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Enqueue the new root value without blocking.
    ///
    /// Fails when the channel is full (slow consumer) or closed
    /// (disconnected); either way the caller removes the subscriber.
    pub(crate) fn notify(&self, root: &Arc<Value>) -> Result<(), ()> {
        self.updates.try_send(Arc::clone(root)).map_err(|_| ())
    }
}

/// The receiving half held by a connection task.
///
/// Yields the document root after every modification affecting the
/// subscription path; the first item is the value at subscribe time. Dropping
/// the handle unsubscribes (best effort).
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    path: Path,
    updates: mpsc::Receiver<Arc<Value>>,
    commands: mpsc::Sender<Command>,
    unsubscribed: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        path: Path,
        updates: mpsc::Receiver<Arc<Value>>,
        commands: mpsc::Sender<Command>,
    ) -> Self {
        Subscription {
            id,
            path,
            updates,
            commands,
            unsubscribed: false,
        }
    }

    /// The subscription path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next root value.
    ///
    /// Returns `None` once the store has dropped this subscriber (slow
    /// consumer or shutdown).
    pub async fn next(&mut self) -> Option<Arc<Value>> {
        self.updates.recv().await
    }

    /// Serialize the value at the subscription path within `root`.
    ///
    /// Absent paths serialize as `null`, matching the wire contract.
    pub fn payload(&self, root: &Value) -> String {
        let extracted = value::get(root, &self.path).unwrap_or(&Value::Null);
        serde_json::to_string(extracted).unwrap_or_else(|_| "null".to_string())
    }

    /// Remove this subscriber from the store.
    pub async fn unsubscribe(mut self) {
        self.unsubscribed = true;
        let _ = self
            .commands
            .send(Command::Unsubscribe {
                path: self.path.clone(),
                id: self.id,
            })
            .await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.unsubscribed {
            // Best effort: the coordinator also prunes on failed delivery.
            let _ = self.commands.try_send(Command::Unsubscribe {
                path: self.path.clone(),
                id: self.id,
            });
        }
    }
}
