//! The single-writer coordinator.
//!
//! Exactly one thread owns the in-memory document, the journal handle, and
//! the subscription tree. Every mutation, subscription change, sync tick, and
//! the shutdown sequence arrives as a [`Command`] on a bounded queue, which
//! linearizes writes and makes the ordering guarantees trivial: a subscriber
//! registered before a modification either sees that modification's
//! notification or the new value in its subscribe-time snapshot, never
//! neither.
//!
//! Reads never enter the queue. The handle exposes a wait-free snapshot of
//! the current document through a shared cell holding an `Arc<Value>`; the
//! writer swaps in a new pointer after each applied modification.

use crate::broadcast::{Subscriber, SubscriberId, Subscription};
use crate::error::StoreError;
use crate::metrics::StoreMetrics;
use crate::path::Path;
use crate::persistence::{Persistence, PersistenceConfig};
use crate::store::Modification;
use crate::subscription::SubscriptionTree;
use crate::{value, Value};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Shared read cell: replaced wholesale by the writer, cloned by readers.
type SharedValue = Arc<RwLock<Arc<Value>>>;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Snapshot file holding the full document.
    pub data_file: PathBuf,
    /// Append-only journal; journaling is disabled when `None`.
    pub journal_file: Option<PathBuf>,
    /// Capacity of the command queue feeding the writer.
    pub queue_capacity: usize,
    /// Capacity of each subscriber's update channel; a subscriber that falls
    /// this far behind is dropped.
    pub subscriber_buffer: usize,
}

impl StoreConfig {
    /// Configuration with default capacities and no journal.
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_file: data_file.into(),
            journal_file: None,
            queue_capacity: 256,
            subscriber_buffer: 16,
        }
    }

    /// Enable journaling at the given path.
    pub fn with_journal(mut self, journal_file: impl Into<PathBuf>) -> Self {
        self.journal_file = Some(journal_file.into());
        self
    }
}

/// Commands processed by the writer thread.
#[derive(Debug)]
pub(crate) enum Command {
    Modify {
        modification: Modification,
        /// Acknowledged after the journal append and in-memory apply, before
        /// any subscriber is notified.
        done: oneshot::Sender<Result<(), StoreError>>,
    },
    Subscribe {
        subscriber: Subscriber,
    },
    Unsubscribe {
        path: Path,
        id: SubscriberId,
    },
    Sync,
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// The store: spawns the writer thread and hands out [`StoreHandle`]s.
pub struct Store;

impl Store {
    /// Load the persisted document and start the writer thread.
    pub fn spawn(config: StoreConfig, metrics: Arc<StoreMetrics>) -> Result<StoreHandle, StoreError> {
        let persistence_config = PersistenceConfig {
            data_file: config.data_file.clone(),
            journal_file: config.journal_file.clone(),
        };
        let persistence = Persistence::load(&persistence_config, metrics.clone())?;
        info!(
            data_file = %config.data_file.display(),
            journaling = config.journal_file.is_some(),
            "store loaded"
        );

        let current: SharedValue = Arc::new(RwLock::new(Arc::new(persistence.value().clone())));
        let (commands, queue) = mpsc::channel(config.queue_capacity.max(1));

        let writer = Writer {
            persistence,
            tree: SubscriptionTree::new(),
            queue,
            current: current.clone(),
            metrics,
        };
        std::thread::Builder::new()
            .name("icepeak-store".to_string())
            .spawn(move || writer.run())
            .map_err(StoreError::WriterSpawn)?;

        Ok(StoreHandle {
            commands,
            current,
            subscriber_buffer: config.subscriber_buffer.max(1),
            next_subscriber_id: Arc::new(AtomicU64::new(0)),
        })
    }
}

/// Cloneable handle used by drivers (HTTP handlers, WebSocket tasks, timers).
#[derive(Debug, Clone)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    current: SharedValue,
    subscriber_buffer: usize,
    next_subscriber_id: Arc<AtomicU64>,
}

impl StoreHandle {
    /// Wait-free snapshot of the current document.
    pub fn current(&self) -> Arc<Value> {
        self.current.read().clone()
    }

    /// The current value at `path`, if present.
    pub fn get(&self, path: &Path) -> Option<Value> {
        value::get(&self.current(), path).cloned()
    }

    /// Apply a modification, waiting for the durability acknowledgement.
    ///
    /// Resolves once the journal append and in-memory apply have happened
    /// (fire-and-acknowledge: sync is not awaited). A journal write failure
    /// is returned without the document having changed.
    pub async fn modify(&self, modification: Modification) -> Result<(), StoreError> {
        let (done, ack) = oneshot::channel();
        self.commands
            .send(Command::Modify { modification, done })
            .await
            .map_err(|_| StoreError::Closed)?;
        ack.await.map_err(|_| StoreError::Closed)?
    }

    /// Register a subscriber at `path`.
    ///
    /// The first item on the returned subscription is the document at
    /// subscribe time; later items follow every modification affecting
    /// `path`. Sequencing through the command queue guarantees no update
    /// between snapshot and live stream is missed.
    pub async fn subscribe(&self, path: Path) -> Result<Subscription, StoreError> {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (updates, receiver) = mpsc::channel(self.subscriber_buffer);
        self.commands
            .send(Command::Subscribe {
                subscriber: Subscriber::new(id, path.clone(), updates),
            })
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(Subscription::new(id, path, receiver, self.commands.clone()))
    }

    /// Trigger a sync now (used by tests; the timer uses the same command).
    pub async fn sync(&self) -> Result<(), StoreError> {
        self.commands
            .send(Command::Sync)
            .await
            .map_err(|_| StoreError::Closed)
    }

    /// Spawn the periodic sync timer on the current tokio runtime.
    pub fn spawn_sync_timer(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if commands.send(Command::Sync).await.is_err() {
                    break;
                }
            }
        })
    }

    /// Stop the writer: final sync, close the journal, disconnect all
    /// subscribers. Resolves once the writer has finished.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let (done, finished) = oneshot::channel();
        self.commands
            .send(Command::Shutdown { done })
            .await
            .map_err(|_| StoreError::Closed)?;
        finished.await.map_err(|_| StoreError::Closed)
    }
}

/// State owned by the writer thread.
struct Writer {
    persistence: Persistence,
    tree: SubscriptionTree,
    queue: mpsc::Receiver<Command>,
    current: SharedValue,
    metrics: Arc<StoreMetrics>,
}

impl Writer {
    fn run(mut self) {
        while let Some(command) = self.queue.blocking_recv() {
            match command {
                Command::Modify { modification, done } => {
                    self.modify(modification, done);
                }
                Command::Subscribe { subscriber } => {
                    self.subscribe(subscriber);
                }
                Command::Unsubscribe { path, id } => {
                    if self.tree.unsubscribe(&path, id) {
                        debug!(%path, id, "unsubscribed");
                        self.update_subscriber_gauge();
                    }
                }
                Command::Sync => {
                    if let Err(e) = self.persistence.sync() {
                        error!(error = %e, "periodic sync failed; will retry on next tick");
                    }
                }
                Command::Shutdown { done } => {
                    self.shutdown();
                    let _ = done.send(());
                    return;
                }
            }
        }
        // All handles dropped without an explicit shutdown.
        self.shutdown();
    }

    fn modify(&mut self, modification: Modification, done: oneshot::Sender<Result<(), StoreError>>) {
        match self.persistence.apply(&modification) {
            Ok(()) => {
                let root = Arc::new(self.persistence.value().clone());
                *self.current.write() = Arc::clone(&root);
                let _ = done.send(Ok(()));
                self.notify(modification.path(), &root);
            }
            Err(e) => {
                error!(error = %e, path = %modification.path(), "modification not applied");
                let _ = done.send(Err(e));
            }
        }
    }

    fn subscribe(&mut self, subscriber: Subscriber) {
        // Initial snapshot is the first message; the fresh channel always has
        // room for it.
        let root = self.current.read().clone();
        if subscriber.notify(&root).is_err() {
            debug!(path = %subscriber.path(), id = subscriber.id(), "subscriber gone before registration");
            return;
        }
        debug!(path = %subscriber.path(), id = subscriber.id(), "subscribed");
        self.tree.subscribe(subscriber);
        self.update_subscriber_gauge();
    }

    /// Fan the new root value out to every affected subscriber, dropping the
    /// ones whose channels are full or closed.
    fn notify(&mut self, changed_path: &Path, root: &Arc<Value>) {
        let mut dropped = Vec::new();
        for subscriber in self.tree.broadcast_targets(changed_path) {
            if subscriber.notify(root).is_err() {
                dropped.push((subscriber.path().clone(), subscriber.id()));
            }
        }
        for (path, id) in dropped {
            warn!(%path, id, "dropping unresponsive subscriber");
            self.tree.unsubscribe(&path, id);
        }
        self.update_subscriber_gauge();
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.persistence.sync() {
            error!(error = %e, "final sync failed at shutdown");
        }
        // Dropping the senders closes each subscriber's channel, which the
        // connection tasks observe as a disconnect.
        let drained = self.tree.drain();
        info!(subscribers = drained.len(), "store shut down");
        drop(drained);
        self.update_subscriber_gauge();
    }

    fn update_subscriber_gauge(&self) {
        self.metrics.subscriber_count.set(self.tree.len() as i64);
    }
}
