//! In-memory hierarchical JSON document store.
//!
//! A single JSON document is addressed by [`Path`]s (sequences of object
//! keys) and mutated through [`Modification`]s (put or delete at a path).
//! All mutations flow through a single writer owned by the [`coordinator`],
//! which journals each modification before applying it, periodically rewrites
//! an atomic snapshot, and fans changes out to path subscribers.
//!
//! # Example
//!
//! ```ignore
//! use icepeak_store::{Modification, Path, Store, StoreConfig, StoreMetrics};
//!
//! let mut registry = prometheus_client::registry::Registry::default();
//! let metrics = std::sync::Arc::new(StoreMetrics::new(&mut registry));
//! let store = Store::spawn(StoreConfig::new("data.json"), metrics)?;
//!
//! store.modify(Modification::put(Path::from_uri("users/1"), serde_json::json!({"name": "Alice"}))).await?;
//! let mut subscription = store.subscribe(Path::from_uri("users")).await?;
//! let snapshot = subscription.next().await; // current value, then live updates
//! ```

pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod path;
pub mod persistence;
pub mod store;
pub mod subscription;
pub mod value;

pub use broadcast::{Subscriber, SubscriberId, Subscription};
pub use coordinator::{Store, StoreConfig, StoreHandle};
pub use error::StoreError;
pub use metrics::StoreMetrics;
pub use path::Path;
pub use store::{apply_modification, Modification};
pub use subscription::SubscriptionTree;

/// The JSON document type.
///
/// `serde_json` is built with `preserve_order` (object insertion order is
/// observable on serialization) and `arbitrary_precision` (numbers round-trip
/// through the snapshot and journal without precision loss).
pub type Value = serde_json::Value;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
