//! End-to-end tests of the store coordinator: mutations, subscriptions,
//! durability, and shutdown behavior through the public handle.

use icepeak_store::{Modification, Path, Store, StoreConfig, StoreHandle, StoreMetrics};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn spawn_store(config: StoreConfig) -> StoreHandle {
    Store::spawn(config, Arc::new(StoreMetrics::default())).expect("store should spawn")
}

fn config_in(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path().join("data.json")).with_journal(dir.path().join("journal"))
}

#[tokio::test]
async fn put_then_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    store
        .modify(Modification::put(
            Path::from_uri("users/1"),
            json!({"name": "Alice"}),
        ))
        .await
        .unwrap();

    assert_eq!(
        store.get(&Path::from_uri("users/1")),
        Some(json!({"name": "Alice"}))
    );
    assert_eq!(
        store.get(&Path::from_uri("users/1/name")),
        Some(json!("Alice"))
    );
    assert_eq!(store.get(&Path::from_uri("users/2")), None);
}

#[tokio::test]
async fn delete_removes_key() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    store
        .modify(Modification::put(
            Path::from_uri("a"),
            json!({"b": 1, "c": 2}),
        ))
        .await
        .unwrap();
    store
        .modify(Modification::delete(Path::from_uri("a/b")))
        .await
        .unwrap();

    assert_eq!(store.get(&Path::from_uri("a")), Some(json!({"c": 2})));
}

#[tokio::test]
async fn put_overwrites_non_object_intermediate() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    store
        .modify(Modification::put(Path::from_uri("x"), json!(5)))
        .await
        .unwrap();
    store
        .modify(Modification::put(Path::from_uri("x/y"), json!(7)))
        .await
        .unwrap();

    assert_eq!(store.get(&Path::from_uri("x")), Some(json!({"y": 7})));
}

#[tokio::test]
async fn modifications_apply_in_submission_order() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    for i in 0..50i64 {
        store
            .modify(Modification::put(Path::from_uri("counter"), json!(i)))
            .await
            .unwrap();
    }
    assert_eq!(store.get(&Path::from_uri("counter")), Some(json!(49)));
}

#[tokio::test]
async fn subscriber_receives_initial_snapshot_first() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    store
        .modify(Modification::put(Path::from_uri("greeting"), json!("hi")))
        .await
        .unwrap();

    let mut subscription = store.subscribe(Path::from_uri("greeting")).await.unwrap();
    let root = subscription.next().await.expect("initial snapshot");
    assert_eq!(subscription.payload(&root), r#""hi""#);
}

#[tokio::test]
async fn absent_subscription_path_yields_null_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut subscription = store.subscribe(Path::from_uri("not/there")).await.unwrap();
    let root = subscription.next().await.expect("initial snapshot");
    assert_eq!(subscription.payload(&root), "null");
}

#[tokio::test]
async fn fan_out_delivers_extracted_subvalues() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut at_a = store.subscribe(Path::from_uri("a")).await.unwrap();
    let mut at_ab = store.subscribe(Path::from_uri("a/b")).await.unwrap();
    // Consume the initial snapshots.
    at_a.next().await.unwrap();
    at_ab.next().await.unwrap();

    store
        .modify(Modification::put(Path::from_uri("a/b/c"), json!(1)))
        .await
        .unwrap();

    let root = at_a.next().await.expect("update at a");
    assert_eq!(at_a.payload(&root), r#"{"b":{"c":1}}"#);
    let root = at_ab.next().await.expect("update at a/b");
    assert_eq!(at_ab.payload(&root), r#"{"c":1}"#);
}

#[tokio::test]
async fn unrelated_modification_does_not_notify() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut subscription = store.subscribe(Path::from_uri("a/b")).await.unwrap();
    subscription.next().await.unwrap();

    store
        .modify(Modification::put(Path::from_uri("x"), json!(1)))
        .await
        .unwrap();
    store
        .modify(Modification::put(Path::from_uri("a/b"), json!(2)))
        .await
        .unwrap();

    // The next update is for a/b; the write to x never produced one.
    let root = subscription.next().await.unwrap();
    assert_eq!(subscription.payload(&root), "2");
}

#[tokio::test]
async fn subscriber_registered_before_modification_sees_it() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut subscription = store.subscribe(Path::from_uri("k")).await.unwrap();
    store
        .modify(Modification::put(Path::from_uri("k"), json!(1)))
        .await
        .unwrap();

    // Snapshot from before the write, then the write itself.
    let snapshot = subscription.next().await.unwrap();
    assert_eq!(subscription.payload(&snapshot), "null");
    let update = subscription.next().await.unwrap();
    assert_eq!(subscription.payload(&update), "1");
}

#[tokio::test]
async fn slow_subscriber_is_dropped() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.subscriber_buffer = 1;
    let store = spawn_store(config);

    let mut subscription = store.subscribe(Path::from_uri("k")).await.unwrap();
    // The initial snapshot fills the buffer; the first update cannot be
    // enqueued and the subscriber is dropped.
    store
        .modify(Modification::put(Path::from_uri("k"), json!(1)))
        .await
        .unwrap();
    store
        .modify(Modification::put(Path::from_uri("k"), json!(2)))
        .await
        .unwrap();

    let first = subscription.next().await;
    assert!(first.is_some(), "buffered snapshot is still delivered");
    assert!(
        subscription.next().await.is_none(),
        "channel closes once the subscriber is dropped"
    );
}

#[tokio::test]
async fn unsubscribe_stops_notifications() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut subscription = store.subscribe(Path::from_uri("k")).await.unwrap();
    subscription.next().await.unwrap();
    subscription.unsubscribe().await;

    // The writer processed the unsubscribe before this modification.
    store
        .modify(Modification::put(Path::from_uri("k"), json!(1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn journal_replay_across_restart() {
    let dir = TempDir::new().unwrap();

    std::fs::write(dir.path().join("data.json"), r#"{"k":0}"#).unwrap();
    std::fs::write(
        dir.path().join("journal"),
        concat!(
            r#"{"op":"put","path":["k"],"value":1}"#,
            "\n",
            r#"{"op":"put","path":["k"],"value":2}"#,
            "\n",
        ),
    )
    .unwrap();

    let store = spawn_store(config_in(&dir));
    assert_eq!(store.get(&Path::from_uri("k")), Some(json!(2)));

    // Recovery synced: snapshot holds the replayed state, journal is empty.
    assert_eq!(
        std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
        r#"{"k":2}"#
    );
    assert_eq!(std::fs::metadata(dir.path().join("journal")).unwrap().len(), 0);
}

#[tokio::test]
async fn shutdown_syncs_and_disconnects_subscribers() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    let mut subscription = store.subscribe(Path::from_uri("k")).await.unwrap();
    subscription.next().await.unwrap();

    store
        .modify(Modification::put(Path::from_uri("k"), json!(42)))
        .await
        .unwrap();
    subscription.next().await.unwrap();

    store.shutdown().await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
        r#"{"k":42}"#
    );
    assert_eq!(std::fs::metadata(dir.path().join("journal")).unwrap().len(), 0);
    assert!(
        subscription.next().await.is_none(),
        "subscriber channels close at shutdown"
    );
    assert!(store
        .modify(Modification::put(Path::from_uri("k"), json!(0)))
        .await
        .is_err());
}

#[tokio::test]
async fn explicit_sync_truncates_journal() {
    let dir = TempDir::new().unwrap();
    let store = spawn_store(config_in(&dir));

    store
        .modify(Modification::put(Path::from_uri("a"), json!(1)))
        .await
        .unwrap();
    assert!(std::fs::metadata(dir.path().join("journal")).unwrap().len() > 0);

    store.sync().await.unwrap();
    // Sync is processed behind the modify on the same queue; a follow-up
    // acknowledged command proves it has run.
    store
        .modify(Modification::put(Path::from_uri("a"), json!(1)))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
        r#"{"a":1}"#
    );
}
