//! Path-trie of active subscribers.
//!
//! A modification at `changed_path` affects every subscriber whose path is a
//! prefix of, equal to, or an extension of `changed_path`. A trie keyed by
//! path segments answers that query in one walk: collect subscribers at every
//! node on the way down (prefixes), then collect the whole subtree under the
//! final reached node (equal + extensions). If the trie does not extend as
//! deep as the changed path, only prefix subscribers match.

use crate::broadcast::{Subscriber, SubscriberId};
use crate::path::Path;
use std::collections::HashMap;

/// Trie of subscribers keyed by path segments.
#[derive(Debug, Default)]
pub struct SubscriptionTree {
    root: Node,
    len: usize,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    subscribers: HashMap<SubscriberId, Subscriber>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.subscribers.is_empty()
    }

    fn collect_subtree<'a>(&'a self, out: &mut Vec<&'a Subscriber>) {
        out.extend(self.subscribers.values());
        for child in self.children.values() {
            child.collect_subtree(out);
        }
    }
}

impl SubscriptionTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        SubscriptionTree::default()
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a subscriber at its path, keyed by its id.
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        let mut node = &mut self.root;
        for segment in subscriber.path().segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        if node.subscribers.insert(subscriber.id(), subscriber).is_none() {
            self.len += 1;
        }
    }

    /// Remove the subscriber with `id` at `path`, pruning empty nodes.
    ///
    /// Returns whether a subscriber was removed.
    pub fn unsubscribe(&mut self, path: &Path, id: SubscriberId) -> bool {
        let removed = remove_at(&mut self.root, path.segments(), id);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// All subscribers affected by a modification at `changed_path`.
    pub fn broadcast_targets(&self, changed_path: &Path) -> Vec<&Subscriber> {
        let mut out = Vec::new();
        let mut node = &self.root;
        for segment in changed_path.segments() {
            out.extend(node.subscribers.values());
            match node.children.get(segment) {
                Some(child) => node = child,
                // The trie stops above the changed path: only the prefix
                // subscribers collected so far are affected.
                None => return out,
            }
        }
        node.collect_subtree(&mut out);
        out
    }

    /// Remove and return all subscribers (used at shutdown so their channels
    /// close and connections observe the disconnect).
    pub fn drain(&mut self) -> Vec<Subscriber> {
        let mut out = Vec::new();
        drain_node(std::mem::take(&mut self.root), &mut out);
        self.len = 0;
        out
    }
}

fn drain_node(node: Node, out: &mut Vec<Subscriber>) {
    out.extend(node.subscribers.into_values());
    for (_, child) in node.children {
        drain_node(child, out);
    }
}

fn remove_at(node: &mut Node, segments: &[String], id: SubscriberId) -> bool {
    match segments.split_first() {
        None => node.subscribers.remove(&id).is_some(),
        Some((head, rest)) => {
            let Some(child) = node.children.get_mut(head) else {
                return false;
            };
            let removed = remove_at(child, rest, id);
            if child.is_empty() {
                node.children.remove(head);
            }
            removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn subscriber(id: SubscriberId, uri: &str) -> Subscriber {
        let (tx, rx) = mpsc::channel(1);
        // Keep the receiver alive for the duration of the test.
        std::mem::forget(rx);
        Subscriber::new(id, Path::from_uri(uri), tx)
    }

    fn target_ids(tree: &SubscriptionTree, uri: &str) -> Vec<SubscriberId> {
        let mut ids: Vec<_> = tree
            .broadcast_targets(&Path::from_uri(uri))
            .iter()
            .map(|s| s.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn collects_prefix_equal_and_extension_subscribers() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(0, ""));
        tree.subscribe(subscriber(1, "a"));
        tree.subscribe(subscriber(2, "a/b"));
        tree.subscribe(subscriber(3, "a/b/c"));
        tree.subscribe(subscriber(4, "a/x"));
        tree.subscribe(subscriber(5, "other"));

        // Root and "a" are prefixes; "a/b" is equal; "a/b/c" is an extension.
        assert_eq!(target_ids(&tree, "a/b"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn modification_below_trie_depth_hits_prefixes_only() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, "a"));
        tree.subscribe(subscriber(2, "a/b"));

        assert_eq!(target_ids(&tree, "a/b/deep/deeper"), vec![1, 2]);
    }

    #[test]
    fn unrelated_branch_terminates_early() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, "a/b"));

        assert_eq!(target_ids(&tree, "x/y"), Vec::<SubscriberId>::new());
        // Sibling branch under a shared parent node.
        assert_eq!(target_ids(&tree, "a/z"), Vec::<SubscriberId>::new());
    }

    #[test]
    fn root_modification_reaches_everyone() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, "a"));
        tree.subscribe(subscriber(2, "b/c"));

        assert_eq!(target_ids(&tree, ""), vec![1, 2]);
    }

    #[test]
    fn subscribers_sharing_a_path_are_independent() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, "a"));
        tree.subscribe(subscriber(2, "a"));
        assert_eq!(tree.len(), 2);

        assert!(tree.unsubscribe(&Path::from_uri("a"), 1));
        assert_eq!(target_ids(&tree, "a"), vec![2]);
    }

    #[test]
    fn unsubscribe_prunes_empty_branches() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, "a/b/c"));
        assert!(tree.unsubscribe(&Path::from_uri("a/b/c"), 1));
        assert!(tree.is_empty());
        // The pruned branch no longer short-circuits unrelated lookups.
        assert_eq!(target_ids(&tree, "a/b/c"), Vec::<SubscriberId>::new());
        // Unsubscribing again is a no-op.
        assert!(!tree.unsubscribe(&Path::from_uri("a/b/c"), 1));
    }

    #[test]
    fn drain_returns_all_subscribers() {
        let mut tree = SubscriptionTree::new();
        tree.subscribe(subscriber(1, ""));
        tree.subscribe(subscriber(2, "a"));
        tree.subscribe(subscriber(3, "a/b"));

        let mut drained: Vec<_> = tree.drain().iter().map(Subscriber::id).collect();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(tree.is_empty());
    }

    #[test]
    fn notify_reports_full_and_closed_channels() {
        let (tx, mut rx) = mpsc::channel(1);
        let sub = Subscriber::new(7, Path::from_uri("a"), tx);
        let value = Arc::new(crate::Value::Null);

        assert!(sub.notify(&value).is_ok());
        // Channel capacity exhausted.
        assert!(sub.notify(&value).is_err());

        rx.close();
        assert!(sub.notify(&value).is_err());
    }
}
