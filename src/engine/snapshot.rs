//! Live input state
//!
//! The snapshot holds the latest raw value of every signal that has
//! reported at least once, mirroring the shape of the input layout.
//! Values appear on the first event per signal and are overwritten on
//! every later one; nothing is ever removed.

use std::collections::BTreeMap;

use log::warn;

use super::path::{resolve, TreeNode};

/// One node of the snapshot tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotNode {
    /// A raw signal value.
    Value(f64),
    /// Named sub-signals of a category.
    Group(BTreeMap<String, SnapshotNode>),
}

impl<'a> TreeNode for &'a SnapshotNode {
    fn child(self, segment: &str) -> Option<Self> {
        match self {
            SnapshotNode::Value(_) => None,
            SnapshotNode::Group(children) => children.get(segment),
        }
    }
}

/// Latest raw values, keyed by category and signal.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: SnapshotNode,
}

impl Snapshot {
    /// Create an empty snapshot; values appear as events arrive.
    pub fn new() -> Self {
        Self {
            root: SnapshotNode::Group(BTreeMap::new()),
        }
    }

    /// Store a raw value, creating intermediate groups as needed.
    pub fn store(&mut self, path: &str, value: f64) {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            warn!("empty snapshot path ignored");
            return;
        }
        if let SnapshotNode::Group(children) = &mut self.root {
            store_into(children, &segments, value);
        }
    }

    /// The current value at `path`, if a numeric leaf is reachable.
    ///
    /// Resolution tolerates trailing path segments beyond a leaf (the
    /// deepest reached node is inspected), so a rule path like
    /// `orientation.alpha.0` still reads the alpha value.
    pub fn value(&self, path: &str) -> Option<f64> {
        match resolve(&self.root, path).node() {
            SnapshotNode::Value(value) => Some(*value),
            SnapshotNode::Group(_) => None,
        }
    }

    /// Whether any signal has reported yet.
    pub fn is_empty(&self) -> bool {
        match &self.root {
            SnapshotNode::Group(children) => children.is_empty(),
            SnapshotNode::Value(_) => false,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

fn store_into(children: &mut BTreeMap<String, SnapshotNode>, segments: &[&str], value: f64) {
    match segments {
        [] => {}
        [leaf] => {
            children.insert((*leaf).to_string(), SnapshotNode::Value(value));
        }
        [head, rest @ ..] => {
            let entry = children
                .entry((*head).to_string())
                .or_insert_with(|| SnapshotNode::Group(BTreeMap::new()));
            if matches!(entry, SnapshotNode::Value(_)) {
                // A category that was scalar is now grouped; the group wins.
                *entry = SnapshotNode::Group(BTreeMap::new());
            }
            if let SnapshotNode::Group(grandchildren) = entry {
                store_into(grandchildren, rest, value);
            }
        }
    }
}
