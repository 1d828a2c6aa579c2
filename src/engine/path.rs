//! Dot-path resolution over nested trees
//!
//! The routing configuration and the input snapshot are both addressed by
//! dot-separated paths like `orientation.alpha`. Resolution never fails:
//! when a segment cannot be descended the walk stops and the deepest node
//! actually reached is handed back, so callers must be prepared for a
//! result that is not the leaf type they expected.

use log::debug;

/// Tree navigation for dot-path resolution.
///
/// Implemented by lightweight reference views: groups look the segment up
/// as a named field, sequences parse it as an integer index.
pub trait TreeNode: Copy {
    /// Descend one segment, if possible.
    fn child(self, segment: &str) -> Option<Self>;
}

/// Outcome of a path resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<N> {
    /// Every segment of the path was matched.
    Full(N),
    /// The walk stopped early after descending `matched` segments.
    Partial { node: N, matched: usize },
}

impl<N: Copy> Resolved<N> {
    /// The resolved node, whether full or partial.
    pub fn node(&self) -> N {
        match *self {
            Resolved::Full(node) => node,
            Resolved::Partial { node, .. } => node,
        }
    }

    /// Whether the whole path was matched.
    pub fn is_full(&self) -> bool {
        matches!(self, Resolved::Full(_))
    }
}

/// Walk `root` along a dot-separated `path`.
///
/// An empty path returns the root unchanged.
pub fn resolve<N: TreeNode>(root: N, path: &str) -> Resolved<N> {
    if path.is_empty() {
        debug!("empty path resolved to the root node");
        return Resolved::Full(root);
    }

    let mut node = root;
    let mut matched = 0;
    for segment in path.split('.') {
        match node.child(segment) {
            Some(next) => {
                node = next;
                matched += 1;
            }
            None => return Resolved::Partial { node, matched },
        }
    }
    Resolved::Full(node)
}
