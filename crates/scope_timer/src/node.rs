//! Timer nodes and the arena that owns them
//!
//! The arena is internal to the crate: trees are only built by
//! [`RootScope`](crate::RootScope), and every `NodeId` a tree sees was handed
//! out by that same tree's `add_child`.

use crate::clock::{Clock, Stopwatch};
use crate::error::{Result, ScopeError};
use std::time::Duration;

/// Index of a node inside a [`TimerTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// One named timing scope.
#[derive(Debug, Clone)]
pub(crate) struct TimerNode {
    /// Display name, not unique among siblings
    name: String,
    /// Nesting level, root is 0
    depth: usize,
    /// Running measurement since creation
    stopwatch: Stopwatch,
    /// Set on the first release
    released: bool,
    /// Direct children in creation order
    children: Vec<NodeId>,
}

impl TimerNode {
    fn new(name: String, depth: usize, clock: &dyn Clock) -> Self {
        Self {
            name,
            depth,
            stopwatch: Stopwatch::start(clock),
            released: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Arena holding every node of one timing tree.
///
/// Node 0 is always the root. Nodes are only ever appended, and a parent
/// always exists before its children.
#[derive(Debug)]
pub(crate) struct TimerTree {
    nodes: Vec<TimerNode>,
    clock: Box<dyn Clock>,
    /// Set once the root is released; no nodes may be added afterwards
    closed: bool,
}

impl TimerTree {
    /// Id of the root node.
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Create a tree with a running root node.
    pub(crate) fn new(root_name: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        let root = TimerNode::new(root_name.into(), 0, clock.as_ref());
        Self {
            nodes: vec![root],
            clock,
            closed: false,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &TimerNode {
        &self.nodes[id.0]
    }

    pub(crate) fn root(&self) -> &TimerNode {
        self.node(Self::ROOT)
    }

    /// Number of nodes including the root.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over nodes in creation order.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &TimerNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Append a running child to `parent`.
    ///
    /// Fails with [`ScopeError::ScopeClosed`] once the root has been released.
    pub(crate) fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        let name = name.into();
        if self.closed {
            return Err(ScopeError::ScopeClosed {
                name,
                root: self.root().name.clone(),
            });
        }

        let depth = self.node(parent).depth + 1;
        let child = TimerNode::new(name, depth, self.clock.as_ref());
        let id = NodeId(self.nodes.len());
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Mark a node released, optionally freezing its measurement.
    ///
    /// Returns `false` if the node was already released; nothing changes then.
    pub(crate) fn release(&mut self, id: NodeId, freeze: bool) -> bool {
        let clock = self.clock.as_ref();
        let node = &mut self.nodes[id.0];
        if node.released {
            return false;
        }
        node.released = true;
        if freeze {
            node.stopwatch.freeze(clock);
        }
        true
    }

    /// Forbid any further children.
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Sample a node's total elapsed time.
    pub(crate) fn elapsed(&self, id: NodeId) -> Duration {
        self.node(id).stopwatch.sample(self.clock.as_ref())
    }
}
