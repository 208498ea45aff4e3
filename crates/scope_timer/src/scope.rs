//! Scope handles
//!
//! [`RootScope`] owns a timing tree and its sink. [`Scope`] is a borrowed
//! handle on one child node. Both release on drop; releasing the root
//! renders the report and writes it to the sink.
//!
//! Handles borrow their parent, so a child handle cannot outlive the handle
//! it was opened from and the root cannot be dropped while children are
//! open. Everything is single-threaded: handles are neither `Send` nor `Sync`.
//!
//! The node arena behind a root is private, so node ids from one tree can
//! never be handed to another:
//!
//! ```compile_fail
//! use scope_timer::node::TimerTree;
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::{ReportConfig, UnreleasedPolicy};
use crate::error::Result;
use crate::node::{NodeId, TimerTree};
use crate::report::{Report, ReportRenderer};
use crate::sink::ReportSink;
use std::cell::RefCell;
use std::time::Duration;

/// Name used by [`RootScope::start_default`].
pub const DEFAULT_ROOT_NAME: &str = "*";

/// Operations shared by root and child handles.
pub trait TimedScope {
    /// Scope name.
    fn name(&self) -> String;

    /// Nesting level, root is 0.
    fn depth(&self) -> usize;

    /// Current total elapsed time. A pure read.
    fn elapsed(&self) -> Duration;

    /// Whether the scope has been released.
    fn is_released(&self) -> bool;

    /// Open a nested scope, appended after any existing siblings.
    fn start_child(&self, name: impl Into<String>) -> Result<Scope<'_>>;

    /// Close the scope. Safe to call more than once.
    fn release(&self) -> Result<()>;
}

/// State shared by every handle of one tree.
struct Shared {
    tree: RefCell<TimerTree>,
    sink: RefCell<Box<dyn ReportSink>>,
    config: ReportConfig,
}

impl Shared {
    fn name(&self, id: NodeId) -> String {
        self.tree.borrow().node(id).name().to_string()
    }

    fn depth(&self, id: NodeId) -> usize {
        self.tree.borrow().node(id).depth()
    }

    fn elapsed(&self, id: NodeId) -> Duration {
        self.tree.borrow().elapsed(id)
    }

    fn is_released(&self, id: NodeId) -> bool {
        self.tree.borrow().node(id).is_released()
    }

    fn open(&self, parent: NodeId, name: String) -> Result<Scope<'_>> {
        let id = self.tree.borrow_mut().add_child(parent, name)?;
        let tree = self.tree.borrow();
        let node = tree.node(id);
        tracing::trace!(
            target: "scope_timer",
            scope = node.name(),
            depth = node.depth(),
            "scope started"
        );
        Ok(Scope { shared: self, id })
    }

    fn release_child(&self, id: NodeId) {
        let mut tree = self.tree.borrow_mut();
        if tree.release(id, self.config.freezes_on_release()) {
            tracing::trace!(
                target: "scope_timer",
                scope = tree.node(id).name(),
                "scope released"
            );
        }
    }

    /// Freeze the root, close the tree, render, and write to the sink.
    fn release_root(&self) -> Result<()> {
        {
            let mut tree = self.tree.borrow_mut();
            if !tree.release(TimerTree::ROOT, true) {
                return Ok(());
            }
            tree.close();
        }

        let tree = self.tree.borrow();
        tracing::trace!(
            target: "scope_timer",
            scope = tree.root().name(),
            "root scope released"
        );
        let report = ReportRenderer::new(&self.config).render(&tree)?;

        let mut sink = self.sink.borrow_mut();
        for line in &report.lines {
            sink.append(&line.format(&self.config))?;
        }
        sink.flush()?;
        Ok(())
    }
}

// =============================================================================
// Root Scope
// =============================================================================

/// The outermost scope of a timing tree.
///
/// # Example
///
/// ```rust
/// use scope_timer::{RootScope, SharedBuffer};
///
/// let buffer = SharedBuffer::new();
/// {
///     let root = RootScope::start("load", buffer.clone());
///     {
///         let parse = root.start_child("parse").unwrap();
///         let _validate = parse.start_child("validate").unwrap();
///     }
/// } // report written here
///
/// let lines = buffer.lines();
/// assert_eq!(lines.len(), 5);
/// assert!(lines[0].starts_with("load"));
/// assert!(lines[2].starts_with("        validate"));
/// ```
pub struct RootScope {
    shared: Shared,
}

impl RootScope {
    /// Start a root scope on the system clock with the default layout.
    pub fn start<S>(name: impl Into<String>, sink: S) -> Self
    where
        S: ReportSink + 'static,
    {
        Self::start_with(name, sink, SystemClock::new(), ReportConfig::default())
    }

    /// Start a root scope named [`DEFAULT_ROOT_NAME`].
    pub fn start_default<S>(sink: S) -> Self
    where
        S: ReportSink + 'static,
    {
        Self::start(DEFAULT_ROOT_NAME, sink)
    }

    /// Start a root scope with an explicit clock and configuration.
    pub fn start_with<S, C>(name: impl Into<String>, sink: S, clock: C, config: ReportConfig) -> Self
    where
        S: ReportSink + 'static,
        C: Clock + 'static,
    {
        let tree = TimerTree::new(name, Box::new(clock));
        tracing::trace!(
            target: "scope_timer",
            scope = tree.root().name(),
            "root scope started"
        );
        Self {
            shared: Shared {
                tree: RefCell::new(tree),
                sink: RefCell::new(Box::new(sink)),
                config,
            },
        }
    }

    pub fn name(&self) -> String {
        self.shared.name(TimerTree::ROOT)
    }

    pub fn depth(&self) -> usize {
        0
    }

    pub fn elapsed(&self) -> Duration {
        self.shared.elapsed(TimerTree::ROOT)
    }

    pub fn is_released(&self) -> bool {
        self.shared.is_released(TimerTree::ROOT)
    }

    pub fn config(&self) -> &ReportConfig {
        &self.shared.config
    }

    /// Open a direct child of the root.
    ///
    /// Fails with [`ScopeError::ScopeClosed`](crate::ScopeError::ScopeClosed)
    /// once the root has been released.
    pub fn start_child(&self, name: impl Into<String>) -> Result<Scope<'_>> {
        self.shared.open(TimerTree::ROOT, name.into())
    }

    /// Freeze the root's measurement and write the report to the sink.
    ///
    /// Only the first call renders; it returns the render or sink error, if
    /// any. Later calls do nothing and return `Ok(())`.
    pub fn release(&self) -> Result<()> {
        self.shared.release_root()
    }

    /// Render the tree as it stands, without releasing or writing anything.
    pub fn snapshot(&self) -> Result<Report> {
        let tree = self.shared.tree.borrow();
        ReportRenderer::new(&self.shared.config)
            .with_unreleased_policy(UnreleasedPolicy::Allow)
            .render(&tree)
    }

    /// Release explicitly and drop the handle.
    pub fn finish(self) -> Result<()> {
        self.release()
    }
}

impl TimedScope for RootScope {
    fn name(&self) -> String {
        RootScope::name(self)
    }

    fn depth(&self) -> usize {
        RootScope::depth(self)
    }

    fn elapsed(&self) -> Duration {
        RootScope::elapsed(self)
    }

    fn is_released(&self) -> bool {
        RootScope::is_released(self)
    }

    fn start_child(&self, name: impl Into<String>) -> Result<Scope<'_>> {
        RootScope::start_child(self, name)
    }

    fn release(&self) -> Result<()> {
        RootScope::release(self)
    }
}

impl Drop for RootScope {
    fn drop(&mut self) {
        if let Err(err) = self.shared.release_root() {
            tracing::error!(
                target: "scope_timer",
                error = %err,
                "failed to write timing report"
            );
        }
    }
}

impl std::fmt::Debug for RootScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootScope")
            .field("name", &self.name())
            .field("released", &self.is_released())
            .finish()
    }
}

// =============================================================================
// Child Scope
// =============================================================================

/// A nested scope. Releases itself on drop.
///
/// Releasing a child never renders anything. Under the default
/// [`FreezePolicy::OnRelease`](crate::FreezePolicy::OnRelease) its measurement
/// stops at release; under
/// [`FreezePolicy::RootOnly`](crate::FreezePolicy::RootOnly) it keeps running
/// and is sampled when the root renders.
pub struct Scope<'a> {
    shared: &'a Shared,
    id: NodeId,
}

impl<'a> Scope<'a> {
    pub fn name(&self) -> String {
        self.shared.name(self.id)
    }

    pub fn depth(&self) -> usize {
        self.shared.depth(self.id)
    }

    pub fn elapsed(&self) -> Duration {
        self.shared.elapsed(self.id)
    }

    pub fn is_released(&self) -> bool {
        self.shared.is_released(self.id)
    }

    /// Open a nested scope one level deeper.
    pub fn start_child(&self, name: impl Into<String>) -> Result<Scope<'_>> {
        self.shared.open(self.id, name.into())
    }

    /// Mark released. Never fails; the `Result` matches [`TimedScope`].
    pub fn release(&self) -> Result<()> {
        self.shared.release_child(self.id);
        Ok(())
    }
}

impl TimedScope for Scope<'_> {
    fn name(&self) -> String {
        Scope::name(self)
    }

    fn depth(&self) -> usize {
        Scope::depth(self)
    }

    fn elapsed(&self) -> Duration {
        Scope::elapsed(self)
    }

    fn is_released(&self) -> bool {
        Scope::is_released(self)
    }

    fn start_child(&self, name: impl Into<String>) -> Result<Scope<'_>> {
        Scope::start_child(self, name)
    }

    fn release(&self) -> Result<()> {
        Scope::release(self)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.shared.release_child(self.id);
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name())
            .field("depth", &self.depth())
            .field("released", &self.is_released())
            .finish()
    }
}
