//! Hierarchical Scoped Timing
//!
//! This crate measures nested units of work and prints where the time went:
//! - A tree of named scopes, each timing itself from the moment it opens
//! - RAII handles: children release on drop, the root renders on drop
//! - An indented report with each scope's total and, for every scope with
//!   children, a `Rest` line holding the time not covered by them
//!
//! A tree belongs to one thread. Handles are not `Send`, and the engine keeps
//! no global state: every tree is independent.
//!
//! # Example
//!
//! ```rust
//! use scope_timer::{ManualClock, ReportConfig, RootScope, SharedBuffer};
//!
//! let clock = ManualClock::new();
//! let report = SharedBuffer::new();
//!
//! {
//!     let load = RootScope::start_with("A", report.clone(), clock.clone(), ReportConfig::default());
//!     clock.advance_ms(10);
//!     let parse = load.start_child("B").unwrap();
//!     clock.advance_ms(15);
//!     let _validate = parse.start_child("C").unwrap();
//!     clock.advance_ms(5);
//! }
//!
//! assert_eq!(
//!     report.contents(),
//!     "A                   : 30\n\
//!      \x20   B               : 20\n\
//!      \x20       C           : 5\n\
//!      \x20       Rest        : 15\n\
//!      \x20   Rest            : 10\n"
//! );
//! ```
//!
//! # Modules
//!
//! - [`clock`] - Time sources and the per-scope stopwatch
//! - [`scope`] - Root and child scope handles
//! - [`report`] - Report rendering and formatting
//! - [`sink`] - Report destinations
//! - [`config`] - Layout and release policies
//! - [`ScopeError`] - Error type shared by every fallible operation

pub mod clock;
pub mod config;
mod error;
mod node;
pub mod report;
pub mod scope;
pub mod sink;

#[cfg(test)]
mod test_log;

pub use clock::{Clock, ManualClock, Stopwatch, SystemClock};
pub use config::{FreezePolicy, ReportConfig, UnreleasedPolicy};
pub use error::{Result, ScopeError};
pub use report::{LineKind, Report, ReportLine};
pub use scope::{RootScope, Scope, TimedScope, DEFAULT_ROOT_NAME};
pub use sink::{IoSink, ReportSink, SharedBuffer, TracingSink};

/// Re-export for convenience
pub use std::time::Duration;

/// Open a child scope bound to a local that lives until the end of the block.
///
/// Expands to a `?`, so the enclosing function must return a `Result` whose
/// error converts from [`ScopeError`].
///
/// # Example
///
/// ```rust
/// use scope_timer::{time_scope, RootScope, SharedBuffer};
///
/// fn parse(root: &RootScope) -> scope_timer::Result<()> {
///     time_scope!(root, "parse");
///     // ... parsing ...
///     Ok(())
/// }
///
/// let buffer = SharedBuffer::new();
/// let root = RootScope::start("load", buffer.clone());
/// parse(&root).unwrap();
/// root.finish().unwrap();
/// assert_eq!(buffer.lines().len(), 3);
/// ```
#[macro_export]
macro_rules! time_scope {
    ($parent:expr, $name:expr) => {
        let _scope = $parent.start_child($name)?;
    };
}
