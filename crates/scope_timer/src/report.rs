//! Report rendering
//!
//! Walks a scope tree depth-first. Each node contributes its own line
//! before its children's lines; a node with children then contributes one
//! trailing self-time line:
//!
//! ```text
//! load                : 30
//!     parse           : 20
//!         validate    : 5
//!         Rest        : 15
//!     Rest            : 10
//! ```
//!
//! Self-time is `total - sum(children totals)` in whole milliseconds and is
//! never clamped. A negative value means some child was sampled later than
//! its parent froze.

use crate::config::{ReportConfig, UnreleasedPolicy};
use crate::error::{Result, ScopeError};
use crate::node::{NodeId, TimerTree};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Report Lines
// =============================================================================

/// Kind of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Total elapsed time of a scope
    Scope,
    /// Self-time of the enclosing scope
    Rest,
}

/// One line of a rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    /// Indentation level
    pub depth: usize,
    /// Scope name, or the rest label
    pub label: String,
    /// Whole milliseconds, negative only for self-time anomalies
    pub millis: i64,
    pub kind: LineKind,
}

impl ReportLine {
    /// Format as `<indent><label>` padded to the name column, then `: <millis>`.
    pub fn format(&self, config: &ReportConfig) -> String {
        let intro = format!(
            "{}{}",
            " ".repeat(self.depth * config.indent_width),
            self.label
        );
        format!(
            "{:<width$}: {}\n",
            intro,
            self.millis,
            width = config.name_column_width
        )
    }
}

// =============================================================================
// Report
// =============================================================================

/// A rendered timing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Name of the root scope
    pub root: String,
    /// Lines in output order
    pub lines: Vec<ReportLine>,
    /// Scopes that were still open when sampled, in creation order
    pub unreleased: Vec<String>,
}

impl Report {
    fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            lines: Vec::new(),
            unreleased: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total of the root scope in milliseconds.
    pub fn total_millis(&self) -> i64 {
        self.lines.first().map(|line| line.millis).unwrap_or(0)
    }

    /// Self-time lines only.
    pub fn rest_lines(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(|line| line.kind == LineKind::Rest)
    }

    /// Scope lines with the given name.
    pub fn find(&self, name: &str) -> Vec<&ReportLine> {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::Scope && line.label == name)
            .collect()
    }

    /// The formatted report, exactly as written to a sink.
    pub fn to_text(&self, config: &ReportConfig) -> String {
        self.lines.iter().map(|line| line.format(config)).collect()
    }

    /// Export to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Turns a timer tree into a [`Report`].
#[derive(Debug, Clone)]
pub(crate) struct ReportRenderer<'a> {
    config: &'a ReportConfig,
    unreleased_policy: UnreleasedPolicy,
}

impl<'a> ReportRenderer<'a> {
    /// Create a renderer applying the config's unreleased-scope policy.
    pub(crate) fn new(config: &'a ReportConfig) -> Self {
        Self {
            config,
            unreleased_policy: config.unreleased_policy,
        }
    }

    /// Override the unreleased-scope policy for this renderer only.
    pub(crate) fn with_unreleased_policy(mut self, policy: UnreleasedPolicy) -> Self {
        self.unreleased_policy = policy;
        self
    }

    /// Render the whole tree.
    ///
    /// Every node is sampled exactly once, so a child's own line and the
    /// value subtracted from its parent always agree. The root is never
    /// reported as unreleased.
    pub(crate) fn render(&self, tree: &TimerTree) -> Result<Report> {
        let mut report = Report::new(tree.root().name());
        self.render_node(tree, TimerTree::ROOT, &mut report)?;

        tracing::debug!(
            target: "scope_timer",
            root = %report.root,
            lines = report.len(),
            unreleased = report.unreleased.len(),
            "report rendered"
        );

        Ok(report)
    }

    /// Emit the node's line, its subtree, then its self-time line.
    /// Returns the node's total in milliseconds.
    fn render_node(&self, tree: &TimerTree, id: NodeId, report: &mut Report) -> Result<i64> {
        let node = tree.node(id);
        if id != TimerTree::ROOT && !node.is_released() {
            self.note_unreleased(node.name())?;
            report.unreleased.push(node.name().to_string());
        }

        let total = duration_millis(tree.elapsed(id));
        report.lines.push(ReportLine {
            depth: node.depth(),
            label: node.name().to_string(),
            millis: total,
            kind: LineKind::Scope,
        });

        if !node.has_children() {
            return Ok(total);
        }

        let mut children_total = 0i64;
        for &child in node.children() {
            children_total += self.render_node(tree, child, report)?;
        }

        report.lines.push(ReportLine {
            depth: node.depth() + 1,
            label: self.config.rest_label.clone(),
            millis: total - children_total,
            kind: LineKind::Rest,
        });

        Ok(total)
    }

    fn note_unreleased(&self, name: &str) -> Result<()> {
        match self.unreleased_policy {
            UnreleasedPolicy::Allow => {
                tracing::debug!(target: "scope_timer", scope = name, "sampling unreleased scope");
            }
            UnreleasedPolicy::Warn => {
                tracing::warn!(target: "scope_timer", scope = name, "sampling unreleased scope");
            }
            UnreleasedPolicy::Reject => {
                return Err(ScopeError::UnreleasedScope {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Whole milliseconds, truncated.
fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn line(depth: usize, label: &str, millis: i64, kind: LineKind) -> ReportLine {
        ReportLine {
            depth,
            label: label.to_string(),
            millis,
            kind,
        }
    }

    #[test]
    fn test_format_pads_name_column() {
        let config = ReportConfig::default();
        assert_eq!(
            line(0, "A", 30, LineKind::Scope).format(&config),
            "A                   : 30\n"
        );
        assert_eq!(
            line(2, "Rest", 15, LineKind::Rest).format(&config),
            "        Rest        : 15\n"
        );
    }

    #[test]
    fn test_format_long_name_not_truncated() {
        let config = ReportConfig::default();
        let formatted = line(1, "a_rather_long_scope_name", 7, LineKind::Scope).format(&config);
        assert_eq!(formatted, "    a_rather_long_scope_name: 7\n");
    }

    #[test]
    fn test_format_negative_value() {
        let config = ReportConfig::default();
        assert_eq!(
            line(1, "Rest", -8, LineKind::Rest).format(&config),
            "    Rest            : -8\n"
        );
    }

    #[test]
    fn test_format_custom_layout() {
        let config = ReportConfig::default()
            .with_indent_width(2)
            .with_name_column_width(8);
        assert_eq!(line(1, "io", 3, LineKind::Scope).format(&config), "  io    : 3\n");
    }

    #[test]
    fn test_render_leaf_root() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("solo", Box::new(clock.clone()));
        clock.advance_ms(12);
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::default();
        let report = ReportRenderer::new(&config).render(&tree).unwrap();
        assert_eq!(report.lines, vec![line(0, "solo", 12, LineKind::Scope)]);
        assert_eq!(report.total_millis(), 12);
        assert!(report.unreleased.is_empty());
    }

    #[test]
    fn test_render_siblings_in_creation_order() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("root", Box::new(clock.clone()));
        let slow = tree.add_child(TimerTree::ROOT, "slow").unwrap();
        clock.advance_ms(20);
        tree.release(slow, true);
        let fast = tree.add_child(TimerTree::ROOT, "fast").unwrap();
        clock.advance_ms(2);
        tree.release(fast, true);
        clock.advance_ms(3);
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::default();
        let report = ReportRenderer::new(&config).render(&tree).unwrap();
        let labels: Vec<_> = report.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["root", "slow", "fast", "Rest"]);
        assert_eq!(report.rest_lines().next().unwrap().millis, 3);
    }

    #[test]
    fn test_render_reject_unreleased() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("root", Box::new(clock));
        tree.add_child(TimerTree::ROOT, "open").unwrap();
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::strict();
        let err = ReportRenderer::new(&config).render(&tree).unwrap_err();
        assert!(matches!(err, ScopeError::UnreleasedScope { ref name } if name == "open"));

        let report = ReportRenderer::new(&config)
            .with_unreleased_policy(UnreleasedPolicy::Allow)
            .render(&tree)
            .unwrap();
        assert_eq!(report.unreleased, vec!["open".to_string()]);
    }

    #[test]
    fn test_report_find_and_json() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("root", Box::new(clock.clone()));
        let child = tree.add_child(TimerTree::ROOT, "step").unwrap();
        clock.advance_ms(5);
        tree.release(child, false);
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::default();
        let report = ReportRenderer::new(&config).render(&tree).unwrap();
        assert_eq!(report.find("step").len(), 1);
        assert!(report.find("Rest").is_empty());

        let json = report.to_json().unwrap();
        assert!(json.contains("\"kind\": \"rest\""));
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_duration_millis_truncates() {
        assert_eq!(duration_millis(Duration::from_micros(1999)), 1);
        assert_eq!(duration_millis(Duration::ZERO), 0);
    }

    #[test]
    fn test_warn_policy_logs_each_unreleased_scope() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("root", Box::new(clock));
        tree.add_child(TimerTree::ROOT, "first_open").unwrap();
        let done = tree.add_child(TimerTree::ROOT, "done").unwrap();
        tree.add_child(TimerTree::ROOT, "second_open").unwrap();
        tree.release(done, true);
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::default();
        let logs = crate::test_log::capture_logs(tracing::Level::WARN, || {
            let report = ReportRenderer::new(&config).render(&tree).unwrap();
            assert_eq!(report.unreleased, vec!["first_open", "second_open"]);
        });

        assert_eq!(logs.matches("sampling unreleased scope").count(), 2);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("first_open"));
        assert!(logs.contains("second_open"));
        assert!(!logs.contains("done"));
    }

    #[test]
    fn test_allow_policy_logs_below_warn() {
        let clock = ManualClock::new();
        let mut tree = TimerTree::new("root", Box::new(clock));
        tree.add_child(TimerTree::ROOT, "open").unwrap();
        tree.release(TimerTree::ROOT, true);

        let config = ReportConfig::default().with_unreleased_policy(UnreleasedPolicy::Allow);
        let warn_logs = crate::test_log::capture_logs(tracing::Level::WARN, || {
            ReportRenderer::new(&config).render(&tree).unwrap();
        });
        assert!(warn_logs.is_empty());

        let debug_logs = crate::test_log::capture_logs(tracing::Level::DEBUG, || {
            ReportRenderer::new(&config).render(&tree).unwrap();
        });
        assert!(debug_logs.contains("sampling unreleased scope"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// A random tree: for each non-root node, the index of an earlier
        /// node as parent, plus the milliseconds to advance before creating it.
        fn tree_shape() -> impl Strategy<Value = Vec<(prop::sample::Index, u64)>> {
            prop::collection::vec((any::<prop::sample::Index>(), 0u64..50), 0..40)
        }

        fn build(
            shape: &[(prop::sample::Index, u64)],
            release_every: usize,
            tail_ms: u64,
        ) -> TimerTree {
            let clock = ManualClock::new();
            let mut tree = TimerTree::new("root", Box::new(clock.clone()));
            let mut ids = vec![TimerTree::ROOT];

            for (i, (parent, ms)) in shape.iter().enumerate() {
                clock.advance_ms(*ms);
                let parent = ids[parent.index(ids.len())];
                let id = tree.add_child(parent, format!("n{}", i)).unwrap();
                ids.push(id);
                if release_every > 0 && i % release_every == 0 {
                    tree.release(id, true);
                }
            }

            clock.advance_ms(tail_ms);
            tree.release(TimerTree::ROOT, true);
            tree.close();
            tree
        }

        fn render(tree: &TimerTree) -> Report {
            let config = ReportConfig::default();
            ReportRenderer::new(&config)
                .with_unreleased_policy(UnreleasedPolicy::Allow)
                .render(tree)
                .unwrap()
        }

        proptest! {
            #[test]
            fn prop_line_count(shape in tree_shape(), release_every in 0usize..4) {
                let tree = build(&shape, release_every, 1);
                let report = render(&tree);

                let with_children = tree.iter().filter(|(_, node)| node.has_children()).count();
                prop_assert_eq!(report.len(), tree.len() + with_children);
                prop_assert_eq!(report.rest_lines().count(), with_children);
            }

            #[test]
            fn prop_root_total_splits_into_rests_and_leaves(
                shape in tree_shape(),
                release_every in 0usize..4,
                tail_ms in 0u64..20,
            ) {
                let tree = build(&shape, release_every, tail_ms);
                let report = render(&tree);

                let rests: i64 = report.rest_lines().map(|line| line.millis).sum();
                let leaves: i64 = tree
                    .iter()
                    .filter(|(_, node)| !node.has_children())
                    .map(|(id, _)| duration_millis(tree.elapsed(id)))
                    .sum();
                prop_assert_eq!(report.total_millis(), rests + leaves);
            }

            #[test]
            fn prop_first_line_is_root_and_depths_step_by_one(shape in tree_shape()) {
                let tree = build(&shape, 0, 0);
                let report = render(&tree);

                prop_assert_eq!(report.lines[0].depth, 0);
                prop_assert_eq!(report.lines[0].kind, LineKind::Scope);
                prop_assert_eq!(report.lines[0].label.as_str(), "root");
                for pair in report.lines.windows(2) {
                    prop_assert!(pair[1].depth <= pair[0].depth + 1);
                }
                prop_assert_eq!(report.unreleased.len(), tree.len() - 1);
            }
        }
    }
}
