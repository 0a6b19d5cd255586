//! Branch naming for phases.
//!
//! The pattern is always passed in by the caller (usually from
//! [`BranchConfig`](crate::config::BranchConfig)); nothing here reads global state.

use super::types::{Phase, Plan};

/// Pattern used when none is configured.
pub const DEFAULT_BRANCH_PATTERN: &str = "plan/{plan}/{phase}";

/// Derive a branch name for `phase` from `pattern`.
///
/// Placeholders: `{plan}` (plan ID), `{phase}` (phase ID) and `{issue}` (the
/// phase's issue ID, falling back to the plan's). Values are slugified, and
/// path segments left empty by a missing value are dropped.
pub fn branch_name(pattern: &str, plan: &Plan, phase: &Phase) -> String {
    let issue = phase.issue_id.as_deref().or(plan.issue_id.as_deref()).unwrap_or_default();

    let name = pattern
        .replace("{plan}", &slugify(&plan.id))
        .replace("{phase}", &slugify(&phase.id))
        .replace("{issue}", &slugify(issue));

    name.split('/')
        .map(|segment| segment.trim_matches('-'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl Plan {
    /// Set every phase's `branch` from `pattern`.
    pub fn assign_branches(&mut self, pattern: &str) {
        let names: Vec<String> = self.phases.iter().map(|p| branch_name(pattern, self, p)).collect();
        for (phase, name) in self.phases.iter_mut().zip(names) {
            tracing::debug!(phase = %phase.id, branch = %name, "Assigned branch");
            phase.branch = Some(name);
        }
    }
}

/// Lowercase, with runs of non-alphanumerics collapsed to `-`.
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
