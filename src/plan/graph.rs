//! Phase dependency graph.
//!
//! Phases reference each other by ID only. Every algorithm here builds a
//! temporary ID-to-index table over the plan's phase list and works on
//! indices, never on references between phases.

use std::collections::{HashMap, HashSet};

use super::error::{PlanError, PlanResult};
use super::types::{Phase, PhaseStatus, Plan};

/// Map phase IDs to their position; the first occurrence of an ID wins.
fn id_index(phases: &[Phase]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(phases.len());
    for (i, phase) in phases.iter().enumerate() {
        index.entry(phase.id.as_str()).or_insert(i);
    }
    index
}

/// Whether a phase is waiting on an unfinished dependency.
///
/// A dependency that is not in `all` counts as unfinished.
pub fn is_blocked(phase: &Phase, all: &[Phase]) -> bool {
    phase.depends_on.iter().any(|dep| {
        all.iter().find(|p| p.id == *dep).map_or(true, |p| p.status != PhaseStatus::Complete)
    })
}

/// Whether a phase is pending with every dependency complete.
pub fn can_start(phase: &Phase, all: &[Phase]) -> bool {
    phase.status == PhaseStatus::Pending && !is_blocked(phase, all)
}

/// Group phases into levels that can run in parallel (Kahn's algorithm).
///
/// Every phase in a level depends only on phases in earlier levels. Phases
/// on a dependency cycle, or depending on an unknown ID, never become ready
/// and are left out; call [`has_cycle`] first when completeness matters.
/// Within a level, phases keep their plan order.
pub fn topological_sort(phases: &[Phase]) -> Vec<Vec<&Phase>> {
    let index = id_index(phases);

    let mut in_degree: Vec<usize> = phases.iter().map(|p| p.depends_on.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); phases.len()];
    for (i, phase) in phases.iter().enumerate() {
        for dep in &phase.depends_on {
            if let Some(&d) = index.get(dep.as_str()) {
                dependents[d].push(i);
            }
        }
    }

    let mut frontier: Vec<usize> = (0..phases.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut levels: Vec<Vec<&Phase>> = Vec::new();
    let mut placed = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &i in &frontier {
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }
        next.sort_unstable();

        placed += frontier.len();
        levels.push(frontier.iter().map(|&i| &phases[i]).collect());
        frontier = next;
    }

    if placed < phases.len() {
        tracing::debug!(omitted = phases.len() - placed, "Phases left out of topological order");
    }

    levels
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// First back edge `(phase, dependency)` found by depth-first search.
///
/// Roots are tried in plan order so disconnected components are covered.
/// The walk uses an explicit stack of `(node, next dependency)` frames.
pub fn find_cycle(phases: &[Phase]) -> Option<(String, String)> {
    let index = id_index(phases);
    let mut marks = vec![Mark::Unvisited; phases.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..phases.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let Some(dep_id) = phases[node].depends_on.get(next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let Some(&dep) = index.get(dep_id.as_str()) else {
                continue;
            };
            match marks[dep] {
                Mark::OnStack => return Some((phases[node].id.clone(), dep_id.clone())),
                Mark::Unvisited => {
                    marks[dep] = Mark::OnStack;
                    stack.push((dep, 0));
                }
                Mark::Done => {}
            }
        }
    }

    None
}

/// Whether the dependency relation contains a cycle.
pub fn has_cycle(phases: &[Phase]) -> bool {
    find_cycle(phases).is_some()
}

impl Plan {
    /// Check the plan's semantic invariants.
    ///
    /// Checks run in a fixed order and the first violation is returned:
    /// required fields, duplicate phase IDs, unknown dependencies, cycles.
    pub fn validate(&self) -> PlanResult<()> {
        for (field, value) in [("id", &self.id), ("title", &self.title), ("author", &self.author)] {
            if value.trim().is_empty() {
                return Err(PlanError::MissingField(field));
            }
        }

        let mut ids = HashSet::with_capacity(self.phases.len());
        for phase in &self.phases {
            if !ids.insert(phase.id.as_str()) {
                return Err(PlanError::DuplicatePhase(phase.id.clone()));
            }
        }

        for phase in &self.phases {
            if let Some(dep) = phase.depends_on.iter().find(|dep| !ids.contains(dep.as_str())) {
                return Err(PlanError::UnknownDependency {
                    phase: phase.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        if let Some((phase, dependency)) = find_cycle(&self.phases) {
            return Err(PlanError::DependencyCycle { phase, dependency });
        }

        Ok(())
    }

    /// Phases that can start now, in plan order.
    pub fn next_phases(&self) -> Vec<&Phase> {
        self.phases.iter().filter(|p| can_start(p, &self.phases)).collect()
    }

    /// Unfinished phases that are marked blocked or wait on a dependency.
    pub fn blocked_phases(&self) -> Vec<&Phase> {
        self.phases
            .iter()
            .filter(|p| {
                p.status != PhaseStatus::Complete
                    && (p.status == PhaseStatus::Blocked || is_blocked(p, &self.phases))
            })
            .collect()
    }

    pub fn in_progress_phases(&self) -> Vec<&Phase> {
        self.phases.iter().filter(|p| p.status == PhaseStatus::InProgress).collect()
    }

    pub fn completed_phases(&self) -> Vec<&Phase> {
        self.phases.iter().filter(|p| p.status == PhaseStatus::Complete).collect()
    }

    /// Topological levels of this plan's phases.
    pub fn phase_levels(&self) -> Vec<Vec<&Phase>> {
        topological_sort(&self.phases)
    }

    /// True when the plan has phases and all of them are complete.
    pub fn all_phases_complete(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(Phase::is_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Vec<Phase> {
        vec![
            Phase::new("A", "a"),
            Phase::new("B", "b").with_depends_on(["A"]),
            Phase::new("C", "c").with_depends_on(["A"]),
            Phase::new("D", "d").with_depends_on(["B", "C"]),
        ]
    }

    fn ids(levels: &[Vec<&Phase>]) -> Vec<Vec<String>> {
        levels.iter().map(|l| l.iter().map(|p| p.id.clone()).collect()).collect()
    }

    #[test]
    fn test_diamond_levels() {
        let phases = diamond();
        let levels = topological_sort(&phases);
        assert_eq!(ids(&levels), vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    }

    #[test]
    fn test_cycle_members_are_omitted() {
        let phases = vec![
            Phase::new("A", "a"),
            Phase::new("B", "b").with_depends_on(["C"]),
            Phase::new("C", "c").with_depends_on(["B"]),
            Phase::new("D", "d").with_depends_on(["A"]),
        ];
        assert!(has_cycle(&phases));
        assert_eq!(ids(&topological_sort(&phases)), vec![vec!["A"], vec!["D"]]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let phases = vec![Phase::new("A", "a").with_depends_on(["A"])];
        assert_eq!(find_cycle(&phases), Some(("A".to_string(), "A".to_string())));
        assert!(topological_sort(&phases).is_empty());
    }

    #[test]
    fn test_cycle_in_disconnected_component() {
        let phases = vec![
            Phase::new("A", "a"),
            Phase::new("X", "x").with_depends_on(["Y"]),
            Phase::new("Y", "y").with_depends_on(["Z"]),
            Phase::new("Z", "z").with_depends_on(["X"]),
        ];
        assert!(has_cycle(&phases));
        assert!(!has_cycle(&diamond()));
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let phases: Vec<Phase> = (0..10_000)
            .map(|i| {
                let phase = Phase::new(format!("p{i}"), "step");
                if i == 0 {
                    phase
                } else {
                    phase.with_depends_on([format!("p{}", i - 1)])
                }
            })
            .collect();
        assert!(!has_cycle(&phases));
        assert_eq!(topological_sort(&phases).len(), 10_000);
    }

    #[test]
    fn test_unknown_dependency_blocks() {
        let phases = vec![Phase::new("A", "a").with_depends_on(["ghost"])];
        assert!(is_blocked(&phases[0], &phases));
        assert!(!can_start(&phases[0], &phases));
        assert!(topological_sort(&phases).is_empty());
        assert!(!has_cycle(&phases));
    }

    #[test]
    fn test_blocking_follows_completion() {
        let mut phases = diamond();
        assert!(can_start(&phases[0], &phases));
        assert!(is_blocked(&phases[1], &phases));

        phases[0].status = PhaseStatus::Complete;
        assert!(!is_blocked(&phases[1], &phases));
        assert!(can_start(&phases[1], &phases));
        assert!(is_blocked(&phases[3], &phases));

        phases[1].status = PhaseStatus::InProgress;
        assert!(!can_start(&phases[1], &phases));
    }

    #[test]
    fn test_plan_phase_queries() {
        let mut plan = Plan::new("p", "P", "me");
        plan.phases = diamond();
        plan.phases[0].status = PhaseStatus::Complete;
        plan.phases[1].status = PhaseStatus::InProgress;

        let next: Vec<_> = plan.next_phases().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(next, vec!["C"]);
        let blocked: Vec<_> = plan.blocked_phases().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(blocked, vec!["D"]);
        assert_eq!(plan.in_progress_phases().len(), 1);
        assert_eq!(plan.completed_phases()[0].id, "A");
        assert!(!plan.all_phases_complete());
    }

    #[test]
    fn test_validate_order() {
        let mut plan = Plan::new("p", "P", "me");
        plan.phases = vec![
            Phase::new("A", "a").with_depends_on(["B"]),
            Phase::new("B", "b").with_depends_on(["A"]),
            Phase::new("A", "dup"),
        ];
        assert!(matches!(plan.validate(), Err(PlanError::DuplicatePhase(id)) if id == "A"));

        plan.phases.pop();
        plan.phases.push(Phase::new("C", "c").with_depends_on(["nope"]));
        assert!(matches!(plan.validate(), Err(PlanError::UnknownDependency { .. })));

        plan.phases.pop();
        assert!(matches!(plan.validate(), Err(PlanError::DependencyCycle { .. })));

        plan.phases[1].depends_on.clear();
        assert!(plan.validate().is_ok());

        plan.author = "  ".to_string();
        assert!(matches!(plan.validate(), Err(PlanError::MissingField("author"))));
    }
}
