//! Plan Engine Integration Tests
//!
//! Exercises the public library surface: parsing, round-tripping, the
//! phase graph and the status lifecycle.

use plandoc::plan::{
    canonical_body, has_cycle, parse, parse_file, save_file, serialize, split_sections,
    topological_sort, validate_structure, Phase, PhaseStatus, Plan, PlanError, PlanStatus,
    ReviewerRole,
};

const T1: &str =
    "---\nid: t1\ntitle: T\nstatus: draft\nauthor: a\n---\n\n## Problem Statement\n\nP\n\n## Proposed Solution\n\nS\n";

/// Everything after the closing frontmatter fence.
fn body_of(doc: &str) -> &str {
    let after_open = &doc[4..];
    let close = after_open.find("\n---\n").expect("closing fence");
    &after_open[close + 5..]
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_minimal_example() {
    let plan = parse(T1).unwrap();
    assert_eq!(plan.id, "t1");
    assert_eq!(plan.status, PlanStatus::Draft);
    assert_eq!(plan.problem_statement, "P");
    assert_eq!(plan.proposed_solution, "S");
    assert!(validate_structure(T1).is_ok());
    assert!(plan.validate().is_ok());
}

#[test]
fn test_alternative_section_names() {
    let doc = "---\nid: x\ntitle: X\nstatus: draft\nauthor: a\n---\n## The Problem\nbroken\n## Our Proposed Approach\nfix it\n";
    let plan = parse(doc).unwrap();
    assert_eq!(plan.problem_statement, "broken");
    assert_eq!(plan.proposed_solution, "fix it");
}

#[test]
fn test_structural_errors_are_aggregated() {
    let doc = "---\nstatus: draft\nauthor: a\n---\n\nNo sections here.\n";
    let err = validate_structure(doc).unwrap_err();

    match &err {
        PlanError::InvalidStructure { problems } => assert_eq!(problems.len(), 4),
        other => panic!("unexpected error: {other}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("'id'"));
    assert!(msg.contains("'title'"));
    assert!(msg.contains("Problem Statement"));
    assert!(msg.contains("Proposed Solution"));
}

#[test]
fn test_malformed_frontmatter_fails_fast() {
    let doc = "---\nid: x\nstatus: nonsense\n---\n";
    assert!(matches!(validate_structure(doc), Err(PlanError::MalformedFrontmatter(_))));
    assert!(matches!(parse("---\nid: x\n"), Err(PlanError::UnclosedFrontmatter)));
}

#[test]
fn test_review_notes_by_role() {
    let doc = r#"---
id: x
title: X
status: reviewing
author: a
---

## Review Notes

### Lead Review

Looks good.

#### Follow-up

Ship it.

### Performance Review

Watch the N+1.
"#;
    let plan = parse(doc).unwrap();
    assert_eq!(plan.review_notes[&ReviewerRole::Lead], "Looks good.\n\n#### Follow-up\n\nShip it.");
    assert_eq!(plan.review_notes[&ReviewerRole::Performance], "Watch the N+1.");
    assert!(!plan.review_notes.contains_key(&ReviewerRole::Security));
}

#[test]
fn test_level_one_headings_do_not_hide_sections() {
    let docs = [
        "---\nid: q3\ntitle: Q3 review cleanup\nstatus: draft\nauthor: a\n---\n\n# Q3 Review Cleanup Plan\n\n## Problem Statement\n\nP\n\n## Proposed Solution\n\nS\n",
        "---\nid: oq\ntitle: OQ\nstatus: draft\nauthor: a\n---\n# Open questions\n**Q: x?**\nA: y\n## Problem\nP\n## Solution\nS\n",
    ];
    for doc in docs {
        assert!(validate_structure(doc).is_ok());
        let plan = parse(doc).unwrap();
        assert_eq!(plan.problem_statement, "P");
        assert_eq!(plan.proposed_solution, "S");
    }
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_round_trip_preserves_body() {
    let doc = r#"---
id: rt
title: Round trip
status: draft
author: a
phases:
  - id: a
    title: A
    status: pending
---
Preamble before any heading.

## Problem Statement

A line with --- in the middle, and a line that is just dashes:

---
---

## Unrecognized Section

### Nested *heading*

```yaml
---
not: frontmatter
---
```

## Proposed Solution
S
"#;
    let mut plan = parse(doc).unwrap();
    plan.set_phase_status("a", PhaseStatus::InProgress).unwrap();

    let out = serialize(&plan).unwrap();
    assert_eq!(body_of(&out), body_of(doc));
    assert!(out.contains("status: in-progress"));

    let reparsed = parse(&out).unwrap();
    assert_eq!(reparsed.status, PlanStatus::InProgress);
    assert_eq!(reparsed.phases[0].status, PhaseStatus::InProgress);
    assert_eq!(reparsed.proposed_solution, "S");
}

#[test]
fn test_canonical_document_parses_back() {
    let mut plan = Plan::new("c", "Canonical", "a");
    plan.problem_statement = "Too slow.".to_string();
    plan.proposed_solution = "Cache it.".to_string();
    plan.questions_answers.insert("TTL?", "Five minutes.");
    plan.review_notes.insert(ReviewerRole::Security, "No secrets cached.".to_string());
    let mut phase = Phase::new("cache", "Add cache");
    phase.description = "LRU in front of the store.".to_string();
    phase.acceptance = "- hit rate above 80%".to_string();
    plan.add_phase(phase).unwrap();

    let out = serialize(&plan).unwrap();
    assert!(validate_structure(&out).is_ok());

    let back = parse(&out).unwrap();
    assert_eq!(back.problem_statement, plan.problem_statement);
    assert_eq!(back.proposed_solution, plan.proposed_solution);
    assert_eq!(back.questions_answers, plan.questions_answers);
    assert_eq!(back.review_notes, plan.review_notes);
    assert_eq!(back.phases[0].description, "LRU in front of the store.");
    assert_eq!(back.phases[0].acceptance, "- hit rate above 80%");
    assert_eq!(back.created.timestamp(), plan.created.timestamp());
}

#[test]
fn test_canonical_body_snapshot() {
    let mut plan = Plan::new("s", "Snapshot Plan", "a");
    plan.problem_statement = "Problem text.".to_string();
    plan.proposed_solution = "Solution text.".to_string();
    plan.questions_answers.insert("First?", "One.");
    plan.questions_answers.insert("Second?", "Two.");
    plan.review_notes.insert(ReviewerRole::Accessibility, "Check contrast.".to_string());
    plan.review_notes.insert(ReviewerRole::Lead, "Approved.".to_string());

    let body = canonical_body(&plan);
    insta::assert_snapshot!(body.trim(), @r"
    # Snapshot Plan

    ## Problem Statement

    Problem text.

    ## Proposed Solution

    Solution text.

    ## Questions & Answers

    **Q: First?**

    A: One.

    **Q: Second?**

    A: Two.

    ## Review Notes

    ### Lead Review

    Approved.

    ### Accessibility Review

    Check contrast.
    ");
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans").join("t1.md");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, T1).unwrap();

    let mut plan = parse_file(&path).unwrap();
    assert_eq!(plan.file_path.as_deref(), Some(path.as_path()));
    plan.transition_to(PlanStatus::Reviewing).unwrap();
    save_file(&mut plan, &path).unwrap();

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("status: reviewing"));
    assert!(on_disk.contains("updated: "));
    assert_eq!(body_of(&on_disk), body_of(T1));

    let reloaded = parse_file(&path).unwrap();
    assert_eq!(reloaded.status, PlanStatus::Reviewing);
    assert!(reloaded.updated >= reloaded.created);
}

// ============================================================================
// Phase graph
// ============================================================================

fn chain_with_cycle() -> Vec<Phase> {
    vec![
        Phase::new("setup", "Setup"),
        Phase::new("x", "X").with_depends_on(["setup", "z"]),
        Phase::new("y", "Y").with_depends_on(["x"]),
        Phase::new("z", "Z").with_depends_on(["y"]),
        Phase::new("docs", "Docs").with_depends_on(["setup"]),
    ]
}

#[test]
fn test_diamond_example_levels() {
    let phases = vec![
        Phase::new("A", "a"),
        Phase::new("B", "b").with_depends_on(["A"]),
        Phase::new("C", "c").with_depends_on(["A"]),
        Phase::new("D", "d").with_depends_on(["B", "C"]),
    ];
    let levels = topological_sort(&phases);
    let ids: Vec<Vec<&str>> =
        levels.iter().map(|l| l.iter().map(|p| p.id.as_str()).collect()).collect();
    assert_eq!(ids, vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
}

#[test]
fn test_cycle_soundness() {
    let phases = chain_with_cycle();
    assert!(has_cycle(&phases));

    let placed: Vec<&str> =
        topological_sort(&phases).iter().flatten().map(|p| p.id.as_str()).collect();
    assert_eq!(placed, vec!["setup", "docs"]);

    let mut plan = Plan::new("p", "P", "a");
    plan.phases = phases;
    assert!(matches!(plan.validate(), Err(PlanError::DependencyCycle { .. })));
}

#[test]
fn test_levels_respect_dependencies() {
    let phases: Vec<Phase> = (0..30)
        .map(|i| {
            let deps: Vec<String> =
                (0..i).filter(|j| (i * 7 + j) % 5 == 0).map(|j| format!("p{j}")).collect();
            Phase::new(format!("p{i}"), "step").with_depends_on(deps)
        })
        .collect();
    assert!(!has_cycle(&phases));

    let levels = topological_sort(&phases);
    let level_of = |id: &str| levels.iter().position(|l| l.iter().any(|p| p.id == id)).unwrap();

    assert_eq!(levels.iter().map(Vec::len).sum::<usize>(), phases.len());
    for phase in &phases {
        for dep in &phase.depends_on {
            assert!(level_of(&phase.id) > level_of(dep), "{} must come after {dep}", phase.id);
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_phase_start_promotes_draft_plan() {
    let mut plan = Plan::new("p", "P", "a");
    plan.add_phase(Phase::new("only", "Only")).unwrap();
    assert_eq!(plan.status, PlanStatus::Draft);

    plan.set_phase_status("only", PhaseStatus::InProgress).unwrap();
    assert_eq!(plan.status, PlanStatus::InProgress);

    plan.set_phase_status("only", PhaseStatus::Complete).unwrap();
    assert_eq!(plan.status, PlanStatus::InReview);

    plan.transition_to(PlanStatus::Complete).unwrap();
    let err = plan.transition_to(PlanStatus::Draft).unwrap_err();
    assert!(matches!(
        err,
        PlanError::InvalidTransition { from: PlanStatus::Complete, to: PlanStatus::Draft }
    ));
}

#[test]
fn test_scheduling_walkthrough() {
    let mut plan = Plan::new("p", "P", "a");
    plan.add_phase(Phase::new("schema", "Schema")).unwrap();
    plan.add_phase(Phase::new("api", "API").with_depends_on(["schema"])).unwrap();
    plan.add_phase(Phase::new("ui", "UI").with_depends_on(["api"])).unwrap();

    let ready = |plan: &Plan| plan.next_phases().iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    assert_eq!(ready(&plan), vec!["schema"]);

    plan.set_phase_status("schema", PhaseStatus::Complete).unwrap();
    assert_eq!(ready(&plan), vec!["api"]);
    assert_eq!(plan.blocked_phases().len(), 1);

    plan.set_phase_status("api", PhaseStatus::Blocked).unwrap();
    assert!(ready(&plan).is_empty());
    assert_eq!(plan.blocked_phases().len(), 2);
}

#[test]
fn test_sections_are_reusable() {
    let sections = split_sections("# A\n## B\ntext\n");
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].scope, "## B\ntext\n");
}
