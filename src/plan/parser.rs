//! Plan parser.
//!
//! Parses plan documents into [`Plan`] values and discovers them on disk.

use std::path::{Path, PathBuf};

use chrono::Utc;
use walkdir::WalkDir;

use super::error::PlanResult;
use super::extract::extract_fields;
use super::frontmatter::decode;
use super::types::{Phase, Plan};

/// Parse a plan from a file.
pub fn parse_file(path: &Path) -> PlanResult<Plan> {
    let content = std::fs::read_to_string(path)?;
    let mut plan = parse(&content)?;
    plan.file_path = Some(path.to_path_buf());
    Ok(plan)
}

/// Parse a plan from document text.
///
/// Parsing is lenient about content: missing fields stay empty and unknown
/// sections are ignored. Use [`validate_structure`](super::validate_structure)
/// or [`Plan::validate`] to enforce them.
pub fn parse(content: &str) -> PlanResult<Plan> {
    let (frontmatter, body) = decode(content)?;

    let created = frontmatter.created.unwrap_or_else(Utc::now);
    let mut plan = Plan::new(frontmatter.id, frontmatter.title, frontmatter.author);
    plan.issue_id = frontmatter.issue_id;
    plan.status = frontmatter.status.unwrap_or_default();
    plan.created = created;
    plan.updated = frontmatter.updated.unwrap_or(created);
    plan.reviewers = frontmatter.reviewers;
    plan.phases = frontmatter.phases.into_iter().map(Phase::from).collect();

    extract_fields(&mut plan, body);
    plan.raw_content = Some(content.to_string());

    tracing::debug!(
        plan = %plan.id,
        status = %plan.status,
        phases = plan.phases.len(),
        questions = plan.questions_answers.len(),
        "Parsed plan"
    );
    Ok(plan)
}

/// Find and parse every plan document under `dir`.
///
/// Markdown files without frontmatter, or that fail to parse, are skipped
/// with a warning. Results are sorted by path.
pub fn discover_plans(dir: &Path) -> PlanResult<Vec<(PathBuf, Plan)>> {
    let mut plans = Vec::new();

    if !dir.exists() {
        return Ok(plans);
    }

    let walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "md") {
            continue;
        }

        match parse_file(path) {
            Ok(plan) => plans.push((path.to_path_buf(), plan)),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Skipping unparsable plan");
            }
        }
    }

    Ok(plans)
}
