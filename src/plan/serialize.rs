//! Writing plans back to text.
//!
//! Only the frontmatter is regenerated. When the plan came from a document,
//! the markdown body after the closing fence is copied byte for byte.

use std::path::Path;

use super::error::{PlanError, PlanResult};
use super::frontmatter::{encode, split_document, Frontmatter};
use super::types::Plan;

/// Render a plan as a full document.
pub fn serialize(plan: &Plan) -> PlanResult<String> {
    let mut out = encode(&Frontmatter::from(plan))?;

    match plan.raw_content.as_deref() {
        Some(raw) => out.push_str(raw_body(raw)?),
        None => out.push_str(&canonical_body(plan)),
    }

    tracing::debug!(plan = %plan.id, bytes = out.len(), "Serialized plan");
    Ok(out)
}

/// Body of the original text; text without frontmatter is all body.
fn raw_body(raw: &str) -> PlanResult<&str> {
    match split_document(raw) {
        Ok((_, body)) => Ok(body),
        Err(PlanError::MissingFrontmatter) => Ok(raw),
        Err(e) => Err(e),
    }
}

/// The markdown body generated for a plan with no original text.
pub fn canonical_body(plan: &Plan) -> String {
    let mut md = format!("\n# {}\n\n", plan.title);

    push_section(&mut md, "## Problem Statement", &plan.problem_statement);
    push_section(&mut md, "## Proposed Solution", &plan.proposed_solution);

    if !plan.questions_answers.is_empty() {
        md.push_str("## Questions & Answers\n\n");
        for (question, answer) in plan.questions_answers.iter() {
            md.push_str(&format!("**Q: {question}**\n\nA: {answer}\n\n"));
        }
    }

    if plan.phases.iter().any(|p| !p.description.is_empty() || !p.acceptance.is_empty()) {
        md.push_str("## Phases\n\n");
        for phase in &plan.phases {
            push_section(&mut md, &format!("### Phase {}: {}", phase.id, phase.title), &phase.description);
            if !phase.acceptance.is_empty() {
                push_section(&mut md, "#### Acceptance Criteria", &phase.acceptance);
            }
        }
    }

    if !plan.review_notes.is_empty() {
        md.push_str("## Review Notes\n\n");
        for (role, note) in &plan.review_notes {
            push_section(&mut md, &format!("### {} Review", role.label()), note);
        }
    }

    let trimmed = md.trim_end().len();
    md.truncate(trimmed);
    md.push('\n');
    md
}

fn push_section(md: &mut String, heading: &str, text: &str) {
    md.push_str(heading);
    md.push_str("\n\n");
    if !text.is_empty() {
        md.push_str(text);
        md.push_str("\n\n");
    }
}

/// Serialize a plan to `path`, creating parent directories.
///
/// On success the plan's `raw_content` and `file_path` describe what was
/// written, so later saves keep the body as it now is on disk.
pub fn save_file(plan: &mut Plan, path: &Path) -> PlanResult<()> {
    let content = serialize(plan)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &content)?;

    tracing::debug!(plan = %plan.id, path = %path.display(), "Saved plan");
    plan.raw_content = Some(content);
    plan.file_path = Some(path.to_path_buf());
    Ok(())
}
