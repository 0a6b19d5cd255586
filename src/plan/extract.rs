//! Mapping markdown sections onto typed plan fields.
//!
//! Headers are matched by case-insensitive substring so that "The Problem"
//! and "Problem Statement" both land in the same field. Sections that no rule
//! claims are left alone; they survive in the plan's raw content.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{PlanError, PlanResult};
use super::frontmatter::{decode, validate_required_fields};
use super::sections::{is_heading, split_sections, Section};
use super::types::{Phase, Plan, QuestionsAnswers, ReviewerRole};

pub(crate) const PROBLEM_KEYWORDS: &[&str] = &["problem"];
pub(crate) const SOLUTION_KEYWORDS: &[&str] = &["solution", "proposed"];
const QUESTION_KEYWORDS: &[&str] = &["question", "q&a"];
const REVIEW_KEYWORDS: &[&str] = &["review"];
const ACCEPTANCE_KEYWORDS: &[&str] = &["acceptance", "criteria"];

/// `**Q: question**` on its own line.
static RE_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*Q:\s*(.+?)\s*\*\*$").expect("question pattern is valid"));

/// A header predicate paired with the field it fills.
struct SectionRule {
    keywords: &'static [&'static str],
    apply: fn(&mut Plan, &Section<'_>),
}

impl SectionRule {
    fn matches(&self, section: &Section<'_>) -> bool {
        matches_any(section, self.keywords)
    }
}

/// Evaluated in order; the first matching rule wins.
const SECTION_RULES: &[SectionRule] = &[
    SectionRule { keywords: PROBLEM_KEYWORDS, apply: apply_problem },
    SectionRule { keywords: SOLUTION_KEYWORDS, apply: apply_solution },
    SectionRule { keywords: QUESTION_KEYWORDS, apply: apply_questions },
    SectionRule { keywords: REVIEW_KEYWORDS, apply: apply_review_notes },
];

pub(crate) fn matches_any(section: &Section<'_>, keywords: &[&str]) -> bool {
    let header = section.header.to_lowercase();
    keywords.iter().any(|k| header.contains(k))
}

fn apply_problem(plan: &mut Plan, section: &Section<'_>) {
    plan.problem_statement = section.content.trim().to_string();
}

fn apply_solution(plan: &mut Plan, section: &Section<'_>) {
    plan.proposed_solution = section.content.trim().to_string();
}

fn apply_questions(plan: &mut Plan, section: &Section<'_>) {
    extract_questions(section.scope, &mut plan.questions_answers);
}

fn apply_review_notes(plan: &mut Plan, section: &Section<'_>) {
    if let Some(role) = role_in_header(section.header) {
        insert_note(plan, role, section.scope);
    }
    for sub in split_sections(section.scope) {
        if let Some(role) = role_in_header(sub.header) {
            insert_note(plan, role, sub.scope);
        }
    }
}

fn insert_note(plan: &mut Plan, role: ReviewerRole, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        plan.review_notes.insert(role, text.to_string());
    }
}

fn role_in_header(header: &str) -> Option<ReviewerRole> {
    let header = header.to_lowercase();
    ReviewerRole::ALL.into_iter().find(|role| header.contains(role.as_str()))
}

/// Index of the phase a `Phase <id>[:] <title>` heading refers to.
fn phase_heading_index(phases: &[Phase], header: &str) -> Option<usize> {
    let mut words = header.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("phase") {
        return None;
    }
    let token = words.next()?.trim_end_matches([':', '.']);
    phases
        .iter()
        .position(|p| p.id == token)
        .or_else(|| phases.iter().position(|p| p.id.eq_ignore_ascii_case(token)))
}

fn apply_phase_details(phase: &mut Phase, section: &Section<'_>) {
    phase.description = section.content.trim().to_string();
    if let Some(sub) = split_sections(section.scope)
        .into_iter()
        .find(|sub| matches_any(sub, ACCEPTANCE_KEYWORDS))
    {
        phase.acceptance = sub.scope.trim().to_string();
    }
}

/// Populate typed fields from a plan body.
///
/// Every section of the flat split is offered to the rules, nested ones
/// included; a later match overwrites an earlier one.
pub(crate) fn extract_fields(plan: &mut Plan, body: &str) {
    for section in split_sections(body) {
        if section.level == 1 && section.header.eq_ignore_ascii_case(plan.title.trim()) {
            continue;
        }

        if let Some(index) = phase_heading_index(&plan.phases, section.header) {
            apply_phase_details(&mut plan.phases[index], &section);
            continue;
        }

        if let Some(rule) = SECTION_RULES.iter().find(|rule| rule.matches(&section)) {
            tracing::trace!(header = section.header, "Matched plan section");
            (rule.apply)(plan, &section);
        }
    }
}

/// Collect `**Q: ...**` / `A: ...` pairs.
///
/// An answer runs until a blank line, a heading, the next question or the
/// end of text.
pub(crate) fn extract_questions(text: &str, qa: &mut QuestionsAnswers) {
    let mut question: Option<String> = None;
    let mut answer: Option<Vec<&str>> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(cap) = RE_QUESTION.captures(trimmed) {
            flush_pair(qa, &mut question, &mut answer);
            question = Some(cap[1].to_string());
            answer = None;
            continue;
        }

        if is_heading(line) {
            flush_pair(qa, &mut question, &mut answer);
            continue;
        }

        if let Some(lines) = answer.as_mut() {
            if trimmed.is_empty() {
                flush_pair(qa, &mut question, &mut answer);
            } else {
                lines.push(trimmed);
            }
            continue;
        }

        if question.is_some() {
            let rest = trimmed.strip_prefix("**A:**").or_else(|| trimmed.strip_prefix("A:"));
            if let Some(rest) = rest {
                answer = Some(vec![rest.trim()]);
            }
        }
    }

    flush_pair(qa, &mut question, &mut answer);
}

fn flush_pair(
    qa: &mut QuestionsAnswers,
    question: &mut Option<String>,
    answer: &mut Option<Vec<&str>>,
) {
    if let (Some(q), Some(lines)) = (question.take(), answer.take()) {
        qa.insert(q, lines.join("\n").trim().to_string());
    }
}

/// Check that a document is a well-formed plan before accepting it.
///
/// Frontmatter that cannot be decoded fails immediately; otherwise every
/// missing field and section is collected into one error.
pub fn validate_structure(content: &str) -> PlanResult<()> {
    let (frontmatter, body) = decode(content)?;

    let mut problems: Vec<String> = validate_required_fields(&frontmatter)
        .into_iter()
        .map(|field| format!("missing required field '{field}'"))
        .collect();

    let sections = split_sections(body);
    if !sections.iter().any(|s| matches_any(s, PROBLEM_KEYWORDS)) {
        problems.push("missing 'Problem Statement' section".to_string());
    }
    if !sections.iter().any(|s| matches_any(s, SOLUTION_KEYWORDS)) {
        problems.push("missing 'Proposed Solution' section".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PlanError::InvalidStructure { problems })
    }
}
