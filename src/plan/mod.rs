//! Plan document engine.
//!
//! A plan is a markdown file with a YAML frontmatter block. The frontmatter
//! holds the machine-owned fields (identity, status, reviewers, phases); the
//! body is free-form markdown from which known sections are extracted.
//! Serializing rewrites only the frontmatter and keeps the body verbatim.

mod branch;
mod error;
mod extract;
mod frontmatter;
mod graph;
mod lifecycle;
mod parser;
mod sections;
mod serialize;
mod types;

pub use branch::{branch_name, slugify, DEFAULT_BRANCH_PATTERN};
pub use error::{PlanError, PlanResult};
pub use extract::validate_structure;
pub use frontmatter::{decode, encode, parse_timestamp, validate_required_fields, Frontmatter, PhaseEntry};
pub use graph::{can_start, find_cycle, has_cycle, is_blocked, topological_sort};
pub use parser::{discover_plans, parse, parse_file};
pub use sections::{split_sections, Section};
pub use serialize::{canonical_body, save_file, serialize};
pub use types::{Phase, PhaseStatus, Plan, PlanStatus, QuestionsAnswers, ReviewerRole, Reviewers};
