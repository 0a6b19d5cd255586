#![allow(dead_code)]
#![allow(clippy::format_push_string)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::unnecessary_lazy_evaluations)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::single_char_pattern)]
#![allow(clippy::or_fun_call)]
#![allow(clippy::case_sensitive_file_extension_comparisons)]

//! # plandoc
//!
//! Plan documents as markdown with YAML frontmatter: parse them, check them,
//! schedule their phases and write them back without touching your prose.
//!
//! ## Features
//!
//! - **Lossless round-trip**: only the frontmatter is rewritten on save
//! - **Fuzzy sections**: "The Problem" and "Problem Statement" both count
//! - **Phase graph**: blocking, cycle detection and parallel levels
//! - **Lifecycle**: a fixed plan status state machine
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a plan
//! plandoc new --title "Rework authentication"
//!
//! # What can start now?
//! plandoc next plans/rework-authentication.md
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::redundant_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::redundant_clone)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod config;
pub mod plan;

// Re-export commonly used types
pub use config::Config;
pub use plan::{
    discover_plans, parse, parse_file, save_file, serialize, topological_sort, validate_structure,
    Phase, PhaseStatus, Plan, PlanError, PlanResult, PlanStatus, ReviewerRole, Reviewers,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "plandoc";
