//! Plan engine error types.

use thiserror::Error;

use super::types::PlanStatus;

/// Result type for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors that can occur while parsing, validating, mutating or writing plans.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Reading or writing a plan file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document does not open with a `---` fence.
    #[error("Document has no frontmatter: expected a leading '---' fence")]
    MissingFrontmatter,

    /// The opening `---` fence is never closed.
    #[error("Unclosed frontmatter: no closing '---' fence found")]
    UnclosedFrontmatter,

    /// The YAML between the fences could not be decoded.
    #[error("Malformed frontmatter: {0}")]
    MalformedFrontmatter(String),

    /// The frontmatter could not be encoded back to YAML.
    #[error("Failed to encode frontmatter: {0}")]
    Encode(String),

    /// Structural validation found one or more problems.
    #[error("Invalid plan structure: {}", problems.join("; "))]
    InvalidStructure { problems: Vec<String> },

    /// A required plan field is empty.
    #[error("Plan field '{0}' is required")]
    MissingField(&'static str),

    /// Two phases share the same ID.
    #[error("Duplicate phase ID '{0}'")]
    DuplicatePhase(String),

    /// A phase depends on an ID that is not in the plan.
    #[error("Phase '{phase}' depends on unknown phase '{dependency}'")]
    UnknownDependency { phase: String, dependency: String },

    /// The phase dependency relation contains a cycle.
    #[error("Dependency cycle detected: phase '{phase}' depends on '{dependency}' which leads back to it")]
    DependencyCycle { phase: String, dependency: String },

    /// The requested plan status change is not in the transition table.
    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: PlanStatus, to: PlanStatus },

    /// No phase with the given ID exists in the plan.
    #[error("Phase '{0}' not found")]
    PhaseNotFound(String),
}

impl From<serde_yaml::Error> for PlanError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::MalformedFrontmatter(err.to_string())
    }
}
