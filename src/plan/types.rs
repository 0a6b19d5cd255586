//! Plan and phase data model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::error::{PlanError, PlanResult};

/// Plan lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    /// Being written
    #[default]
    Draft,
    /// Out for review
    Reviewing,
    /// Accepted, not started
    Approved,
    /// Phases are being worked on
    InProgress,
    /// All phases done, final review pending
    InReview,
    /// Terminal
    Complete,
}

impl PlanStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Reviewing,
        Self::Approved,
        Self::InProgress,
        Self::InReview,
        Self::Complete,
    ];

    /// Wire name used in frontmatter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Reviewing => "reviewing",
            Self::Approved => "approved",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "draft" => Ok(Self::Draft),
            "reviewing" => Ok(Self::Reviewing),
            "approved" => Ok(Self::Approved),
            "in-progress" => Ok(Self::InProgress),
            "in-review" => Ok(Self::InReview),
            "complete" | "completed" => Ok(Self::Complete),
            _ => Err(format!("Unknown plan status: {}", s)),
        }
    }
}

/// Phase status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Complete,
}

impl PhaseStatus {
    /// Wire name used in frontmatter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "complete" | "completed" | "done" => Ok(Self::Complete),
            _ => Err(format!("Unknown phase status: {}", s)),
        }
    }
}

/// Review category a reviewer signs off on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerRole {
    Lead,
    Security,
    Performance,
    Accessibility,
}

impl ReviewerRole {
    /// Every role, in canonical order.
    pub const ALL: [Self; 4] = [Self::Lead, Self::Security, Self::Performance, Self::Accessibility];

    /// Lowercase name, also the keyword matched in review note headings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
        }
    }

    /// Capitalized name used in generated headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Security => "Security",
            Self::Performance => "Performance",
            Self::Accessibility => "Accessibility",
        }
    }
}

impl fmt::Display for ReviewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown reviewer role: {}", s))
    }
}

/// Reviewer roles requested for a plan.
///
/// The three sets are kept disjoint: a role is either required, optional or
/// opted out, never more than one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reviewers {
    /// Roles that must review
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<ReviewerRole>,

    /// Roles that may review
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<ReviewerRole>,

    /// Roles explicitly excluded
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opted_out: Vec<ReviewerRole>,
}

impl Reviewers {
    /// The reviewer set given to newly created plans.
    pub fn standard() -> Self {
        Self {
            default: vec![ReviewerRole::Lead],
            optional: vec![
                ReviewerRole::Security,
                ReviewerRole::Performance,
                ReviewerRole::Accessibility,
            ],
            opted_out: Vec::new(),
        }
    }

    /// True when no role is listed anywhere.
    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.optional.is_empty() && self.opted_out.is_empty()
    }

    /// True when no role appears in more than one set.
    pub fn is_disjoint(&self) -> bool {
        ReviewerRole::ALL.iter().all(|role| {
            [&self.default, &self.optional, &self.opted_out]
                .iter()
                .filter(|set| set.contains(role))
                .count()
                <= 1
        })
    }

    /// Move a role into the opted-out set.
    pub fn opt_out(&mut self, role: ReviewerRole) {
        self.default.retain(|r| *r != role);
        self.optional.retain(|r| *r != role);
        if !self.opted_out.contains(&role) {
            self.opted_out.push(role);
        }
    }

    /// Move a role into the required set.
    pub fn require(&mut self, role: ReviewerRole) {
        self.optional.retain(|r| *r != role);
        self.opted_out.retain(|r| *r != role);
        if !self.default.contains(&role) {
            self.default.push(role);
        }
    }
}

/// Question/answer pairs in the order they were first seen.
///
/// Inserting an existing question replaces its answer in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionsAnswers {
    pairs: Vec<(String, String)>,
}

impl QuestionsAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an answer.
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        match self.pairs.iter_mut().find(|(q, _)| *q == question) {
            Some(pair) => pair.1 = answer,
            None => self.pairs.push((question, answer)),
        }
    }

    /// Answer for a question, if recorded.
    pub fn get(&self, question: &str) -> Option<&str> {
        self.pairs.iter().find(|(q, _)| q == question).map(|(_, a)| a.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Serialize for QuestionsAnswers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (q, a) in &self.pairs {
            map.serialize_entry(q, a)?;
        }
        map.end()
    }
}

/// A schedulable unit of work within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    /// Unique within the owning plan
    pub id: String,

    pub title: String,

    /// External tracker reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,

    /// Branch name, derived from the configured pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Parsed from the phase's markdown section
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Parsed from the phase's acceptance sub-section
    #[serde(skip_serializing_if = "String::is_empty")]
    pub acceptance: String,

    /// Phases that must be complete before this one starts
    pub depends_on: Vec<String>,

    pub status: PhaseStatus,
}

impl Phase {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            issue_id: None,
            branch: None,
            description: String::new(),
            acceptance: String::new(),
            depends_on: Vec::new(),
            status: PhaseStatus::Pending,
        }
    }

    /// Builder-style dependency list.
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: PhaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == PhaseStatus::Complete
    }
}

/// A plan document: the aggregate root owning its phases.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,

    pub title: String,

    pub author: String,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    pub reviewers: Reviewers,

    pub status: PlanStatus,

    /// Insertion order is the tiebreak for scheduling
    pub phases: Vec<Phase>,

    pub problem_statement: String,

    pub proposed_solution: String,

    pub questions_answers: QuestionsAnswers,

    pub review_notes: BTreeMap<ReviewerRole, String>,

    /// Original document text, kept verbatim for round-tripping
    #[serde(skip)]
    pub raw_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl Plan {
    /// Create an empty draft plan with the standard reviewer set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            issue_id: None,
            title: title.into(),
            author: author.into(),
            created: now,
            updated: now,
            reviewers: Reviewers::standard(),
            status: PlanStatus::Draft,
            phases: Vec::new(),
            problem_statement: String::new(),
            proposed_solution: String::new(),
            questions_answers: QuestionsAnswers::new(),
            review_notes: BTreeMap::new(),
            raw_content: None,
            file_path: None,
        }
    }

    /// Find a phase by ID.
    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Find a phase by ID (mutable).
    pub fn phase_mut(&mut self, id: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id == id)
    }

    /// Append a phase.
    ///
    /// Dependencies must name phases already in the plan, which also keeps
    /// the dependency relation acyclic.
    pub fn add_phase(&mut self, phase: Phase) -> PlanResult<()> {
        if self.phase(&phase.id).is_some() {
            return Err(PlanError::DuplicatePhase(phase.id));
        }
        if let Some(dep) = phase.depends_on.iter().find(|dep| self.phase(dep).is_none()) {
            return Err(PlanError::UnknownDependency {
                phase: phase.id.clone(),
                dependency: dep.clone(),
            });
        }
        tracing::debug!(plan = %self.id, phase = %phase.id, "Adding phase");
        self.phases.push(phase);
        Ok(())
    }

    /// Set `updated` to the current time.
    pub(crate) fn touch(&mut self) {
        self.updated = Utc::now();
    }
}
