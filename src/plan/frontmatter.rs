//! YAML frontmatter codec.
//!
//! A plan document opens with a YAML block between two `---` fence lines.
//! Only that block is decoded here; the markdown that follows the closing
//! fence is handed back untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{PlanError, PlanResult};
use super::types::{Phase, PhaseStatus, Plan, PlanStatus, Reviewers};

const FENCE: &str = "---";

/// The machine-owned fields persisted in the YAML block.
///
/// Field order here is the order written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,

    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,

    #[serde(skip_serializing_if = "Reviewers::is_empty")]
    pub reviewers: Reviewers,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseEntry>,
}

/// A phase as persisted in frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseEntry {
    pub id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,

    pub status: PhaseStatus,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl From<&Phase> for PhaseEntry {
    fn from(phase: &Phase) -> Self {
        Self {
            id: phase.id.clone(),
            title: phase.title.clone(),
            issue_id: phase.issue_id.clone(),
            status: phase.status,
            depends_on: phase.depends_on.clone(),
        }
    }
}

impl From<PhaseEntry> for Phase {
    fn from(entry: PhaseEntry) -> Self {
        let mut phase = Self::new(entry.id, entry.title)
            .with_depends_on(entry.depends_on)
            .with_status(entry.status);
        phase.issue_id = entry.issue_id;
        phase
    }
}

impl From<&Plan> for Frontmatter {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.clone(),
            title: plan.title.clone(),
            status: Some(plan.status),
            created: Some(plan.created),
            updated: (plan.updated != plan.created).then_some(plan.updated),
            author: plan.author.clone(),
            issue_id: plan.issue_id.clone().filter(|id| !id.is_empty()),
            reviewers: plan.reviewers.clone(),
            phases: plan.phases.iter().map(PhaseEntry::from).collect(),
        }
    }
}

/// Split a document into its raw YAML block and the body after the closing fence.
///
/// Fences are whole lines consisting of `---` (trailing whitespace and CRLF
/// tolerated). The body starts right after the closing fence's line break.
pub(crate) fn split_document(content: &str) -> PlanResult<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().ok_or(PlanError::MissingFrontmatter)?;
    if first.trim_end() != FENCE {
        return Err(PlanError::MissingFrontmatter);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Ok((&content[yaml_start..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(PlanError::UnclosedFrontmatter)
}

/// Decode the frontmatter block, returning it with the unparsed body.
pub fn decode(content: &str) -> PlanResult<(Frontmatter, &str)> {
    let (yaml, body) = split_document(content)?;

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    tracing::debug!(id = %frontmatter.id, phases = frontmatter.phases.len(), "Decoded frontmatter");
    Ok((frontmatter, body))
}

/// Encode frontmatter as YAML wrapped in `---` fences.
pub fn encode(frontmatter: &Frontmatter) -> PlanResult<String> {
    let yaml = serde_yaml::to_string(frontmatter).map_err(|e| PlanError::Encode(e.to_string()))?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n"))
}

/// Names of mandatory fields that are empty, in declaration order.
pub fn validate_required_fields(frontmatter: &Frontmatter) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if frontmatter.id.trim().is_empty() {
        missing.push("id");
    }
    if frontmatter.title.trim().is_empty() {
        missing.push("title");
    }
    if frontmatter.status.is_none() {
        missing.push("status");
    }
    if frontmatter.author.trim().is_empty() {
        missing.push("author");
    }
    missing
}

/// Parse the timestamp spellings found in hand-written frontmatter.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC, optional ` UTC` suffix)
/// and a bare `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};

    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let value = value.strip_suffix("UTC").unwrap_or(value).trim_end();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
            _ => Ok(None),
        }
    }
}
