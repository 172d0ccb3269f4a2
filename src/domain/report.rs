use chrono::{DateTime, Utc};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

const MAX_TITLE_GRAPHEMES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Open => "Open",
            ReportStatus::InProgress => "In progress",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(format!("{} is not a valid report status.", other)),
        }
    }

    /// `closed` is terminal, a resolved report may be reopened as in progress.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Open, InProgress) | (Open, Resolved) | (Open, Closed) => true,
            (InProgress, Resolved) | (InProgress, Closed) => true,
            (Resolved, Closed) | (Resolved, InProgress) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ReportStatus,
    pub resolved_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub title: String,
    pub description: String,
}

impl NewReport {
    pub fn parse(title: &str, description: &str) -> Result<Self, String> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() {
            return Err("The title is required".into());
        }
        if title.graphemes(true).count() > MAX_TITLE_GRAPHEMES {
            return Err(format!(
                "The title cannot be longer than {} characters",
                MAX_TITLE_GRAPHEMES
            ));
        }
        if description.is_empty() {
            return Err("The description is required".into());
        }
        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}
