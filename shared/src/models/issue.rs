//! Issue Model
//!
//! Issues are filed by citizens and routed to a department. Once routed, the
//! owning department drives them through the status workflow:
//!
//! ```text
//! pending -> acknowledged -> in_progress -> resolved -> closed
//!     \            \               \            \
//!      +------------+---------------+------------+--> rejected
//! ```
//!
//! Moves only go forward (skipping ahead is allowed). `closed` and
//! `rejected` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum IssueStatus {
    Pending,
    Acknowledged,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 6] = [
        IssueStatus::Pending,
        IssueStatus::Acknowledged,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
        IssueStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }

    /// Position on the forward chain; `rejected` sits outside it
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Acknowledged => Some(1),
            Self::InProgress => Some(2),
            Self::Resolved => Some(3),
            Self::Closed => Some(4),
            Self::Rejected => None,
        }
    }

    /// Whether the workflow allows moving from `self` to `target`
    pub fn can_transition_to(&self, target: IssueStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), target.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    /// Every status from which `target` can be reached in one move
    pub fn predecessors_of(target: IssueStatus) -> Vec<IssueStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(target))
            .collect()
    }

    /// Column stamped when an issue enters this status
    pub fn timestamp_column(&self) -> Option<&'static str> {
        match self {
            Self::Pending => None,
            Self::Acknowledged => Some("acknowledged_at"),
            Self::InProgress => Some("started_at"),
            Self::Resolved => Some("resolved_at"),
            Self::Closed => Some("closed_at"),
            Self::Rejected => Some("rejected_at"),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown status strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown issue status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for IssueStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Resolution details recorded when an issue is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default)]
    pub resources_used: Vec<String>,
    /// Account id of the department user who resolved it
    pub resolved_by: String,
}

/// Issue entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: IssueStatus,
    pub department_id: Option<i64>,
    pub reporter_id: String,
    pub address: Option<String>,
    pub resolution: Option<Resolution>,
    pub acknowledged_at: Option<i64>,
    pub started_at: Option<i64>,
    pub resolved_at: Option<i64>,
    pub closed_at: Option<i64>,
    pub rejected_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create issue payload (citizen side)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueCreate {
    #[validate(length(min = 3, max = 200, message = "title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 5, max = 5000, message = "description must be between 5 and 5000 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "category must be between 1 and 50 characters"))]
    pub category: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[validate(length(min = 1, max = 64, message = "reporter_id is required"))]
    pub reporter_id: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "address must be at most 500 characters"))]
    pub address: Option<String>,
}

/// Status change request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatusUpdate {
    pub status: String,
}

/// Resolve request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueResolve {
    #[validate(custom(function = "validate_resolution_description"))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_string_list"))]
    pub evidence: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cost must not be negative"))]
    pub cost: Option<f64>,
    #[serde(default, alias = "resources")]
    #[validate(custom(function = "validate_string_list"))]
    pub resources_used: Vec<String>,
}

impl IssueResolve {
    /// Build the stored resolution payload
    pub fn into_resolution(self, resolved_by: impl Into<String>) -> Resolution {
        Resolution {
            description: self.description.trim().to_string(),
            evidence: self.evidence.into_iter().map(|s| s.trim().to_string()).collect(),
            cost: self.cost,
            resources_used: self
                .resources_used
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect(),
            resolved_by: resolved_by.into(),
        }
    }
}

fn validate_resolution_description(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(5..=5000).contains(&len) {
        return Err(ValidationError::new("length")
            .with_message("description must be between 5 and 5000 characters".into()));
    }
    Ok(())
}

fn validate_string_list(values: &Vec<String>) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ValidationError::new("list").with_message("entries must not be empty".into()));
    }
    Ok(())
}
