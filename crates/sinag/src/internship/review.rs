//! Approval state shared by submitted documents and activity logs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::storage::UnknownVariant;

const MAX_REMARKS_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Reviewer verdict as posted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Verdict ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: ReviewStatus,
    pub remarks: Option<String>,
}

impl ReviewRequest {
    /// Rejections must say why.
    pub fn into_verdict(self) -> Result<Verdict, PortalError> {
        let remarks = self
            .remarks
            .map(|remarks| remarks.trim().to_string())
            .filter(|remarks| !remarks.is_empty());
        if remarks
            .as_ref()
            .is_some_and(|remarks| remarks.chars().count() > MAX_REMARKS_LEN)
        {
            return Err(PortalError::validation(format!(
                "remarks must be at most {MAX_REMARKS_LEN} characters"
            )));
        }
        let status = match self.decision {
            ReviewDecision::Approve => ReviewStatus::Approved,
            ReviewDecision::Reject if remarks.is_none() => {
                return Err(PortalError::validation("a rejection needs remarks"));
            }
            ReviewDecision::Reject => ReviewStatus::Rejected,
        };
        Ok(Verdict { status, remarks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_without_remarks_is_refused() {
        let request = ReviewRequest {
            decision: ReviewDecision::Reject,
            remarks: Some("   ".to_string()),
        };
        assert!(matches!(
            request.into_verdict(),
            Err(PortalError::Validation(_))
        ));
    }

    #[test]
    fn approval_keeps_optional_remarks() {
        let verdict = ReviewRequest {
            decision: ReviewDecision::Approve,
            remarks: Some(" Looks good ".to_string()),
        }
        .into_verdict()
        .expect("verdict");
        assert_eq!(verdict.status, ReviewStatus::Approved);
        assert_eq!(verdict.remarks.as_deref(), Some("Looks good"));
    }
}
