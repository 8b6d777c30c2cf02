use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::ids::{AccountId, InternId, LogId};
use crate::internship::review::ReviewStatus;

/// Longest creditable day.
pub const MAX_WORKED_MINUTES: u32 = 12 * 60;
pub const MAX_ACTIVITIES_LEN: usize = 2000;

/// One day of the intern's daily time record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLog {
    pub id: LogId,
    pub intern_id: InternId,
    pub log_date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: NaiveTime,
    pub break_minutes: u32,
    pub worked_minutes: u32,
    pub activities: String,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogDraft {
    pub log_date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: NaiveTime,
    #[serde(default)]
    pub break_minutes: u32,
    pub activities: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLog {
    pub log_date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: NaiveTime,
    pub break_minutes: u32,
    pub worked_minutes: u32,
    pub activities: String,
}

impl LogDraft {
    /// Checks the entry against the calendar and the intern's start date.
    pub fn validate(
        self,
        start_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<ValidLog, PortalError> {
        if self.log_date > today {
            return Err(PortalError::validation("log date cannot be in the future"));
        }
        if let Some(start) = start_date {
            if self.log_date < start {
                return Err(PortalError::validation(format!(
                    "log date cannot be before the internship start date {start}"
                )));
            }
        }
        if self.time_out <= self.time_in {
            return Err(PortalError::validation("time_out must be after time_in"));
        }

        let span = (self.time_out - self.time_in).num_minutes();
        let worked = span - i64::from(self.break_minutes);
        let worked_minutes = u32::try_from(worked).unwrap_or(0);
        if !(1..=MAX_WORKED_MINUTES).contains(&worked_minutes) {
            return Err(PortalError::validation(format!(
                "worked time must be between 1 minute and {} hours after breaks",
                MAX_WORKED_MINUTES / 60
            )));
        }

        let activities = self.activities.trim().to_string();
        let len = activities.chars().count();
        if len == 0 || len > MAX_ACTIVITIES_LEN {
            return Err(PortalError::validation(format!(
                "activities must be between 1 and {MAX_ACTIVITIES_LEN} characters"
            )));
        }

        Ok(ValidLog {
            log_date: self.log_date,
            time_in: self.time_in,
            time_out: self.time_out,
            break_minutes: self.break_minutes,
            worked_minutes,
            activities,
        })
    }
}

/// Query-string filters for a log listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LogRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogTotals {
    pub approved_minutes: i64,
    pub pending_minutes: i64,
}

/// Progress toward the required internship hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoursSummary {
    pub intern_id: InternId,
    pub required_hours: u32,
    pub approved_minutes: i64,
    pub pending_minutes: i64,
    pub approved_hours: f64,
    pub pending_hours: f64,
    pub remaining_hours: f64,
    pub percent_complete: f64,
}

impl HoursSummary {
    pub fn new(intern_id: InternId, required_hours: u32, totals: LogTotals) -> Self {
        let required_minutes = i64::from(required_hours) * 60;
        let percent = if required_minutes == 0 {
            100.0
        } else {
            (totals.approved_minutes as f64 / required_minutes as f64 * 100.0).min(100.0)
        };
        let remaining = (required_minutes - totals.approved_minutes).max(0);
        Self {
            intern_id,
            required_hours,
            approved_minutes: totals.approved_minutes,
            pending_minutes: totals.pending_minutes,
            approved_hours: hours(totals.approved_minutes),
            pending_hours: hours(totals.pending_minutes),
            remaining_hours: hours(remaining),
            percent_complete: round2(percent),
        }
    }

    pub fn is_met(&self) -> bool {
        self.remaining_hours == 0.0
    }
}

fn hours(minutes: i64) -> f64 {
    round2(minutes as f64 / 60.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).expect("date")
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("time")
    }

    fn draft() -> LogDraft {
        LogDraft {
            log_date: date(10),
            time_in: time(8, 0),
            time_out: time(17, 0),
            break_minutes: 60,
            activities: "  Configured the staging database  ".to_string(),
        }
    }

    #[test]
    fn computes_worked_minutes_after_breaks() {
        let log = draft().validate(Some(date(1)), date(15)).expect("valid");
        assert_eq!(log.worked_minutes, 480);
        assert_eq!(log.activities, "Configured the staging database");
    }

    #[test]
    fn rejects_dates_outside_the_internship() {
        assert!(draft().validate(Some(date(1)), date(9)).is_err());
        assert!(draft().validate(Some(date(11)), date(15)).is_err());
        assert!(draft().validate(None, date(10)).is_ok());
    }

    #[test]
    fn rejects_inverted_or_oversized_days() {
        let mut inverted = draft();
        inverted.time_out = time(7, 0);
        assert!(inverted.validate(None, date(15)).is_err());

        let mut all_break = draft();
        all_break.break_minutes = 540;
        assert!(all_break.validate(None, date(15)).is_err());

        let mut marathon = draft();
        marathon.time_in = time(5, 0);
        marathon.time_out = time(18, 30);
        marathon.break_minutes = 30;
        assert!(marathon.validate(None, date(15)).is_err());
    }

    #[test]
    fn summary_caps_progress() {
        let summary = HoursSummary::new(
            InternId(1),
            10,
            LogTotals {
                approved_minutes: 900,
                pending_minutes: 30,
            },
        );
        assert_eq!(summary.percent_complete, 100.0);
        assert_eq!(summary.remaining_hours, 0.0);
        assert_eq!(summary.pending_hours, 0.5);
        assert!(summary.is_met());

        let partial = HoursSummary::new(
            InternId(1),
            486,
            LogTotals {
                approved_minutes: 486 * 30,
                pending_minutes: 0,
            },
        );
        assert_eq!(partial.percent_complete, 50.0);
        assert_eq!(partial.remaining_hours, 243.0);
    }
}
