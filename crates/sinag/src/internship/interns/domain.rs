use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::ids::{AccountId, CompanyId, InternId, ProgramId};
use crate::internship::accounts::domain::normalize_email;
use crate::storage::UnknownVariant;

/// PUP student number, e.g. `2021-00123-MN-0`.
const STUDENT_NUMBER_PATTERN: &str = r"^\d{4}-\d{5}-[A-Z]{2}-\d$";

fn student_number_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(STUDENT_NUMBER_PATTERN).expect("Invalid regex pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternStatus {
    Pending,
    Deployed,
    Completed,
    Dropped,
}

impl InternStatus {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Pending,
            Self::Deployed,
            Self::Completed,
            Self::Dropped,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Deployed => "deployed",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting placement",
            Self::Deployed => "Deployed",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
        }
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Deployed)
                | (Self::Deployed, Self::Completed)
                | (Self::Pending | Self::Deployed, Self::Dropped)
                | (Self::Deployed, Self::Pending)
                | (Self::Dropped, Self::Pending)
        )
    }

    pub fn ensure_transition(self, next: Self) -> Result<(), PortalError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(PortalError::validation(format!(
                "an intern cannot move from {self} to {next}"
            )))
        }
    }
}

impl fmt::Display for InternStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intern {
    pub id: InternId,
    pub student_number: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub program_id: ProgramId,
    pub section: String,
    pub school_year: String,
    pub required_hours: u32,
    pub status: InternStatus,
    pub company_id: Option<CompanyId>,
    pub supervisor_id: Option<AccountId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Intern {
    /// `Dela Cruz, Juan M.` style name used in rosters and reports.
    pub fn full_name(&self) -> String {
        match self
            .middle_name
            .as_deref()
            .and_then(|middle| middle.chars().next())
        {
            Some(initial) => format!("{}, {} {}.", self.last_name, self.first_name, initial),
            None => format!("{}, {}", self.last_name, self.first_name),
        }
    }

    pub fn view(self) -> InternView {
        InternView {
            full_name: self.full_name(),
            status_label: self.status.label(),
            intern: self,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InternView {
    #[serde(flatten)]
    pub intern: Intern,
    pub full_name: String,
    pub status_label: &'static str,
}

/// Enrollment payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InternDraft {
    pub student_number: String,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    pub program_id: ProgramId,
    pub section: String,
    pub school_year: String,
    #[serde(default)]
    pub required_hours: Option<u32>,
}

/// Intern fields after trimming and format checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidIntern {
    pub student_number: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub program_id: ProgramId,
    pub section: String,
    pub school_year: String,
    pub required_hours: u32,
}

impl InternDraft {
    pub fn validate(self, default_required_hours: u32) -> Result<ValidIntern, PortalError> {
        let student_number = normalize_student_number(&self.student_number)?;
        let profile = ProfileUpdate {
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            email: self.email,
            section: self.section,
            school_year: self.school_year,
            required_hours: self.required_hours,
        }
        .validate(default_required_hours)?;

        Ok(ValidIntern {
            student_number,
            last_name: profile.last_name,
            first_name: profile.first_name,
            middle_name: profile.middle_name,
            email: profile.email,
            program_id: self.program_id,
            section: profile.section,
            school_year: profile.school_year,
            required_hours: profile.required_hours,
        })
    }
}

/// Editable intern profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    pub section: String,
    pub school_year: String,
    #[serde(default)]
    pub required_hours: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub section: String,
    pub school_year: String,
    pub required_hours: u32,
}

impl ProfileUpdate {
    pub fn validate(self, default_required_hours: u32) -> Result<ValidProfile, PortalError> {
        let last_name = required_name(&self.last_name, "last name")?;
        let first_name = required_name(&self.first_name, "first name")?;
        let middle_name = self
            .middle_name
            .map(|name| collapse(&name))
            .filter(|name| !name.is_empty());
        let email = normalize_email(&self.email)?;
        let section = collapse(&self.section);
        if section.is_empty() {
            return Err(PortalError::validation("section is required"));
        }
        let school_year = normalize_school_year(&self.school_year)?;
        let required_hours = self.required_hours.unwrap_or(default_required_hours);
        if !(1..=2000).contains(&required_hours) {
            return Err(PortalError::validation(
                "required hours must be between 1 and 2000",
            ));
        }

        Ok(ValidProfile {
            last_name,
            first_name,
            middle_name,
            email,
            section,
            school_year,
            required_hours,
        })
    }
}

/// Company assignment request.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementRequest {
    pub company_id: CompanyId,
    #[serde(default)]
    pub supervisor_id: Option<AccountId>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Placement columns written together on every status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementChange {
    pub status: InternStatus,
    pub company_id: Option<CompanyId>,
    pub supervisor_id: Option<AccountId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PlacementChange {
    pub fn keep(intern: &Intern, status: InternStatus) -> Self {
        Self {
            status,
            company_id: intern.company_id,
            supervisor_id: intern.supervisor_id,
            start_date: intern.start_date,
            end_date: intern.end_date,
        }
    }

    pub fn cleared(status: InternStatus) -> Self {
        Self {
            status,
            company_id: None,
            supervisor_id: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// List filters accepted from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InternFilter {
    #[serde(default)]
    pub program_id: Option<ProgramId>,
    #[serde(default)]
    pub status: Option<InternStatus>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub q: Option<String>,
}

/// Enrollment outcome with the one-time login password.
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub intern: InternView,
    pub account_id: AccountId,
    pub initial_password: String,
}

pub fn normalize_student_number(raw: &str) -> Result<String, PortalError> {
    let number = raw.trim().to_ascii_uppercase();
    if student_number_regex().is_match(&number) {
        Ok(number)
    } else {
        Err(PortalError::validation(format!(
            "'{}' is not a student number of the form YYYY-NNNNN-XX-N",
            raw.trim()
        )))
    }
}

/// Accepts `2025-2026`; the second year must follow the first.
pub fn normalize_school_year(raw: &str) -> Result<String, PortalError> {
    let invalid = || {
        PortalError::validation(format!(
            "'{}' is not a school year such as 2025-2026",
            raw.trim()
        ))
    };
    let (start, end) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let start: u16 = start.trim().parse().map_err(|_| invalid())?;
    let end: u16 = end.trim().parse().map_err(|_| invalid())?;
    if start < 2000 || start.checked_add(1) != Some(end) {
        return Err(invalid());
    }
    Ok(format!("{start}-{end}"))
}

fn required_name(raw: &str, field: &str) -> Result<String, PortalError> {
    let value = collapse(raw);
    if value.is_empty() || value.len() > 100 {
        return Err(PortalError::validation(format!(
            "{field} is required and must be at most 100 characters"
        )));
    }
    Ok(value)
}

fn collapse(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> InternDraft {
        InternDraft {
            student_number: " 2021-00123-mn-0 ".to_string(),
            last_name: "Dela  Cruz".to_string(),
            first_name: "Juan".to_string(),
            middle_name: Some("Mercado".to_string()),
            email: "Juan@IskolarNgBayan.pup.edu.ph".to_string(),
            program_id: ProgramId(1),
            section: "BSIT 4-1".to_string(),
            school_year: "2025-2026".to_string(),
            required_hours: None,
        }
    }

    #[test]
    fn status_machine_allows_only_listed_moves() {
        use InternStatus::*;
        let allowed = [
            (Pending, Deployed),
            (Deployed, Completed),
            (Pending, Dropped),
            (Deployed, Dropped),
            (Deployed, Pending),
            (Dropped, Pending),
        ];
        for from in InternStatus::ordered() {
            for to in InternStatus::ordered() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn draft_normalizes_fields_and_defaults_hours() {
        let valid = draft().validate(486).expect("valid");
        assert_eq!(valid.student_number, "2021-00123-MN-0");
        assert_eq!(valid.last_name, "Dela Cruz");
        assert_eq!(valid.email, "juan@iskolarngbayan.pup.edu.ph");
        assert_eq!(valid.required_hours, 486);
    }

    #[test]
    fn rejects_malformed_student_numbers_and_school_years() {
        let mut bad = draft();
        bad.student_number = "2021-123-MN-0".to_string();
        assert!(matches!(bad.validate(486), Err(PortalError::Validation(_))));

        assert!(normalize_school_year("2025-2027").is_err());
        assert!(normalize_school_year("SY 2025").is_err());
        assert_eq!(
            normalize_school_year(" 2025 - 2026 ").expect("valid"),
            "2025-2026"
        );
    }

    #[test]
    fn school_year_bounds_do_not_overflow() {
        assert!(matches!(
            normalize_school_year("65535-0"),
            Err(PortalError::Validation(_))
        ));
        assert!(normalize_school_year("65535-65535").is_err());
        assert!(normalize_school_year("2025-2025").is_err());
        assert!(normalize_school_year("70000-70001").is_err());
    }

    #[test]
    fn full_name_uses_middle_initial() {
        let valid = draft().validate(486).expect("valid");
        let intern = Intern {
            id: InternId(1),
            student_number: valid.student_number,
            last_name: valid.last_name,
            first_name: valid.first_name,
            middle_name: valid.middle_name,
            email: valid.email,
            program_id: valid.program_id,
            section: valid.section,
            school_year: valid.school_year,
            required_hours: valid.required_hours,
            status: InternStatus::Pending,
            company_id: None,
            supervisor_id: None,
            start_date: None,
            end_date: None,
        };
        assert_eq!(intern.full_name(), "Dela Cruz, Juan M.");
    }
}
