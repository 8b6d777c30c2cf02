use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{PasswordHash, Role};
use crate::error::PortalError;
use crate::ids::{AccountId, CompanyId, InternId, ProgramId};
use crate::internship::companies::domain::looks_like_email;

/// Login account as exposed to clients; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ProgramId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intern_id: Option<InternId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Account together with its credential material.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub account: Account,
    pub password: PasswordHash,
}

/// Row written by the repository when provisioning an account.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub program_id: Option<ProgramId>,
    pub company_id: Option<CompanyId>,
    pub intern_id: Option<InternId>,
    pub password: PasswordHash,
}

/// Coordinator request to provision a staff or HTE account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub program_id: Option<ProgramId>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

/// Account returned once with the generated password the holder must change.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedAccount {
    pub account: Account,
    pub initial_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActiveToggle {
    pub active: bool,
}

pub fn normalize_email(raw: &str) -> Result<String, PortalError> {
    let email = raw.trim().to_ascii_lowercase();
    if email.len() > 254 || !looks_like_email(&email) {
        return Err(PortalError::validation(format!(
            "'{}' is not a valid email address",
            raw.trim()
        )));
    }
    Ok(email)
}

pub fn normalize_display_name(raw: &str) -> Result<String, PortalError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() || name.len() > 120 {
        return Err(PortalError::validation(
            "display name is required and must be at most 120 characters",
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(
            normalize_email("  Coordinator@PUP.edu.ph ").expect("valid"),
            "coordinator@pup.edu.ph"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a@b").is_err());
    }

    #[test]
    fn display_names_collapse_whitespace() {
        assert_eq!(
            normalize_display_name("  Prof.   Ana   Reyes ").expect("valid"),
            "Prof. Ana Reyes"
        );
        assert!(normalize_display_name("   ").is_err());
    }
}
