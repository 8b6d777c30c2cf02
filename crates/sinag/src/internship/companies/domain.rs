use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::ids::CompanyId;
use crate::storage::UnknownVariant;

/// Days before expiry at which an MOA is flagged for renewal.
pub const MOA_RENEWAL_WINDOW_DAYS: i64 = 30;

/// Signed Memorandum of Agreement between the university and an HTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moa {
    pub signed_on: NaiveDate,
    pub expires_on: NaiveDate,
}

impl Moa {
    pub fn new(signed_on: NaiveDate, expires_on: NaiveDate) -> Result<Self, PortalError> {
        if expires_on < signed_on {
            return Err(PortalError::validation(
                "MOA expiry date cannot be earlier than its signing date",
            ));
        }
        Ok(Self {
            signed_on,
            expires_on,
        })
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.expires_on - today).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoaStatus {
    Missing,
    Pending,
    Active,
    Expiring,
    Expired,
}

impl MoaStatus {
    pub fn evaluate(moa: Option<&Moa>, today: NaiveDate) -> Self {
        let Some(moa) = moa else {
            return Self::Missing;
        };
        if today < moa.signed_on {
            Self::Pending
        } else if moa.expires_on < today {
            Self::Expired
        } else if moa.days_remaining(today) <= MOA_RENEWAL_WINDOW_DAYS {
            Self::Expiring
        } else {
            Self::Active
        }
    }

    /// Interns may only be deployed under a currently valid agreement.
    pub const fn allows_placement(self) -> bool {
        matches!(self, Self::Active | Self::Expiring)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Missing => "No MOA on file",
            Self::Pending => "Not yet effective",
            Self::Active => "Active",
            Self::Expiring => "Expiring soon",
            Self::Expired => "Expired",
        }
    }
}

impl fmt::Display for MoaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoaStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "missing" => Ok(Self::Missing),
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "expiring" => Ok(Self::Expiring),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Host Training Establishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: String,
    pub industry: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub slots: u32,
    pub moa: Option<Moa>,
}

impl Company {
    pub fn moa_status(&self, today: NaiveDate) -> MoaStatus {
        MoaStatus::evaluate(self.moa.as_ref(), today)
    }

    pub fn view(&self, today: NaiveDate) -> CompanyView {
        let moa_status = self.moa_status(today);
        CompanyView {
            company: self.clone(),
            moa_status,
            moa_status_label: moa_status.label(),
            moa_days_remaining: self.moa.map(|moa| moa.days_remaining(today)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyView {
    #[serde(flatten)]
    pub company: Company,
    pub moa_status: MoaStatus,
    pub moa_status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moa_days_remaining: Option<i64>,
}

/// Create/update payload for a company.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub slots: u32,
    #[serde(default)]
    pub moa_signed_on: Option<NaiveDate>,
    #[serde(default)]
    pub moa_expires_on: Option<NaiveDate>,
}

impl CompanyDraft {
    /// Trims text fields and checks the MOA pair.
    pub fn validate(self) -> Result<ValidCompany, PortalError> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.len() > 200 {
            return Err(PortalError::validation(
                "company name is required and must be at most 200 characters",
            ));
        }
        let contact_email = self.contact_email.trim().to_ascii_lowercase();
        if !contact_email.is_empty() && !looks_like_email(&contact_email) {
            return Err(PortalError::validation("contact email is not valid"));
        }
        let moa = parse_moa_pair(self.moa_signed_on, self.moa_expires_on)?;

        Ok(ValidCompany {
            name,
            address: self.address.trim().to_string(),
            industry: self.industry.trim().to_string(),
            contact_person: self.contact_person.trim().to_string(),
            contact_email,
            contact_phone: self.contact_phone.trim().to_string(),
            slots: self.slots,
            moa,
        })
    }
}

/// Company fields after validation, ready for the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCompany {
    pub name: String,
    pub address: String,
    pub industry: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub slots: u32,
    pub moa: Option<Moa>,
}

pub fn parse_moa_pair(
    signed_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
) -> Result<Option<Moa>, PortalError> {
    match (signed_on, expires_on) {
        (Some(signed_on), Some(expires_on)) => Moa::new(signed_on, expires_on).map(Some),
        (None, None) => Ok(None),
        _ => Err(PortalError::validation(
            "MOA signing and expiry dates must be provided together",
        )),
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Deployed interns against the company's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub company_id: CompanyId,
    pub slots: u32,
    pub deployed: u32,
    pub available: u32,
}

impl Occupancy {
    pub fn new(company_id: CompanyId, slots: u32, deployed: u32) -> Self {
        Self {
            company_id,
            slots,
            deployed,
            available: slots.saturating_sub(deployed),
        }
    }

    pub const fn is_full(&self) -> bool {
        self.available == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn moa_status_tracks_the_calendar() {
        let moa = Moa::new(date(2025, 1, 15), date(2026, 1, 15)).expect("valid");
        assert_eq!(MoaStatus::evaluate(None, date(2025, 6, 1)), MoaStatus::Missing);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2025, 1, 1)), MoaStatus::Pending);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2025, 6, 1)), MoaStatus::Active);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2025, 12, 16)), MoaStatus::Expiring);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2026, 1, 15)), MoaStatus::Expiring);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2026, 1, 16)), MoaStatus::Expired);
    }

    #[test]
    fn renewal_window_is_inclusive() {
        let moa = Moa::new(date(2025, 1, 1), date(2025, 12, 31)).expect("valid");
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2025, 12, 1)), MoaStatus::Expiring);
        assert_eq!(MoaStatus::evaluate(Some(&moa), date(2025, 11, 30)), MoaStatus::Active);
    }

    #[test]
    fn moa_dates_must_come_in_order_and_in_pairs() {
        assert!(Moa::new(date(2025, 2, 1), date(2025, 1, 1)).is_err());
        assert!(parse_moa_pair(Some(date(2025, 1, 1)), None).is_err());
        assert_eq!(parse_moa_pair(None, None).expect("empty ok"), None);
    }

    #[test]
    fn only_current_agreements_allow_placement() {
        assert!(MoaStatus::Active.allows_placement());
        assert!(MoaStatus::Expiring.allows_placement());
        assert!(!MoaStatus::Expired.allows_placement());
        assert!(!MoaStatus::Pending.allows_placement());
        assert!(!MoaStatus::Missing.allows_placement());
    }

    #[test]
    fn draft_validation_trims_and_checks_email() {
        let draft = CompanyDraft {
            name: "  Accenture Philippines ".to_string(),
            address: "Taguig".to_string(),
            industry: "IT Services".to_string(),
            contact_person: "Maria Santos".to_string(),
            contact_email: "HR@Accenture.com".to_string(),
            contact_phone: "+63 2 8888 0000".to_string(),
            slots: 5,
            moa_signed_on: None,
            moa_expires_on: None,
        };
        let valid = draft.clone().validate().expect("valid");
        assert_eq!(valid.name, "Accenture Philippines");
        assert_eq!(valid.contact_email, "hr@accenture.com");

        let mut bad = draft;
        bad.contact_email = "not-an-email".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn occupancy_never_underflows() {
        let occupancy = Occupancy::new(CompanyId(1), 2, 3);
        assert_eq!(occupancy.available, 0);
        assert!(occupancy.is_full());
    }
}
