//! Roles, session tokens and the request extractor that gates every portal
//! route.

pub mod password;
pub mod token;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PortalError;
use crate::ids::{AccountId, CompanyId, InternId, ProgramId};
use crate::internship::interns::Intern;
use crate::storage::UnknownVariant;

pub use password::{generate_initial_password, validate_password, PasswordError, PasswordHash};
pub use token::{Claims, IssuedToken, Subject, TokenIssuer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Adviser,
    Intern,
    Supervisor,
}

impl Role {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Coordinator,
            Self::Adviser,
            Self::Intern,
            Self::Supervisor,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Adviser => "adviser",
            Self::Intern => "intern",
            Self::Supervisor => "supervisor",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Coordinator => "OJT Coordinator",
            Self::Adviser => "Faculty Adviser",
            Self::Intern => "Student Intern",
            Self::Supervisor => "HTE Supervisor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

/// Authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: AccountId,
    pub email: String,
    pub role: Role,
    pub program_id: Option<ProgramId>,
    pub company_id: Option<CompanyId>,
    pub intern_id: Option<InternId>,
}

impl Session {
    pub fn from_claims(claims: Claims) -> Option<Self> {
        Some(Self {
            account_id: claims.account_id()?,
            email: claims.email,
            role: claims.role,
            program_id: claims.program_id,
            company_id: claims.company_id,
            intern_id: claims.intern_id,
        })
    }

    pub fn require(&self, allowed: &[Role]) -> Result<(), PortalError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            warn!(account = %self.account_id, role = %self.role, "role not permitted");
            Err(PortalError::forbidden(format!(
                "{} accounts cannot perform this action",
                self.role.label()
            )))
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    /// Whether the caller may read this intern's record and related data.
    pub fn can_view(&self, intern: &Intern) -> bool {
        match self.role {
            Role::Coordinator => true,
            Role::Adviser => self.program_id == Some(intern.program_id),
            Role::Supervisor => self.company_id.is_some() && self.company_id == intern.company_id,
            Role::Intern => self.intern_id == Some(intern.id),
        }
    }

    /// Whether the caller may change the intern's record or placement.
    pub fn can_manage(&self, intern: &Intern) -> bool {
        match self.role {
            Role::Coordinator => true,
            Role::Adviser => self.program_id == Some(intern.program_id),
            Role::Supervisor | Role::Intern => false,
        }
    }

    pub fn ensure_view(&self, intern: &Intern) -> Result<(), PortalError> {
        if self.can_view(intern) {
            Ok(())
        } else {
            warn!(account = %self.account_id, intern = %intern.id, "intern outside caller scope");
            Err(PortalError::forbidden("intern is outside your scope"))
        }
    }

    pub fn ensure_manage(&self, intern: &Intern) -> Result<(), PortalError> {
        if self.can_manage(intern) {
            Ok(())
        } else {
            warn!(account = %self.account_id, intern = %intern.id, "intern not manageable by caller");
            Err(PortalError::forbidden("you cannot manage this intern"))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let issuer = Arc::<TokenIssuer>::from_ref(state);
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(PortalError::Unauthorized("missing bearer token"))?;

        let claims = issuer.verify(token).map_err(|err| {
            warn!(error = %err, "rejected session token");
            PortalError::Unauthorized("invalid or expired session token")
        })?;

        Session::from_claims(claims).ok_or(PortalError::Unauthorized("malformed session token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internship::interns::InternStatus;
    use axum::http::Request;
    use chrono::{Duration, NaiveDate, Utc};

    fn session(role: Role) -> Session {
        Session {
            account_id: AccountId(1),
            email: "someone@pup.edu.ph".to_string(),
            role,
            program_id: None,
            company_id: None,
            intern_id: None,
        }
    }

    fn intern() -> Intern {
        Intern {
            id: InternId(10),
            student_number: "2021-00123-MN-0".to_string(),
            last_name: "Dela Cruz".to_string(),
            first_name: "Juan".to_string(),
            middle_name: None,
            email: "juan@iskolarngbayan.pup.edu.ph".to_string(),
            program_id: ProgramId(3),
            section: "BSIT 4-1".to_string(),
            school_year: "2025-2026".to_string(),
            required_hours: 486,
            status: InternStatus::Deployed,
            company_id: Some(CompanyId(5)),
            supervisor_id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 8, 4),
            end_date: None,
        }
    }

    #[test]
    fn role_parses_its_own_rendering() {
        for role in Role::ordered() {
            assert_eq!(role.as_str().parse::<Role>().expect("parses"), role);
        }
        assert!("dean".parse::<Role>().is_err());
    }

    #[test]
    fn scope_follows_program_company_and_self() {
        let intern = intern();

        assert!(session(Role::Coordinator).can_view(&intern));

        let mut adviser = session(Role::Adviser);
        adviser.program_id = Some(ProgramId(3));
        assert!(adviser.can_view(&intern));
        assert!(adviser.can_manage(&intern));
        adviser.program_id = Some(ProgramId(4));
        assert!(!adviser.can_view(&intern));

        let mut supervisor = session(Role::Supervisor);
        assert!(!supervisor.can_view(&intern));
        supervisor.company_id = Some(CompanyId(5));
        assert!(supervisor.can_view(&intern));
        assert!(!supervisor.can_manage(&intern));

        let mut student = session(Role::Intern);
        student.intern_id = Some(InternId(10));
        assert!(student.can_view(&intern));
        student.intern_id = Some(InternId(11));
        assert!(!student.can_view(&intern));
    }

    #[test]
    fn require_rejects_other_roles() {
        let adviser = session(Role::Adviser);
        assert!(adviser.require(&[Role::Coordinator, Role::Adviser]).is_ok());
        let err = adviser.require(&[Role::Coordinator]).expect_err("forbidden");
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[derive(Clone)]
    struct TestState(Arc<TokenIssuer>);

    impl FromRef<TestState> for Arc<TokenIssuer> {
        fn from_ref(state: &TestState) -> Self {
            state.0.clone()
        }
    }

    #[tokio::test]
    async fn extractor_decodes_bearer_tokens() {
        let issuer = Arc::new(TokenIssuer::new(
            b"extractor-secret-extractor-secret",
            Duration::minutes(5),
        ));
        let issued = issuer
            .issue(
                Subject {
                    account_id: AccountId(42),
                    email: "coordinator@pup.edu.ph".to_string(),
                    role: Role::Coordinator,
                    program_id: None,
                    company_id: None,
                    intern_id: None,
                },
                Utc::now(),
            )
            .expect("token");
        let state = TestState(issuer);

        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(())
            .expect("request");
        let (mut parts, _) = request.into_parts();
        let session = Session::from_request_parts(&mut parts, &state)
            .await
            .expect("session decodes");
        assert_eq!(session.account_id, AccountId(42));
        assert_eq!(session.role, Role::Coordinator);

        let (mut parts, _) = Request::builder().body(()).expect("request").into_parts();
        let err = Session::from_request_parts(&mut parts, &state)
            .await
            .expect_err("missing header");
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
