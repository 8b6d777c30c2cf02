//! Shared fixtures for service and router tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use chrono::{Days, Duration, NaiveDate, Utc};
use tempfile::TempDir;

use super::accounts::{Account, AccountRepository, NewAccount};
use super::companies::{Company, CompanyDraft};
use super::documents::DocumentVault;
use super::interns::{Enrollment, InternDraft, InternRepository, PlacementRequest};
use super::programs::{NewProgram, Program};
use super::{today, Portal, PortalState};
use crate::auth::{Role, Session, Subject, TokenIssuer};
use crate::config::InternshipConfig;
use crate::http::portal_router;
use crate::ids::{InternId, ProgramId};
use crate::storage::SqliteStore;

pub(crate) const REQUIRED_HOURS: u32 = 486;
pub(crate) const MAX_UPLOAD_BYTES: usize = 64 * 1024;
pub(crate) const COORDINATOR_PASSWORD: &str = "coordinator-pass-1";

/// A portal over an in-memory store with a bootstrapped coordinator.
pub(crate) struct Fixture {
    pub portal: PortalState<SqliteStore>,
    pub coordinator: Session,
    _vault_dir: TempDir,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
        let vault_dir = tempfile::tempdir().expect("vault dir");
        let vault = Arc::new(DocumentVault::open(vault_dir.path()).expect("vault"));
        let tokens = Arc::new(TokenIssuer::new(b"fixture-signing-secret", Duration::hours(8)));
        let portal = Portal::new(
            store,
            tokens,
            vault,
            &InternshipConfig {
                default_required_hours: REQUIRED_HOURS,
            },
            MAX_UPLOAD_BYTES,
        );
        let account = portal
            .accounts
            .bootstrap_coordinator(
                "ojt.office@pup.edu.ph",
                "OJT Coordinator",
                COORDINATOR_PASSWORD,
                Utc::now(),
            )
            .expect("coordinator");
        Self {
            coordinator: session_for(&account),
            portal: PortalState::new(portal),
            _vault_dir: vault_dir,
        }
    }

    pub(crate) fn router(&self) -> Router {
        portal_router(self.portal.clone())
    }

    pub(crate) fn program(&self, code: &str) -> Program {
        self.portal
            .programs
            .create(
                &self.coordinator,
                NewProgram {
                    code: code.to_string(),
                    name: format!("Bachelor of Science in {code}"),
                },
                Utc::now(),
            )
            .expect("program")
    }

    /// A company whose MOA is active today.
    pub(crate) fn company(&self, name: &str, slots: u32) -> Company {
        let today = today();
        self.portal
            .companies
            .create(
                &self.coordinator,
                CompanyDraft {
                    name: name.to_string(),
                    address: "Ortigas Center, Pasig City".to_string(),
                    industry: "Information Technology".to_string(),
                    contact_person: "HR Officer".to_string(),
                    contact_email: "hr@example.com".to_string(),
                    contact_phone: "02-8888-0000".to_string(),
                    slots,
                    moa_signed_on: today.checked_sub_days(Days::new(30)),
                    moa_expires_on: today.checked_add_days(Days::new(365)),
                },
                today,
                Utc::now(),
            )
            .expect("company")
            .company
    }

    pub(crate) fn staff(
        &self,
        role: Role,
        name: &str,
        program: Option<ProgramId>,
        company: Option<&Company>,
    ) -> Session {
        let provisioned = self
            .portal
            .accounts
            .create(
                &self.coordinator,
                NewAccount {
                    email: format!("{}@pup.edu.ph", name.to_ascii_lowercase().replace(' ', ".")),
                    display_name: name.to_string(),
                    role,
                    program_id: program,
                    company_id: company.map(|company| company.id),
                },
                Utc::now(),
            )
            .expect("staff account");
        session_for(&provisioned.account)
    }

    pub(crate) fn enroll(&self, program: &Program, serial: u32) -> Enrollment {
        self.portal
            .interns
            .enroll(
                &self.coordinator,
                InternDraft {
                    student_number: format!("2021-{serial:05}-MN-0"),
                    last_name: "Dela Cruz".to_string(),
                    first_name: format!("Juan {serial}"),
                    middle_name: Some("Mercado".to_string()),
                    email: format!("intern{serial}@iskolarngbayan.pup.edu.ph"),
                    program_id: program.id,
                    section: "BSIT 4-1".to_string(),
                    school_year: "2025-2026".to_string(),
                    required_hours: None,
                },
                Utc::now(),
            )
            .expect("enrollment")
    }

    /// Places the intern at the company, started `days_ago` days back.
    pub(crate) fn place(
        &self,
        intern_id: InternId,
        company: &Company,
        supervisor: Option<&Session>,
        days_ago: u64,
    ) {
        let today = today();
        self.portal
            .interns
            .place(
                &self.coordinator,
                intern_id,
                PlacementRequest {
                    company_id: company.id,
                    supervisor_id: supervisor.map(|session| session.account_id),
                    start_date: start_date(today, days_ago),
                    end_date: None,
                },
                today,
            )
            .expect("placement");
    }

    pub(crate) fn intern_session(&self, enrollment: &Enrollment) -> Session {
        let account = self
            .portal
            .store
            .fetch_account(enrollment.account_id)
            .expect("fetch")
            .expect("intern account");
        let mut session = session_for(&account);
        session.program_id = Some(enrollment.intern.intern.program_id);
        session.company_id = enrollment.intern.intern.company_id;
        session
    }

    /// Bearer header value for the session's account.
    pub(crate) fn bearer(&self, session: &Session) -> String {
        let subject = Subject {
            account_id: session.account_id,
            email: session.email.clone(),
            role: session.role,
            program_id: session.program_id,
            company_id: session.company_id,
            intern_id: session.intern_id,
        };
        let issued = self
            .portal
            .tokens
            .issue(subject, Utc::now())
            .expect("token");
        format!("Bearer {}", issued.token)
    }

    pub(crate) fn get(&self, session: &Session, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer(session))
            .body(Body::empty())
            .expect("request")
    }

    pub(crate) fn json(
        &self,
        session: &Session,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer(session))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }
}

pub(crate) fn session_for(account: &Account) -> Session {
    Session {
        account_id: account.id,
        email: account.email.clone(),
        role: account.role,
        program_id: account.program_id,
        company_id: account.company_id,
        intern_id: account.intern_id,
    }
}

pub(crate) fn start_date(today: NaiveDate, days_ago: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days_ago)).expect("date in range")
}

pub(crate) async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json body")
}
