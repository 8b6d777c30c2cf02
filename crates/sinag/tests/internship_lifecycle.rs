//! End-to-end internship lifecycle through the public service facade:
//! enrollment, placement, requirements, daily logs, evaluations, completion
//! and printable reports.

mod common {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use sinag::auth::{Session, TokenIssuer};
    use sinag::config::InternshipConfig;
    use sinag::internship::accounts::LoginRequest;
    use sinag::internship::documents::DocumentVault;
    use sinag::{Portal, PortalState, SqliteStore};

    pub(super) const COORDINATOR_EMAIL: &str = "ojt.office@pup.edu.ph";
    pub(super) const COORDINATOR_PASSWORD: &str = "coordinator-pass-1";

    pub(super) struct Harness {
        pub(super) portal: PortalState<SqliteStore>,
        pub(super) _vault_dir: TempDir,
    }

    pub(super) fn harness() -> Harness {
        let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
        let vault_dir = tempfile::tempdir().expect("vault dir");
        let vault = Arc::new(DocumentVault::open(vault_dir.path()).expect("vault"));
        let tokens = Arc::new(TokenIssuer::new(b"integration-secret", Duration::hours(8)));
        let portal = Portal::new(
            store,
            tokens,
            vault,
            &InternshipConfig {
                default_required_hours: 486,
            },
            512 * 1024,
        );
        portal
            .accounts
            .bootstrap_coordinator(
                COORDINATOR_EMAIL,
                "OJT Coordinator",
                COORDINATOR_PASSWORD,
                Utc::now(),
            )
            .expect("bootstrap coordinator");
        Harness {
            portal: PortalState::new(portal),
            _vault_dir: vault_dir,
        }
    }

    /// Logs in and decodes the issued token the way the HTTP extractor does.
    pub(super) fn sign_in(harness: &Harness, email: &str, password: &str) -> Session {
        let response = harness
            .portal
            .accounts
            .login(
                LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                Utc::now(),
            )
            .expect("login");
        let claims = harness
            .portal
            .tokens
            .verify(&response.token)
            .expect("token verifies");
        Session::from_claims(claims).expect("session")
    }
}

use std::collections::BTreeMap;

use chrono::{Days, Local, NaiveTime, Utc};

use common::{harness, sign_in, COORDINATOR_EMAIL, COORDINATOR_PASSWORD};
use sinag::auth::Role;
use sinag::internship::accounts::NewAccount;
use sinag::internship::companies::CompanyDraft;
use sinag::internship::dashboard::Dashboard;
use sinag::internship::documents::{DocumentKind, Upload};
use sinag::internship::evaluations::{Criterion, EvaluationDraft, EvaluationPeriod};
use sinag::internship::interns::{InternDraft, InternStatus, PlacementRequest};
use sinag::internship::logbook::{LogDraft, LogRange};
use sinag::internship::programs::NewProgram;
use sinag::internship::review::{ReviewDecision, ReviewRequest, ReviewStatus};
use sinag::PortalError;

fn approve() -> ReviewRequest {
    ReviewRequest {
        decision: ReviewDecision::Approve,
        remarks: None,
    }
}

fn ratings(value: u8) -> BTreeMap<String, u8> {
    Criterion::ordered()
        .into_iter()
        .map(|criterion| (criterion.as_str().to_string(), value))
        .collect()
}

#[test]
fn intern_completes_after_approved_hours_and_final_evaluation() {
    let harness = harness();
    let portal = &harness.portal;
    let today = Local::now().date_naive();
    let coordinator = sign_in(&harness, COORDINATOR_EMAIL, COORDINATOR_PASSWORD);

    let program = portal
        .programs
        .create(
            &coordinator,
            NewProgram {
                code: "BSIT".to_string(),
                name: "BS Information Technology".to_string(),
            },
            Utc::now(),
        )
        .expect("program");
    let company = portal
        .companies
        .create(
            &coordinator,
            CompanyDraft {
                name: "Accenture Philippines".to_string(),
                address: "Cyberpark, Quezon City".to_string(),
                industry: "IT Services".to_string(),
                contact_person: "Liza Ramos".to_string(),
                contact_email: "liza.ramos@example.com".to_string(),
                contact_phone: "02-8555-1000".to_string(),
                slots: 5,
                moa_signed_on: today.checked_sub_days(Days::new(60)),
                moa_expires_on: today.checked_add_days(Days::new(300)),
            },
            today,
            Utc::now(),
        )
        .expect("company")
        .company;

    let adviser_account = portal
        .accounts
        .create(
            &coordinator,
            NewAccount {
                email: "adviser@pup.edu.ph".to_string(),
                display_name: "Prof. Ana Reyes".to_string(),
                role: Role::Adviser,
                program_id: Some(program.id),
                company_id: None,
            },
            Utc::now(),
        )
        .expect("adviser");
    let supervisor_account = portal
        .accounts
        .create(
            &coordinator,
            NewAccount {
                email: "supervisor@example.com".to_string(),
                display_name: "Maria Santos".to_string(),
                role: Role::Supervisor,
                program_id: None,
                company_id: Some(company.id),
            },
            Utc::now(),
        )
        .expect("supervisor");
    let adviser = sign_in(
        &harness,
        "adviser@pup.edu.ph",
        &adviser_account.initial_password,
    );
    let supervisor = sign_in(
        &harness,
        "supervisor@example.com",
        &supervisor_account.initial_password,
    );

    let enrollment = portal
        .interns
        .enroll(
            &adviser,
            InternDraft {
                student_number: "2021-00123-MN-0".to_string(),
                last_name: "Dela Cruz".to_string(),
                first_name: "Juan".to_string(),
                middle_name: Some("Mercado".to_string()),
                email: "juan.delacruz@iskolarngbayan.pup.edu.ph".to_string(),
                program_id: program.id,
                section: "BSIT 4-1".to_string(),
                school_year: "2025-2026".to_string(),
                required_hours: Some(16),
            },
            Utc::now(),
        )
        .expect("enrolled");
    let intern_id = enrollment.intern.intern.id;

    let start = today.checked_sub_days(Days::new(5)).expect("start");
    portal
        .interns
        .place(
            &adviser,
            intern_id,
            PlacementRequest {
                company_id: company.id,
                supervisor_id: Some(supervisor_account.account.id),
                start_date: start,
                end_date: None,
            },
            today,
        )
        .expect("placed");

    let intern = sign_in(
        &harness,
        "juan.delacruz@iskolarngbayan.pup.edu.ph",
        &enrollment.initial_password,
    );
    assert_eq!(intern.company_id, Some(company.id));

    let document = portal
        .documents
        .upload(
            &intern,
            intern_id,
            DocumentKind::Resume,
            Upload {
                file_name: "resume.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                bytes: b"%PDF-1.4\n% resume\n".to_vec(),
            },
            Utc::now(),
        )
        .expect("uploaded");
    let pending = portal.documents.pending_reviews(&adviser).expect("queue");
    assert_eq!(pending.len(), 1);
    portal
        .documents
        .review(&adviser, document.id, approve(), Utc::now())
        .expect("document approved");
    let checklist = portal.documents.checklist(&intern, intern_id).expect("checklist");
    assert_eq!(checklist.approved, 1);
    assert!(!checklist.is_complete());

    for offset in 0..2 {
        let log = portal
            .logbook
            .submit(
                &intern,
                intern_id,
                LogDraft {
                    log_date: start.checked_add_days(Days::new(offset)).expect("date"),
                    time_in: NaiveTime::from_hms_opt(8, 0, 0).expect("time"),
                    time_out: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
                    break_minutes: 60,
                    activities: "Helped migrate the helpdesk ticket queue".to_string(),
                },
                today,
                Utc::now(),
            )
            .expect("log submitted");
        assert_eq!(log.worked_minutes, 480);
        portal
            .logbook
            .review(&supervisor, log.id, approve(), Utc::now())
            .expect("log approved");
    }

    let summary = portal.logbook.summary(&adviser, intern_id).expect("summary");
    assert_eq!(summary.approved_hours, 16.0);
    assert_eq!(summary.remaining_hours, 0.0);
    assert!(summary.is_met());

    let err = portal
        .interns
        .complete(&adviser, intern_id, today)
        .expect_err("final evaluation still missing");
    assert!(matches!(err, PortalError::Validation(_)));

    for (period, value) in [(EvaluationPeriod::Midterm, 4), (EvaluationPeriod::Final, 5)] {
        portal
            .evaluations
            .submit(
                &supervisor,
                intern_id,
                EvaluationDraft {
                    period,
                    ratings: ratings(value),
                    comments: Some("Reliable and eager to learn.".to_string()),
                },
                Utc::now(),
            )
            .expect("evaluation submitted");
    }

    let completed = portal
        .interns
        .complete(&adviser, intern_id, today)
        .expect("completed");
    assert_eq!(completed.intern.status, InternStatus::Completed);
    assert_eq!(completed.intern.end_date, Some(today));

    let approved_logs = portal
        .logbook
        .list(
            &intern,
            intern_id,
            LogRange {
                status: Some(ReviewStatus::Approved),
                ..LogRange::default()
            },
        )
        .expect("logs");
    assert_eq!(approved_logs.len(), 2);

    let activity = portal
        .reports
        .intern_activity(&intern, intern_id, today)
        .expect("activity report");
    assert!(activity.starts_with(b"%PDF"));
    let roster = portal
        .reports
        .program_roster(&adviser, program.id, today)
        .expect("roster report");
    assert!(roster.starts_with(b"%PDF"));

    match portal.dashboard.for_session(&intern, today).expect("dashboard") {
        Dashboard::Intern {
            hours,
            evaluations,
            requirements,
            ..
        } => {
            assert!(hours.is_met());
            assert_eq!(evaluations.len(), 2);
            assert_eq!(requirements.approved, 1);
        }
        other => panic!("unexpected dashboard {other:?}"),
    }
}

#[test]
fn supervisors_cannot_touch_interns_at_other_companies() {
    let harness = harness();
    let portal = &harness.portal;
    let today = Local::now().date_naive();
    let coordinator = sign_in(&harness, COORDINATOR_EMAIL, COORDINATOR_PASSWORD);

    let program = portal
        .programs
        .create(
            &coordinator,
            NewProgram {
                code: "BSCS".to_string(),
                name: "BS Computer Science".to_string(),
            },
            Utc::now(),
        )
        .expect("program");
    let mut companies = Vec::new();
    for name in ["Globe Telecom", "Converge ICT"] {
        let view = portal
            .companies
            .create(
                &coordinator,
                CompanyDraft {
                    name: name.to_string(),
                    address: String::new(),
                    industry: String::new(),
                    contact_person: String::new(),
                    contact_email: String::new(),
                    contact_phone: String::new(),
                    slots: 2,
                    moa_signed_on: today.checked_sub_days(Days::new(10)),
                    moa_expires_on: today.checked_add_days(Days::new(200)),
                },
                today,
                Utc::now(),
            )
            .expect("company");
        companies.push(view.company);
    }

    let outsider_account = portal
        .accounts
        .create(
            &coordinator,
            NewAccount {
                email: "outsider@example.com".to_string(),
                display_name: "Carlo Mendoza".to_string(),
                role: Role::Supervisor,
                program_id: None,
                company_id: Some(companies[1].id),
            },
            Utc::now(),
        )
        .expect("supervisor");
    let outsider = sign_in(
        &harness,
        "outsider@example.com",
        &outsider_account.initial_password,
    );

    let enrollment = portal
        .interns
        .enroll(
            &coordinator,
            InternDraft {
                student_number: "2021-00777-MN-0".to_string(),
                last_name: "Lim".to_string(),
                first_name: "Kim".to_string(),
                middle_name: None,
                email: "kim.lim@iskolarngbayan.pup.edu.ph".to_string(),
                program_id: program.id,
                section: "BSCS 4-1".to_string(),
                school_year: "2025-2026".to_string(),
                required_hours: None,
            },
            Utc::now(),
        )
        .expect("enrolled");
    let intern_id = enrollment.intern.intern.id;
    portal
        .interns
        .place(
            &coordinator,
            intern_id,
            PlacementRequest {
                company_id: companies[0].id,
                supervisor_id: None,
                start_date: today.checked_sub_days(Days::new(3)).expect("date"),
                end_date: None,
            },
            today,
        )
        .expect("placed");
    let intern = sign_in(
        &harness,
        "kim.lim@iskolarngbayan.pup.edu.ph",
        &enrollment.initial_password,
    );

    let log = portal
        .logbook
        .submit(
            &intern,
            intern_id,
            LogDraft {
                log_date: today,
                time_in: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
                time_out: NaiveTime::from_hms_opt(12, 0, 0).expect("time"),
                break_minutes: 0,
                activities: "Orientation".to_string(),
            },
            today,
            Utc::now(),
        )
        .expect("log");

    let err = portal
        .logbook
        .review(&outsider, log.id, approve(), Utc::now())
        .expect_err("different company");
    assert!(matches!(err, PortalError::Forbidden(_)));
    let err = portal
        .evaluations
        .submit(
            &outsider,
            intern_id,
            EvaluationDraft {
                period: EvaluationPeriod::Midterm,
                ratings: ratings(3),
                comments: None,
            },
            Utc::now(),
        )
        .expect_err("different company");
    assert!(matches!(err, PortalError::Forbidden(_)));
    let err = portal
        .reports
        .intern_activity(&outsider, intern_id, today)
        .expect_err("not visible");
    assert!(matches!(err, PortalError::Forbidden(_)));
    assert!(portal
        .interns
        .list(&outsider, Default::default())
        .expect("list")
        .is_empty());
}
