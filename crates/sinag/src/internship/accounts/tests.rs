use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use super::{LoginRequest, NewAccount, PasswordChange};
use crate::auth::Role;
use crate::error::PortalError;
use crate::internship::testing::{read_json, Fixture, COORDINATOR_PASSWORD};

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[test]
fn login_issues_a_token_for_valid_credentials_only() {
    let fixture = Fixture::new();
    let accounts = &fixture.portal.accounts;

    let response = accounts
        .login(login(" OJT.Office@pup.edu.ph ", COORDINATOR_PASSWORD), Utc::now())
        .expect("login");
    assert_eq!(response.account.role, Role::Coordinator);
    assert!(response.expires_at > Utc::now());
    let claims = fixture.portal.tokens.verify(&response.token).expect("valid token");
    assert_eq!(claims.account_id(), Some(response.account.id));

    let wrong = accounts
        .login(login("ojt.office@pup.edu.ph", "not-the-password"), Utc::now())
        .expect_err("wrong password");
    let unknown = accounts
        .login(login("nobody@pup.edu.ph", COORDINATOR_PASSWORD), Utc::now())
        .expect_err("unknown email");
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(matches!(wrong, PortalError::Unauthorized(_)));
}

#[test]
fn unknown_emails_pay_for_a_password_check() {
    let fixture = Fixture::new();
    let accounts = &fixture.portal.accounts;
    let fastest = |email: &str| {
        (0..3)
            .map(|_| {
                let started = Instant::now();
                let err = accounts
                    .login(login(email, "not-the-password"), Utc::now())
                    .expect_err("refused");
                assert!(matches!(err, PortalError::Unauthorized(_)));
                started.elapsed()
            })
            .min()
            .unwrap_or(Duration::ZERO)
    };

    let wrong_password = fastest("ojt.office@pup.edu.ph");
    let unknown_email = fastest("nobody@pup.edu.ph");
    assert!(
        unknown_email * 4 >= wrong_password,
        "unknown email answered in {unknown_email:?}, wrong password in {wrong_password:?}"
    );
}

#[test]
fn intern_tokens_carry_program_and_placement() {
    let fixture = Fixture::new();
    let program = fixture.program("BSIT");
    let company = fixture.company("Accenture", 2);
    let enrollment = fixture.enroll(&program, 1);
    fixture.place(enrollment.intern.intern.id, &company, None, 3);

    let response = fixture
        .portal
        .accounts
        .login(
            login(&enrollment.intern.intern.email, &enrollment.initial_password),
            Utc::now(),
        )
        .expect("intern login");
    let claims = fixture.portal.tokens.verify(&response.token).expect("token");
    assert_eq!(claims.role, Role::Intern);
    assert_eq!(claims.intern_id, Some(enrollment.intern.intern.id));
    assert_eq!(claims.program_id, Some(program.id));
    assert_eq!(claims.company_id, Some(company.id));
}

#[test]
fn staff_accounts_need_their_scope() {
    let fixture = Fixture::new();
    let accounts = &fixture.portal.accounts;
    let request = |role, program_id, company_id| NewAccount {
        email: "staff@pup.edu.ph".to_string(),
        display_name: "Staff Member".to_string(),
        role,
        program_id,
        company_id,
    };

    let err = accounts
        .create(&fixture.coordinator, request(Role::Adviser, None, None), Utc::now())
        .expect_err("adviser without program");
    assert!(matches!(err, PortalError::Validation(_)));
    let err = accounts
        .create(&fixture.coordinator, request(Role::Supervisor, None, None), Utc::now())
        .expect_err("supervisor without company");
    assert!(matches!(err, PortalError::Validation(_)));
    let err = accounts
        .create(&fixture.coordinator, request(Role::Intern, None, None), Utc::now())
        .expect_err("interns enroll instead");
    assert!(matches!(err, PortalError::Validation(_)));

    let program = fixture.program("BSCS");
    let provisioned = accounts
        .create(
            &fixture.coordinator,
            request(Role::Adviser, Some(program.id), None),
            Utc::now(),
        )
        .expect("adviser");
    assert_eq!(provisioned.account.program_id, Some(program.id));
    assert!(provisioned.initial_password.len() >= 8);

    let err = accounts
        .create(
            &fixture.coordinator,
            request(Role::Adviser, Some(program.id), None),
            Utc::now(),
        )
        .expect_err("duplicate email");
    assert!(matches!(err, PortalError::Conflict(_)));
}

#[test]
fn deactivated_accounts_cannot_log_in() {
    let fixture = Fixture::new();
    let accounts = &fixture.portal.accounts;
    let program = fixture.program("BSIT");
    let provisioned = accounts
        .create(
            &fixture.coordinator,
            NewAccount {
                email: "adviser@pup.edu.ph".to_string(),
                display_name: "Ana Reyes".to_string(),
                role: Role::Adviser,
                program_id: Some(program.id),
                company_id: None,
            },
            Utc::now(),
        )
        .expect("adviser");

    let account = accounts
        .set_active(&fixture.coordinator, provisioned.account.id, false)
        .expect("deactivated");
    assert!(!account.active);
    let err = accounts
        .login(
            login("adviser@pup.edu.ph", &provisioned.initial_password),
            Utc::now(),
        )
        .expect_err("inactive");
    assert!(matches!(err, PortalError::Unauthorized(_)));

    let err = accounts
        .set_active(&fixture.coordinator, fixture.coordinator.account_id, false)
        .expect_err("self deactivation");
    assert!(matches!(err, PortalError::Conflict(_)));
}

#[test]
fn password_change_checks_the_current_password() {
    let fixture = Fixture::new();
    let accounts = &fixture.portal.accounts;

    let err = accounts
        .change_password(
            &fixture.coordinator,
            PasswordChange {
                current_password: "guess-guess".to_string(),
                new_password: "brand-new-pass-2".to_string(),
            },
        )
        .expect_err("wrong current password");
    assert!(matches!(err, PortalError::Unauthorized(_)));

    accounts
        .change_password(
            &fixture.coordinator,
            PasswordChange {
                current_password: COORDINATOR_PASSWORD.to_string(),
                new_password: "brand-new-pass-2".to_string(),
            },
        )
        .expect("changed");
    accounts
        .login(login("ojt.office@pup.edu.ph", "brand-new-pass-2"), Utc::now())
        .expect("new password works");
    assert!(accounts
        .login(login("ojt.office@pup.edu.ph", COORDINATOR_PASSWORD), Utc::now())
        .is_err());
}

#[tokio::test]
async fn login_route_and_me_round_trip() {
    let fixture = Fixture::new();
    let router = fixture.router();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "ojt.office@pup.edu.ph", "password": COORDINATOR_PASSWORD })
                .to_string(),
        ))
        .expect("request");
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let token = body["token"].as_str().expect("token").to_string();

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["email"], "ojt.office@pup.edu.ph");
    assert_eq!(body["role"], "coordinator");

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .body(Body::empty())
        .expect("request");
    let response = router.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_listing_is_coordinator_only() {
    let fixture = Fixture::new();
    let program = fixture.program("BSIT");
    let adviser = fixture.staff(Role::Adviser, "Ana Reyes", Some(program.id), None);
    let router = fixture.router();

    let response = router
        .clone()
        .oneshot(fixture.get(&adviser, "/api/v1/accounts"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(fixture.get(&fixture.coordinator, "/api/v1/accounts?role=adviser"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let accounts = body.as_array().expect("array");
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["display_name"], "Ana Reyes");
}
