use axum::http::StatusCode;
use serde_json::json;

use lab_appointment::modules::auth::model::{UserStatus, VerificationStatus};

use crate::common::{register_body, test_email, test_password, TestContext};

/// Registers a fresh user and returns (user id, email, issued code).
async fn register(ctx: &TestContext) -> (String, String, String) {
    let email = test_email();
    let response = ctx
        .server
        .post("/auth/register")
        .json(&register_body(&email, test_password()))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    let id = body["user"]["id"].as_str().unwrap().to_string();
    (id, email, ctx.mailer.last_otp())
}

fn wrong_code(code: &str) -> String {
    if code == "1000" { "1001".to_string() } else { "1000".to_string() }
}

#[tokio::test]
async fn verify_with_correct_code_activates_user() {
    let ctx = TestContext::new().await;
    let (id, email, otp) = register(&ctx).await;

    let response = ctx
        .server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": &otp }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Email verified");
    assert_eq!(body["user"]["status"], "ACTIVE");
    assert_eq!(body["user"]["email"], email.as_str());

    let stored = ctx.users.get(&id).unwrap();
    assert_eq!(stored.status, UserStatus::Active);
    assert_eq!(stored.email_verification.status, VerificationStatus::VerificationSuccess);
    assert!(stored.email_verification.verified_on.is_some());
    assert!(stored.email_verification.tried_on.is_some());
    assert_eq!(stored.email_verification.verification_code, otp);
}

#[tokio::test]
async fn verify_with_wrong_code_fails_and_stamps_attempt() {
    let ctx = TestContext::new().await;
    let (id, email, otp) = register(&ctx).await;

    let response = ctx
        .server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": wrong_code(&otp) }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert_eq!(
        body["message"].as_str().unwrap(),
        format!("Email Verification Failed.. {email}")
    );

    let stored = ctx.users.get(&id).unwrap();
    assert_eq!(stored.status, UserStatus::VerificationPending);
    assert_eq!(stored.email_verification.status, VerificationStatus::VerificationPending);
    assert!(stored.email_verification.tried_on.is_some());
    assert!(stored.email_verification.verified_on.is_none());
    assert_eq!(stored.email_verification.verification_code, otp);
}

#[tokio::test]
async fn verify_does_not_count_or_lock_out_attempts() {
    let ctx = TestContext::new().await;
    let (id, _, otp) = register(&ctx).await;

    for _ in 0..5 {
        ctx.server
            .post("/auth/register/verify")
            .json(&json!({ "userId": &id, "otp": wrong_code(&otp) }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(ctx.users.get(&id).unwrap().email_verification.tries, 0);

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": &otp }))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn verify_unknown_user_fails_without_mutation() {
    let ctx = TestContext::new().await;
    let (id, _, _) = register(&ctx).await;
    let before = ctx.users.get(&id).unwrap();

    let response = ctx
        .server
        .post("/auth/register/verify")
        .json(&json!({ "userId": uuid::Uuid::new_v4().to_string(), "otp": "1234" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "Invalid User");

    assert_eq!(ctx.users.count(), 1);
    assert_eq!(ctx.users.get(&id).unwrap(), before);
}

#[tokio::test]
async fn verify_requires_exact_match() {
    let ctx = TestContext::new().await;
    let (id, _, otp) = register(&ctx).await;

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": format!(" {otp}") }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.users.get(&id).unwrap().status, UserStatus::VerificationPending);
}

#[tokio::test]
async fn verify_again_after_activation_succeeds() {
    let ctx = TestContext::new().await;
    let (id, _, otp) = register(&ctx).await;

    for _ in 0..2 {
        ctx.server
            .post("/auth/register/verify")
            .json(&json!({ "userId": &id, "otp": &otp }))
            .await
            .assert_status(StatusCode::OK);
    }

    let stored = ctx.users.get(&id).unwrap();
    assert_eq!(stored.status, UserStatus::Active);
    assert_eq!(stored.email_verification.status, VerificationStatus::VerificationSuccess);
}

#[tokio::test]
async fn wrong_code_after_activation_keeps_user_active() {
    let ctx = TestContext::new().await;
    let (id, _, otp) = register(&ctx).await;

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": &otp }))
        .await
        .assert_status(StatusCode::OK);

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": wrong_code(&otp) }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let stored = ctx.users.get(&id).unwrap();
    assert_eq!(stored.status, UserStatus::Active);
    assert_eq!(stored.email_verification.status, VerificationStatus::VerificationSuccess);
}

#[tokio::test]
async fn verify_with_missing_otp_returns_unprocessable() {
    let ctx = TestContext::new().await;
    let (id, _, _) = register(&ctx).await;

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn registration_scenario_wrong_then_right_code() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&register_body("a@x.com", "pw1"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["status"], "VERIFICATION_PENDING");
    assert_eq!(body["user"]["username"], "a@x.com");
    let id = body["user"]["id"].as_str().unwrap().to_string();
    let otp = ctx.mailer.last_otp();

    // codes are always >= 1000
    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": "0000" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.server
        .post("/auth/register/verify")
        .json(&json!({ "userId": &id, "otp": &otp }))
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(ctx.users.get(&id).unwrap().status, UserStatus::Active);
}
