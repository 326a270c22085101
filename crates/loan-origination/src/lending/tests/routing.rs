use super::common::*;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::LendingConfig;
use crate::lending::domain::{ApplicationStatus, LoanApplicationId, ProfileUpdate};
use crate::lending::repository::LendingRepository;
use crate::lending::router::{audit_logs_handler, list_users_handler, ActingUser};
use crate::lending::{FixedCreditScorer, LendingService};

#[tokio::test]
async fn login_route_returns_session_user() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@test.com", "password": "password" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["user"]["role"], "admin");
    assert_eq!(payload["user"]["profileStatus"], "approved");
    assert!(payload["user"].get("password").is_none());
}

#[tokio::test]
async fn login_route_rejects_bad_credentials() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@test.com", "password": "hunter2" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Invalid credentials");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "missing-fields@test.com" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["message"]
        .as_str()
        .expect("message string")
        .starts_with("Invalid request data"));
}

#[tokio::test]
async fn signup_route_conflicts_on_existing_email() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Another John",
                "email": "borrower@test.com",
                "phone": "+231-555-0000",
                "password": "password"
            })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "User already exists");
}

#[tokio::test]
async fn user_routes_validate_ids() {
    let (service, _) = seeded_service();
    let router = router(service);

    let response = router
        .clone()
        .oneshot(json_request(Method::GET, "/api/users/abc", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(json_request(Method::GET, "/api/users/99", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["message"], "User not found");

    let response = router
        .oneshot(json_request(Method::GET, "/api/users/5", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["name"], "Boima Kollie");
}

#[tokio::test]
async fn profile_patch_requires_actor_header() {
    let (service, _) = seeded_service();
    let router = router(service);
    let update = json!({ "address": "Sinkor, Monrovia" });

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/users/1",
            None,
            Some(update.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/users/1",
            Some(SECOND_BORROWER),
            Some(update.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(json_request(
            Method::PATCH,
            "/api/users/1",
            Some(BORROWER),
            Some(update),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["address"], "Sinkor, Monrovia");
}

#[tokio::test]
async fn malformed_actor_header_is_a_bad_request() {
    let (service, _) = seeded_service();

    let request = axum::http::Request::get("/api/audit-logs")
        .header(crate::lending::ACTOR_HEADER, "agent-smith")
        .body(axum::body::Body::empty())
        .expect("request builds");
    let response = router(service)
        .oneshot(request)
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["message"],
        "Invalid x-user-id header"
    );
}

#[tokio::test]
async fn application_routes_submit_list_and_review() {
    let (service, _) = seeded_service();
    let router = router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/loan-applications",
            None,
            Some(json!({
                "borrowerId": 5,
                "amount": "4500.00",
                "purpose": "Tailoring shop sewing machines",
                "monthlyIncome": 900,
                "employmentStatus": "self-employed",
                "guarantorName": "Comfort Doe",
                "guarantorContact": "+231-777-222-333"
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let created = read_json_body(response).await;
    assert_eq!(created["status"], "Under Review");
    assert_eq!(created["creditScore"], GENERATED_SCORE);
    assert_eq!(created["amount"], "4500.00");
    let id = created["id"].as_u64().expect("numeric id");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/loan-applications?borrowerId=5",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().expect("array").len(), 2);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/loan-applications/{id}"),
            Some(AGENT),
            Some(json!({ "status": "Rejected", "comments": "Insufficient income" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let reviewed = read_json_body(response).await;
    assert_eq!(reviewed["status"], "Rejected");
    assert_eq!(reviewed["reviewedBy"], AGENT.0);

    let response = router
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/loan-applications/{id}"),
            Some(ADMIN),
            Some(json!({ "status": "Approved" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn application_listing_rejects_bad_query() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::GET,
            "/api/loan-applications?borrowerId=first",
            None,
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn borrowers_cannot_review_applications() {
    let (service, _) = seeded_service();

    let response = router(service)
        .oneshot(json_request(
            Method::PATCH,
            "/api/loan-applications/1",
            Some(BORROWER),
            Some(json!({ "status": "Approved" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        read_json_body(response).await["message"],
        "Insufficient permissions"
    );
}

#[tokio::test]
async fn deactivated_agents_are_refused_on_review_routes() {
    let (service, store) = seeded_service();
    service
        .update_profile(
            Some(ADMIN),
            AGENT,
            ProfileUpdate {
                is_active: Some(false),
                ..ProfileUpdate::default()
            },
        )
        .expect("admin deactivates agent");

    let response = router(service)
        .oneshot(json_request(
            Method::PATCH,
            "/api/loan-applications/1",
            Some(AGENT),
            Some(json!({ "status": "Approved", "comments": "Looks fine" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        read_json_body(response).await["message"],
        "Account is deactivated"
    );
    let application = store
        .application(LoanApplicationId(1))
        .expect("query")
        .expect("present");
    assert_eq!(application.status, ApplicationStatus::UnderReview);
}

#[tokio::test]
async fn document_routes_upload_list_and_verify() {
    let (service, _) = seeded_service();
    let router = router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/documents",
            None,
            Some(json!({
                "userId": 1,
                "applicationId": 3,
                "type": "mobile_money_statement",
                "filename": "orange-money.pdf"
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = read_json_body(response).await;
    assert_eq!(uploaded["type"], "mobile_money_statement");
    assert_eq!(uploaded["status"], "pending");

    let response = router
        .clone()
        .oneshot(json_request(Method::GET, "/api/documents", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["message"],
        "userId or applicationId required"
    );

    let response = router
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/documents?applicationId=3",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(
        read_json_body(response).await.as_array().map(Vec::len),
        Some(1)
    );

    let id = uploaded["id"].as_u64().expect("numeric id");
    let response = router
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/documents/{id}"),
            Some(COMPLIANCE),
            Some(json!({ "status": "verified" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], "verified");
}

#[tokio::test]
async fn credit_score_route_includes_rating_and_risk() {
    let (service, _) = seeded_service();
    let router = router(service);

    let response = router
        .clone()
        .oneshot(json_request(Method::GET, "/api/credit-scores/1", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["score"], 750);
    assert_eq!(payload["userId"], 1);
    assert_eq!(payload["rating"], "Excellent");
    assert_eq!(payload["risk"], "Low Risk");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/credit-scores/5",
            Some(AGENT),
            Some(json!({ "score": 655, "creditUtilization": 41.5 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["rating"], "Fair");
    assert_eq!(payload["risk"], "Medium Risk");

    let response = router
        .oneshot(json_request(Method::GET, "/api/credit-scores/2", None, None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json_body(response).await["message"],
        "Credit score not found"
    );
}

#[tokio::test]
async fn stats_route_is_limited_to_monitors() {
    let (service, _) = seeded_service();
    let router = router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/stats/overview",
            Some(AGENT),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(json_request(
            Method::GET,
            "/api/stats/overview",
            Some(COMPLIANCE),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["totalUsers"], 5);
    assert_eq!(payload["pendingApplications"], 3);
    assert_eq!(payload["defaultRate"], "0.0");
    assert_eq!(payload["registeredAgencies"], 47);
}

#[tokio::test]
async fn audit_logs_handler_requires_actor() {
    let (service, _) = seeded_service();

    let response = audit_logs_handler::<_, FixedCreditScorer>(State(service), ActingUser(None))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        read_json_body(response).await["message"],
        "Authentication required"
    );
}

#[tokio::test]
async fn list_users_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(LendingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(FixedCreditScorer(GENERATED_SCORE)),
        LendingConfig::default(),
    ));

    let response = list_users_handler::<UnavailableRepository, FixedCreditScorer>(State(service))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json_body(response).await["message"],
        "repository unavailable: maintenance window"
    );
}
