use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::LendingConfig;
use crate::lending::credit::FixedCreditScorer;
use crate::lending::domain::{
    ApplicationDecision, AuditLog, CreditScore, CreditScoreUpdate, Document, DocumentId,
    DocumentStatus, DocumentUpload, LoanApplication, LoanApplicationId, LoanApplicationSubmission,
    NewAuditLog, NewLoanApplication, NewUser, ProfileUpdate, User, UserId,
};
use crate::lending::repository::{LendingRepository, RepositoryError};
use crate::lending::router::ACTOR_HEADER;
use crate::lending::{lending_router, seed_demo_data, InMemoryLendingStore, LendingService};

pub(super) const BORROWER: UserId = UserId(1);
pub(super) const AGENT: UserId = UserId(2);
pub(super) const COMPLIANCE: UserId = UserId(3);
pub(super) const ADMIN: UserId = UserId(4);
pub(super) const SECOND_BORROWER: UserId = UserId(5);

pub(super) const GENERATED_SCORE: u16 = 640;

pub(super) type TestService = LendingService<InMemoryLendingStore, FixedCreditScorer>;

pub(super) fn empty_service() -> (Arc<TestService>, Arc<InMemoryLendingStore>) {
    let store = Arc::new(InMemoryLendingStore::default());
    let service = Arc::new(LendingService::new(
        store.clone(),
        Arc::new(FixedCreditScorer(GENERATED_SCORE)),
        LendingConfig::default(),
    ));
    (service, store)
}

/// Service over a store holding the demo accounts and three pending applications.
pub(super) fn seeded_service() -> (Arc<TestService>, Arc<InMemoryLendingStore>) {
    let (service, store) = empty_service();
    seed_demo_data(store.as_ref()).expect("seed succeeds");
    (service, store)
}

pub(super) fn submission(borrower_id: UserId) -> LoanApplicationSubmission {
    LoanApplicationSubmission {
        borrower_id,
        amount: Decimal::from(12_000),
        purpose: "Cold storage for fish market stall".to_string(),
        monthly_income: Decimal::from(1_900),
        employment_status: "self-employed".to_string(),
        guarantor_name: "Musu Kamara".to_string(),
        guarantor_contact: "+231-777-555-010".to_string(),
    }
}

pub(super) fn router(service: Arc<TestService>) -> Router {
    lending_router(service)
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    actor: Option<UserId>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor.0.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository whose backing store is down.
pub(super) struct UnavailableRepository;

fn down<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("maintenance window".to_string()))
}

impl LendingRepository for UnavailableRepository {
    fn user(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        down()
    }

    fn user_by_email(&self, _email: &str) -> Result<Option<User>, RepositoryError> {
        down()
    }

    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        down()
    }

    fn update_user(&self, _id: UserId, _update: ProfileUpdate) -> Result<User, RepositoryError> {
        down()
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        down()
    }

    fn insert_application(
        &self,
        _application: NewLoanApplication,
    ) -> Result<LoanApplication, RepositoryError> {
        down()
    }

    fn application(
        &self,
        _id: LoanApplicationId,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        down()
    }

    fn applications(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        down()
    }

    fn applications_by_borrower(
        &self,
        _borrower_id: UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        down()
    }

    fn decide_application(
        &self,
        _id: LoanApplicationId,
        _decision: ApplicationDecision,
    ) -> Result<LoanApplication, RepositoryError> {
        down()
    }

    fn insert_document(&self, _upload: DocumentUpload) -> Result<Document, RepositoryError> {
        down()
    }

    fn set_document_status(
        &self,
        _id: DocumentId,
        _status: DocumentStatus,
    ) -> Result<Document, RepositoryError> {
        down()
    }

    fn documents_by_user(&self, _user_id: UserId) -> Result<Vec<Document>, RepositoryError> {
        down()
    }

    fn documents_by_application(
        &self,
        _application_id: LoanApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        down()
    }

    fn credit_score(&self, _user_id: UserId) -> Result<Option<CreditScore>, RepositoryError> {
        down()
    }

    fn upsert_credit_score(
        &self,
        _user_id: UserId,
        _update: CreditScoreUpdate,
    ) -> Result<CreditScore, RepositoryError> {
        down()
    }

    fn append_audit_log(&self, _entry: NewAuditLog) -> Result<AuditLog, RepositoryError> {
        down()
    }

    fn audit_logs(&self) -> Result<Vec<AuditLog>, RepositoryError> {
        down()
    }
}
