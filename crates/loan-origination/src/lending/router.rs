use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::credit::{CreditScoreView, CreditScorer};
use super::domain::{
    ApplicationReview, AuditLog, CreditScoreUpdate, Document, DocumentId, DocumentReview,
    DocumentUpload, LoanApplication, LoanApplicationId, LoanApplicationSubmission, LoginRequest,
    ProfileUpdate, PublicUser, SessionUser, SignupRequest, UserId,
};
use super::repository::{LendingRepository, RepositoryError};
use super::service::{DocumentFilter, LendingService, LendingServiceError};
use super::stats::OverviewStats;

/// Header carrying the id of the user performing a privileged request.
pub const ACTOR_HEADER: &str = "x-user-id";

type Shared<R, S> = State<Arc<LendingService<R, S>>>;
type ApiResult<T> = Result<Json<T>, LendingServiceError>;

/// Router builder exposing the lending REST API.
pub fn lending_router<R, S>(service: Arc<LendingService<R, S>>) -> Router
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Router::new()
        .route("/api/auth/login", post(login_handler::<R, S>))
        .route("/api/auth/signup", post(signup_handler::<R, S>))
        .route("/api/users", get(list_users_handler::<R, S>))
        .route(
            "/api/users/:id",
            get(get_user_handler::<R, S>).patch(update_user_handler::<R, S>),
        )
        .route(
            "/api/loan-applications",
            get(list_applications_handler::<R, S>).post(submit_application_handler::<R, S>),
        )
        .route(
            "/api/loan-applications/:id",
            get(get_application_handler::<R, S>).patch(review_application_handler::<R, S>),
        )
        .route(
            "/api/documents",
            get(list_documents_handler::<R, S>).post(upload_document_handler::<R, S>),
        )
        .route("/api/documents/:id", patch(review_document_handler::<R, S>))
        .route(
            "/api/credit-scores/:user_id",
            get(credit_score_handler::<R, S>).put(upsert_credit_score_handler::<R, S>),
        )
        .route("/api/audit-logs", get(audit_logs_handler::<R, S>))
        .route("/api/stats/overview", get(overview_handler::<R, S>))
        .with_state(service)
}

/// Acting user taken from [`ACTOR_HEADER`]; `None` when the header is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Option<UserId>);

#[async_trait]
impl<St> FromRequestParts<St> for ActingUser
where
    St: Send + Sync,
{
    type Rejection = LendingServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTOR_HEADER) else {
            return Ok(Self(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(|id| Self(Some(UserId(id))))
            .ok_or_else(|| LendingServiceError::validation("Invalid x-user-id header"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationQuery {
    borrower_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentQuery {
    user_id: Option<UserId>,
    application_id: Option<LoanApplicationId>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, LendingServiceError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        LendingServiceError::Validation(format!("Invalid request data: {}", rejection.body_text()))
    })
}

fn path_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, LendingServiceError> {
    path.map(|Path(id)| id)
        .map_err(|_| LendingServiceError::validation("Invalid id"))
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, LendingServiceError> {
    query
        .map(|Query(value)| value)
        .map_err(|_| LendingServiceError::validation("Invalid query parameters"))
}

pub(crate) async fn login_handler<R, S>(
    State(service): Shared<R, S>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<SessionUser>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let user = service.login(body(payload)?)?;
    Ok(Json(SessionUser { user }))
}

pub(crate) async fn signup_handler<R, S>(
    State(service): Shared<R, S>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<SessionUser>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let user = service.signup(body(payload)?)?;
    Ok(Json(SessionUser { user }))
}

pub(crate) async fn list_users_handler<R, S>(
    State(service): Shared<R, S>,
) -> ApiResult<Vec<PublicUser>>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.list_users()?))
}

pub(crate) async fn get_user_handler<R, S>(
    State(service): Shared<R, S>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<PublicUser>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.get_user(UserId(path_id(id)?))?))
}

pub(crate) async fn update_user_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<PublicUser>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let id = UserId(path_id(id)?);
    Ok(Json(service.update_profile(actor, id, body(payload)?)?))
}

pub(crate) async fn submit_application_handler<R, S>(
    State(service): Shared<R, S>,
    payload: Result<Json<LoanApplicationSubmission>, JsonRejection>,
) -> ApiResult<LoanApplication>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.submit_application(body(payload)?)?))
}

pub(crate) async fn list_applications_handler<R, S>(
    State(service): Shared<R, S>,
    params: Result<Query<ApplicationQuery>, QueryRejection>,
) -> ApiResult<Vec<LoanApplication>>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let ApplicationQuery { borrower_id } = query(params)?;
    Ok(Json(service.list_applications(borrower_id)?))
}

pub(crate) async fn get_application_handler<R, S>(
    State(service): Shared<R, S>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<LoanApplication>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.get_application(LoanApplicationId(path_id(id)?))?))
}

pub(crate) async fn review_application_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ApplicationReview>, JsonRejection>,
) -> ApiResult<LoanApplication>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let id = LoanApplicationId(path_id(id)?);
    Ok(Json(service.review_application(actor, id, body(payload)?)?))
}

pub(crate) async fn upload_document_handler<R, S>(
    State(service): Shared<R, S>,
    payload: Result<Json<DocumentUpload>, JsonRejection>,
) -> ApiResult<Document>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.upload_document(body(payload)?)?))
}

pub(crate) async fn list_documents_handler<R, S>(
    State(service): Shared<R, S>,
    params: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult<Vec<Document>>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let DocumentQuery {
        user_id,
        application_id,
    } = query(params)?;
    Ok(Json(service.list_documents(DocumentFilter {
        user_id,
        application_id,
    })?))
}

pub(crate) async fn review_document_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<DocumentReview>, JsonRejection>,
) -> ApiResult<Document>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let id = DocumentId(path_id(id)?);
    Ok(Json(service.review_document(actor, id, body(payload)?)?))
}

pub(crate) async fn credit_score_handler<R, S>(
    State(service): Shared<R, S>,
    user_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<CreditScoreView>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.credit_score(UserId(path_id(user_id)?))?))
}

pub(crate) async fn upsert_credit_score_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
    user_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CreditScoreUpdate>, JsonRejection>,
) -> ApiResult<CreditScoreView>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    let user_id = UserId(path_id(user_id)?);
    Ok(Json(service.upsert_credit_score(actor, user_id, body(payload)?)?))
}

pub(crate) async fn audit_logs_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Vec<AuditLog>>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.audit_logs(actor)?))
}

pub(crate) async fn overview_handler<R, S>(
    State(service): Shared<R, S>,
    ActingUser(actor): ActingUser,
) -> ApiResult<OverviewStats>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    Ok(Json(service.overview_stats(actor)?))
}

impl LendingServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict(_) | Self::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LendingServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "lending request failed");
        }
        let payload = json!({ "message": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
