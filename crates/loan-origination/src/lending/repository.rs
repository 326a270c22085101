use super::domain::{
    ApplicationDecision, AuditLog, CreditScore, CreditScoreUpdate, Document, DocumentId,
    DocumentStatus, DocumentUpload, LoanApplication, LoanApplicationId, NewAuditLog,
    NewLoanApplication, NewUser, ProfileUpdate, User, UserId,
};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations assign ids, timestamps and default statuses; callers never do.
pub trait LendingRepository: Send + Sync {
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// Lookup by normalized (lower-cased) email.
    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    /// Applies the update to the stored user in one step.
    fn update_user(&self, id: UserId, update: ProfileUpdate) -> Result<User, RepositoryError>;
    fn users(&self) -> Result<Vec<User>, RepositoryError>;

    fn insert_application(
        &self,
        application: NewLoanApplication,
    ) -> Result<LoanApplication, RepositoryError>;
    fn application(&self, id: LoanApplicationId)
        -> Result<Option<LoanApplication>, RepositoryError>;
    fn applications(&self) -> Result<Vec<LoanApplication>, RepositoryError>;
    fn applications_by_borrower(
        &self,
        borrower_id: UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError>;
    /// Records the decision only while the application is still under review; a decided
    /// application yields [`RepositoryError::Conflict`].
    fn decide_application(
        &self,
        id: LoanApplicationId,
        decision: ApplicationDecision,
    ) -> Result<LoanApplication, RepositoryError>;

    fn insert_document(&self, upload: DocumentUpload) -> Result<Document, RepositoryError>;
    fn set_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
    ) -> Result<Document, RepositoryError>;
    fn documents_by_user(&self, user_id: UserId) -> Result<Vec<Document>, RepositoryError>;
    fn documents_by_application(
        &self,
        application_id: LoanApplicationId,
    ) -> Result<Vec<Document>, RepositoryError>;

    fn credit_score(&self, user_id: UserId) -> Result<Option<CreditScore>, RepositoryError>;
    fn upsert_credit_score(
        &self,
        user_id: UserId,
        update: CreditScoreUpdate,
    ) -> Result<CreditScore, RepositoryError>;

    fn append_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog, RepositoryError>;
    /// Newest first.
    fn audit_logs(&self) -> Result<Vec<AuditLog>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
