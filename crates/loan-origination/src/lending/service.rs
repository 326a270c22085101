use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::credentials::{normalize_email, PasswordHash};
use super::credit::{CreditScoreView, CreditScorer, SCORE_RANGE};
use super::domain::{
    ApplicationDecision, ApplicationReview, ApplicationStatus, AuditAction, AuditLog, CreditScoreUpdate, Document,
    DocumentId, DocumentReview, DocumentStatus, DocumentUpload, LoanApplication,
    LoanApplicationId, LoanApplicationSubmission, LoginRequest, NewAuditLog, NewLoanApplication,
    NewUser, ProfileStatus, ProfileUpdate, PublicUser, Role, SignupRequest, User, UserId,
};
use super::repository::{LendingRepository, RepositoryError};
use super::stats::OverviewStats;
use crate::config::LendingConfig;

const REVIEWERS: &[Role] = &[Role::Agent, Role::Admin];
const DOCUMENT_REVIEWERS: &[Role] = &[Role::Agent, Role::Compliance, Role::Admin];
const MONITORS: &[Role] = &[Role::Compliance, Role::Admin];

/// Which documents to list; `user_id` wins when both are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentFilter {
    pub user_id: Option<UserId>,
    pub application_id: Option<LoanApplicationId>,
}

/// Service composing the repository, credit scorer and role checks behind every API operation.
pub struct LendingService<R, S> {
    repository: Arc<R>,
    scorer: Arc<S>,
    config: LendingConfig,
}

impl<R, S> LendingService<R, S>
where
    R: LendingRepository + 'static,
    S: CreditScorer + 'static,
{
    pub fn new(repository: Arc<R>, scorer: Arc<S>, config: LendingConfig) -> Self {
        Self {
            repository,
            scorer,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Verify credentials and record the attempt in the audit trail.
    pub fn login(&self, request: LoginRequest) -> Result<PublicUser, LendingServiceError> {
        let email = normalize_email(&request.email)
            .ok_or_else(|| LendingServiceError::validation("Invalid request data"))?;
        if request.password.is_empty() {
            return Err(LendingServiceError::validation("Invalid request data"));
        }

        let user = match self.repository.user_by_email(&email)? {
            Some(user) if user.password.verify(&request.password) => user,
            existing => {
                let user_id = existing.map(|user| user.id);
                warn!(?user_id, "login rejected: invalid credentials");
                self.audit(NewAuditLog::failed(user_id, AuditAction::UserLogin, email))?;
                return Err(LendingServiceError::InvalidCredentials);
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "login rejected: account deactivated");
            self.audit(NewAuditLog::failed(
                Some(user.id),
                AuditAction::UserLogin,
                user.email.clone(),
            ))?;
            return Err(LendingServiceError::Forbidden("Account is deactivated"));
        }

        self.audit(NewAuditLog::success(
            Some(user.id),
            AuditAction::UserLogin,
            user.email.clone(),
        ))?;
        info!(user_id = %user.id, role = user.role.label(), "user logged in");
        Ok(user.public_view())
    }

    /// Register a borrower account. The role is always `borrower` regardless of input.
    pub fn signup(&self, request: SignupRequest) -> Result<PublicUser, LendingServiceError> {
        let email = normalize_email(&request.email)
            .ok_or_else(|| LendingServiceError::validation("Invalid request data"))?;
        let name = required("name", &request.name)?;
        let phone = required("phone", &request.phone)?;
        if request.password.is_empty() {
            return Err(LendingServiceError::validation("password is required"));
        }
        let national_id = request
            .national_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if self.repository.user_by_email(&email)?.is_some() {
            return Err(LendingServiceError::Conflict("User already exists"));
        }

        let user = self
            .repository
            .insert_user(NewUser {
                name,
                email,
                phone,
                national_id,
                password: PasswordHash::new(&request.password),
                role: Role::Borrower,
                profile_status: ProfileStatus::Incomplete,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => LendingServiceError::Conflict("User already exists"),
                other => other.into(),
            })?;

        self.audit(NewAuditLog::success(
            Some(user.id),
            AuditAction::UserRegistration,
            user.email.clone(),
        ))?;
        info!(user_id = %user.id, "borrower registered");
        Ok(user.public_view())
    }

    pub fn list_users(&self) -> Result<Vec<PublicUser>, LendingServiceError> {
        Ok(self
            .repository
            .users()?
            .iter()
            .map(User::public_view)
            .collect())
    }

    pub fn get_user(&self, id: UserId) -> Result<PublicUser, LendingServiceError> {
        self.repository
            .user(id)?
            .map(|user| user.public_view())
            .ok_or(LendingServiceError::NotFound("User"))
    }

    /// Resolve the acting user and check their role.
    pub fn authorize(
        &self,
        actor: Option<UserId>,
        allowed: &[Role],
    ) -> Result<User, LendingServiceError> {
        let actor_id = actor.ok_or(LendingServiceError::Unauthenticated)?;
        let user = self
            .repository
            .user(actor_id)?
            .ok_or(LendingServiceError::Unauthenticated)?;

        if !user.is_active {
            return Err(LendingServiceError::Forbidden("Account is deactivated"));
        }
        if !allowed.contains(&user.role) {
            warn!(user_id = %user.id, role = user.role.label(), "role not permitted");
            return Err(LendingServiceError::Forbidden("Insufficient permissions"));
        }
        Ok(user)
    }

    /// Users edit their own profile; admins edit anyone's and alone may change role or status.
    pub fn update_profile(
        &self,
        actor: Option<UserId>,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<PublicUser, LendingServiceError> {
        let actor = self.authorize(
            actor,
            &[Role::Borrower, Role::Agent, Role::Compliance, Role::Admin],
        )?;
        let is_admin = actor.role == Role::Admin;
        if actor.id != id && !is_admin {
            return Err(LendingServiceError::Forbidden("Unauthorized"));
        }
        if update.touches_privileged_fields() && !is_admin {
            return Err(LendingServiceError::Forbidden(
                "Only administrators may change role, activation or approval state",
            ));
        }

        let update = ProfileUpdate {
            name: update.name.as_deref().map(|v| required("name", v)).transpose()?,
            phone: update.phone.as_deref().map(|v| required("phone", v)).transpose()?,
            ..update
        };
        if update
            .monthly_income
            .is_some_and(|income| income.is_sign_negative())
        {
            return Err(LendingServiceError::validation(
                "monthlyIncome must not be negative",
            ));
        }

        let user = self
            .repository
            .update_user(id, update)
            .map_err(|err| match err {
                RepositoryError::NotFound => LendingServiceError::NotFound("User"),
                other => other.into(),
            })?;

        self.audit(NewAuditLog::success(
            Some(actor.id),
            AuditAction::ProfileUpdate,
            user.email.clone(),
        ))?;
        info!(user_id = %user.id, actor_id = %actor.id, "profile updated");
        Ok(user.public_view())
    }

    pub fn submit_application(
        &self,
        submission: LoanApplicationSubmission,
    ) -> Result<LoanApplication, LendingServiceError> {
        let borrower = self
            .repository
            .user(submission.borrower_id)?
            .filter(|user| user.is_active)
            .ok_or_else(|| LendingServiceError::validation("Unknown borrower"))?;

        positive("amount", submission.amount)?;
        positive("monthlyIncome", submission.monthly_income)?;
        let submission = LoanApplicationSubmission {
            purpose: required("purpose", &submission.purpose)?,
            employment_status: required("employmentStatus", &submission.employment_status)?,
            guarantor_name: required("guarantorName", &submission.guarantor_name)?,
            guarantor_contact: required("guarantorContact", &submission.guarantor_contact)?,
            ..submission
        };

        let credit_score = match self.repository.credit_score(borrower.id)? {
            Some(record) => record.score,
            None => self.scorer.generate(),
        };

        let application = self.repository.insert_application(NewLoanApplication {
            submission,
            credit_score: Some(credit_score),
            submitted_at: Utc::now(),
        })?;

        self.audit(NewAuditLog::success(
            Some(borrower.id),
            AuditAction::LoanApplicationSubmitted,
            application.reference.clone(),
        ))?;
        info!(
            application = %application.reference,
            borrower_id = %borrower.id,
            credit_score,
            "loan application submitted"
        );
        Ok(application)
    }

    pub fn list_applications(
        &self,
        borrower_id: Option<UserId>,
    ) -> Result<Vec<LoanApplication>, LendingServiceError> {
        let applications = match borrower_id {
            Some(borrower_id) => self.repository.applications_by_borrower(borrower_id)?,
            None => self.repository.applications()?,
        };
        Ok(applications)
    }

    pub fn get_application(
        &self,
        id: LoanApplicationId,
    ) -> Result<LoanApplication, LendingServiceError> {
        self.repository
            .application(id)?
            .ok_or(LendingServiceError::NotFound("Application"))
    }

    /// Approve or reject an application that is still under review.
    pub fn review_application(
        &self,
        actor: Option<UserId>,
        id: LoanApplicationId,
        review: ApplicationReview,
    ) -> Result<LoanApplication, LendingServiceError> {
        let reviewer = self.authorize(actor, REVIEWERS)?;

        let action = match review.status {
            ApplicationStatus::Approved => AuditAction::ApplicationApproved,
            ApplicationStatus::Rejected => AuditAction::ApplicationRejected,
            ApplicationStatus::UnderReview => {
                return Err(LendingServiceError::validation(
                    "status must be Approved or Rejected",
                ))
            }
        };
        let comments = review
            .comments
            .map(|comments| comments.trim().to_string())
            .filter(|comments| !comments.is_empty());
        if review.status == ApplicationStatus::Rejected && comments.is_none() {
            return Err(LendingServiceError::validation(
                "comments are required when rejecting an application",
            ));
        }

        let decision = ApplicationDecision {
            status: review.status,
            comments,
            reviewed_by: reviewer.id,
            reviewed_at: Utc::now(),
        };
        let application = self
            .repository
            .decide_application(id, decision)
            .map_err(|err| match err {
                RepositoryError::NotFound => LendingServiceError::NotFound("Application"),
                RepositoryError::Conflict => {
                    LendingServiceError::Conflict("Application has already been reviewed")
                }
                other => other.into(),
            })?;

        self.audit(NewAuditLog::success(
            Some(reviewer.id),
            action,
            application.reference.clone(),
        ))?;
        info!(
            application = %application.reference,
            reviewer_id = %reviewer.id,
            status = application.status.label(),
            "loan application reviewed"
        );
        Ok(application)
    }

    pub fn upload_document(&self, upload: DocumentUpload) -> Result<Document, LendingServiceError> {
        let owner = self
            .repository
            .user(upload.user_id)?
            .ok_or_else(|| LendingServiceError::validation("Unknown user"))?;
        let filename = required("filename", &upload.filename)?;

        if let Some(application_id) = upload.application_id {
            let application = self
                .repository
                .application(application_id)?
                .ok_or_else(|| LendingServiceError::validation("Unknown application"))?;
            if application.borrower_id != owner.id {
                return Err(LendingServiceError::validation(
                    "application belongs to another borrower",
                ));
            }
        }

        let document = self
            .repository
            .insert_document(DocumentUpload { filename, ..upload })?;

        self.audit(NewAuditLog::success(
            Some(owner.id),
            AuditAction::DocumentUpload,
            document.kind.label(),
        ))?;
        info!(document_id = %document.id, user_id = %owner.id, kind = document.kind.label(), "document uploaded");
        Ok(document)
    }

    pub fn list_documents(
        &self,
        filter: DocumentFilter,
    ) -> Result<Vec<Document>, LendingServiceError> {
        match filter {
            DocumentFilter {
                user_id: Some(user_id),
                ..
            } => Ok(self.repository.documents_by_user(user_id)?),
            DocumentFilter {
                application_id: Some(application_id),
                ..
            } => Ok(self.repository.documents_by_application(application_id)?),
            _ => Err(LendingServiceError::validation(
                "userId or applicationId required",
            )),
        }
    }

    pub fn review_document(
        &self,
        actor: Option<UserId>,
        id: DocumentId,
        review: DocumentReview,
    ) -> Result<Document, LendingServiceError> {
        let reviewer = self.authorize(actor, DOCUMENT_REVIEWERS)?;
        let action = match review.status {
            DocumentStatus::Verified => AuditAction::DocumentVerified,
            DocumentStatus::Rejected => AuditAction::DocumentRejected,
            DocumentStatus::Pending => {
                return Err(LendingServiceError::validation(
                    "status must be verified or rejected",
                ))
            }
        };

        let document = self
            .repository
            .set_document_status(id, review.status)
            .map_err(|err| match err {
                RepositoryError::NotFound => LendingServiceError::NotFound("Document"),
                other => other.into(),
            })?;

        self.audit(NewAuditLog::success(
            Some(reviewer.id),
            action,
            document.kind.label(),
        ))?;
        info!(document_id = %document.id, reviewer_id = %reviewer.id, "document reviewed");
        Ok(document)
    }

    pub fn credit_score(&self, user_id: UserId) -> Result<CreditScoreView, LendingServiceError> {
        self.repository
            .credit_score(user_id)?
            .map(CreditScoreView::from)
            .ok_or(LendingServiceError::NotFound("Credit score"))
    }

    pub fn upsert_credit_score(
        &self,
        actor: Option<UserId>,
        user_id: UserId,
        update: CreditScoreUpdate,
    ) -> Result<CreditScoreView, LendingServiceError> {
        let reviewer = self.authorize(actor, REVIEWERS)?;

        if !SCORE_RANGE.contains(&update.score) {
            return Err(LendingServiceError::Validation(format!(
                "score must be between {} and {}",
                SCORE_RANGE.start(),
                SCORE_RANGE.end()
            )));
        }
        percentage("paymentHistory", update.payment_history)?;
        percentage("debtToIncomeRatio", update.debt_to_income_ratio)?;
        percentage("creditUtilization", update.credit_utilization)?;

        let owner = self
            .repository
            .user(user_id)?
            .ok_or(LendingServiceError::NotFound("User"))?;
        let record = self.repository.upsert_credit_score(owner.id, update)?;

        self.audit(NewAuditLog::success(
            Some(reviewer.id),
            AuditAction::CreditScoreUpdate,
            owner.email,
        ))?;
        info!(user_id = %owner.id, score = record.score, "credit score updated");
        Ok(record.into())
    }

    pub fn audit_logs(&self, actor: Option<UserId>) -> Result<Vec<AuditLog>, LendingServiceError> {
        self.authorize(actor, MONITORS)?;
        Ok(self.repository.audit_logs()?)
    }

    pub fn overview_stats(
        &self,
        actor: Option<UserId>,
    ) -> Result<OverviewStats, LendingServiceError> {
        self.authorize(actor, MONITORS)?;
        self.overview()
    }

    /// Statistics without an actor check, for operator tooling.
    pub fn overview(&self) -> Result<OverviewStats, LendingServiceError> {
        let users = self.repository.users()?;
        let applications = self.repository.applications()?;
        let audit_logs = self.repository.audit_logs()?;
        Ok(OverviewStats::compute(
            &users,
            &applications,
            &audit_logs,
            &self.config,
        ))
    }

    fn audit(&self, entry: NewAuditLog) -> Result<AuditLog, LendingServiceError> {
        Ok(self.repository.append_audit_log(entry)?)
    }
}

fn required(field: &str, value: &str) -> Result<String, LendingServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LendingServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn positive(field: &str, value: Decimal) -> Result<(), LendingServiceError> {
    if value <= Decimal::ZERO {
        return Err(LendingServiceError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}

fn percentage(field: &str, value: Option<Decimal>) -> Result<(), LendingServiceError> {
    match value {
        Some(value) if value.is_sign_negative() || value > Decimal::ONE_HUNDRED => Err(
            LendingServiceError::Validation(format!("{field} must be between 0 and 100")),
        ),
        _ => Ok(()),
    }
}

/// Error raised by the lending service.
#[derive(Debug, thiserror::Error)]
pub enum LendingServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LendingServiceError {
    pub(crate) fn validation(message: &str) -> Self {
        Self::Validation(message.to_string())
    }
}
