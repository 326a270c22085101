use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Datelike, Utc};

use super::domain::{
    ApplicationDecision, ApplicationStatus, AuditLog, AuditLogId, CreditScore, CreditScoreId,
    CreditScoreUpdate, Document, DocumentId, DocumentStatus, DocumentUpload, LoanApplication,
    LoanApplicationId, NewAuditLog, NewLoanApplication, NewUser, ProfileUpdate, User, UserId,
};
use super::repository::{LendingRepository, RepositoryError};

#[derive(Debug)]
struct Tables {
    users: BTreeMap<UserId, User>,
    applications: BTreeMap<LoanApplicationId, LoanApplication>,
    documents: BTreeMap<DocumentId, Document>,
    /// Keyed by owning user; at most one score per user.
    credit_scores: BTreeMap<UserId, CreditScore>,
    audit_logs: BTreeMap<AuditLogId, AuditLog>,
    next_user: u64,
    next_application: u64,
    next_document: u64,
    next_credit_score: u64,
    next_audit_log: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            applications: BTreeMap::new(),
            documents: BTreeMap::new(),
            credit_scores: BTreeMap::new(),
            audit_logs: BTreeMap::new(),
            next_user: 1,
            next_application: 1,
            next_document: 1,
            next_credit_score: 1,
            next_audit_log: 1,
        }
    }
}

fn take_id(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

/// Process-local store backing every record type with auto-incrementing ids.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLendingStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryLendingStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("lending store mutex poisoned")
    }
}

impl LendingRepository for InMemoryLendingStore {
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        if tables
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict);
        }

        let id = UserId(take_id(&mut tables.next_user));
        let record = User {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            national_id: user.national_id,
            password: user.password,
            role: user.role,
            is_active: true,
            profile_status: user.profile_status,
            employment_status: None,
            monthly_income: None,
            address: None,
            created_at: Utc::now(),
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    fn update_user(&self, id: UserId, update: ProfileUpdate) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        let user = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        update.apply(user);
        Ok(user.clone())
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.tables().users.values().cloned().collect())
    }

    fn insert_application(
        &self,
        application: NewLoanApplication,
    ) -> Result<LoanApplication, RepositoryError> {
        let mut tables = self.tables();
        let sequence = take_id(&mut tables.next_application);
        let id = LoanApplicationId(sequence);
        let NewLoanApplication {
            submission,
            credit_score,
            submitted_at,
        } = application;

        let record = LoanApplication {
            id,
            reference: format!("#LA{}{:03}", submitted_at.year(), sequence),
            borrower_id: submission.borrower_id,
            amount: submission.amount,
            purpose: submission.purpose,
            monthly_income: submission.monthly_income,
            employment_status: submission.employment_status,
            guarantor_name: submission.guarantor_name,
            guarantor_contact: submission.guarantor_contact,
            status: ApplicationStatus::UnderReview,
            credit_score,
            submitted_at,
            reviewed_at: None,
            reviewed_by: None,
            comments: None,
        };
        tables.applications.insert(id, record.clone());
        Ok(record)
    }

    fn application(
        &self,
        id: LoanApplicationId,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        Ok(self.tables().applications.get(&id).cloned())
    }

    fn applications(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(self.tables().applications.values().cloned().collect())
    }

    fn applications_by_borrower(
        &self,
        borrower_id: UserId,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        Ok(self
            .tables()
            .applications
            .values()
            .filter(|application| application.borrower_id == borrower_id)
            .cloned()
            .collect())
    }

    fn decide_application(
        &self,
        id: LoanApplicationId,
        decision: ApplicationDecision,
    ) -> Result<LoanApplication, RepositoryError> {
        let mut tables = self.tables();
        let application = tables
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if application.status.is_decided() {
            return Err(RepositoryError::Conflict);
        }

        application.status = decision.status;
        application.comments = decision.comments;
        application.reviewed_by = Some(decision.reviewed_by);
        application.reviewed_at = Some(decision.reviewed_at);
        Ok(application.clone())
    }

    fn insert_document(&self, upload: DocumentUpload) -> Result<Document, RepositoryError> {
        let mut tables = self.tables();
        let id = DocumentId(take_id(&mut tables.next_document));
        let record = Document {
            id,
            user_id: upload.user_id,
            application_id: upload.application_id,
            kind: upload.kind,
            filename: upload.filename,
            status: DocumentStatus::Pending,
            uploaded_at: Utc::now(),
        };
        tables.documents.insert(id, record.clone());
        Ok(record)
    }

    fn set_document_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
    ) -> Result<Document, RepositoryError> {
        let mut tables = self.tables();
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        document.status = status;
        Ok(document.clone())
    }

    fn documents_by_user(&self, user_id: UserId) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .tables()
            .documents
            .values()
            .filter(|document| document.user_id == user_id)
            .cloned()
            .collect())
    }

    fn documents_by_application(
        &self,
        application_id: LoanApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        Ok(self
            .tables()
            .documents
            .values()
            .filter(|document| document.application_id == Some(application_id))
            .cloned()
            .collect())
    }

    fn credit_score(&self, user_id: UserId) -> Result<Option<CreditScore>, RepositoryError> {
        Ok(self.tables().credit_scores.get(&user_id).cloned())
    }

    fn upsert_credit_score(
        &self,
        user_id: UserId,
        update: CreditScoreUpdate,
    ) -> Result<CreditScore, RepositoryError> {
        let mut tables = self.tables();
        let now = Utc::now();

        if let Some(existing) = tables.credit_scores.get_mut(&user_id) {
            existing.score = update.score;
            existing.payment_history = update.payment_history;
            existing.debt_to_income_ratio = update.debt_to_income_ratio;
            existing.credit_utilization = update.credit_utilization;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = CreditScore {
            id: CreditScoreId(take_id(&mut tables.next_credit_score)),
            user_id,
            score: update.score,
            payment_history: update.payment_history,
            debt_to_income_ratio: update.debt_to_income_ratio,
            credit_utilization: update.credit_utilization,
            updated_at: now,
        };
        tables.credit_scores.insert(user_id, record.clone());
        Ok(record)
    }

    fn append_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog, RepositoryError> {
        let mut tables = self.tables();
        let id = AuditLogId(take_id(&mut tables.next_audit_log));
        let record = AuditLog {
            id,
            user_id: entry.user_id,
            action: entry.action,
            target: entry.target,
            status: entry.status,
            timestamp: Utc::now(),
        };
        tables.audit_logs.insert(id, record.clone());
        Ok(record)
    }

    fn audit_logs(&self) -> Result<Vec<AuditLog>, RepositoryError> {
        let mut logs: Vec<AuditLog> = self.tables().audit_logs.values().cloned().collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(logs)
    }
}
