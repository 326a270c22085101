//! Loan origination: borrower intake, agent review, documents, credit scores and the audit trail.

pub mod credentials;
pub mod credit;
pub mod domain;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

pub use credit::{
    CreditRating, CreditScoreView, CreditScorer, FixedCreditScorer, RandomCreditScorer, RiskLevel,
};
pub use domain::{
    ApplicationDecision, ApplicationReview, ApplicationStatus, AuditAction, AuditLog, AuditStatus, CreditScore,
    CreditScoreUpdate, Document, DocumentId, DocumentReview, DocumentStatus, DocumentType,
    DocumentUpload, LoanApplication, LoanApplicationId, LoanApplicationSubmission, LoginRequest,
    ProfileStatus, ProfileUpdate, PublicUser, Role, SessionUser, SignupRequest, UserId,
};
pub use repository::{LendingRepository, RepositoryError};
pub use router::{lending_router, ActingUser, ACTOR_HEADER};
pub use seed::{seed_demo_data, SeedSummary, DEMO_PASSWORD};
pub use service::{DocumentFilter, LendingService, LendingServiceError};
pub use stats::OverviewStats;
pub use store::InMemoryLendingStore;
