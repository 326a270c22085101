use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::credentials::PasswordHash;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Primary key of a registered user.
    UserId
);
record_id!(
    /// Primary key of a loan application (distinct from its public reference).
    LoanApplicationId
);
record_id!(DocumentId);
record_id!(CreditScoreId);
record_id!(AuditLogId);

/// Portal role; drives which API operations a user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Borrower,
    Agent,
    Compliance,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Borrower => "borrower",
            Self::Agent => "agent",
            Self::Compliance => "compliance",
            Self::Admin => "admin",
        }
    }
}

/// Borrower onboarding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Incomplete,
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnderReview => "Under Review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::UnderReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    NationalId,
    BankStatement,
    MobileMoneyStatement,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NationalId => "national_id",
            Self::BankStatement => "bank_statement",
            Self::MobileMoneyStatement => "mobile_money_statement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

/// Stored user, including credentials. Never serialized directly; see [`PublicUser`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: Option<String>,
    pub password: PasswordHash,
    pub role: Role,
    pub is_active: bool,
    pub profile_status: ProfileStatus,
    pub employment_status: Option<String>,
    pub monthly_income: Option<Decimal>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public_view(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            national_id: self.national_id.clone(),
            role: self.role,
            is_active: self.is_active,
            profile_status: self.profile_status,
            employment_status: self.employment_status.clone(),
            monthly_income: self.monthly_income,
            address: self.address.clone(),
            created_at: self.created_at,
        }
    }
}

/// User as exposed over the API, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub profile_status: ProfileStatus,
    pub employment_status: Option<String>,
    pub monthly_income: Option<Decimal>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields the store needs to create a user; id, timestamps and defaults are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: Option<String>,
    pub password: PasswordHash,
    pub role: Role,
    pub profile_status: ProfileStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub national_id: Option<String>,
    pub password: String,
}

/// Response envelope for login and signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user: PublicUser,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub employment_status: Option<String>,
    pub monthly_income: Option<Decimal>,
    pub address: Option<String>,
    pub profile_status: Option<ProfileStatus>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl ProfileUpdate {
    pub(crate) fn touches_privileged_fields(&self) -> bool {
        self.role.is_some()
            || self.is_active.is_some()
            || matches!(
                self.profile_status,
                Some(ProfileStatus::Approved | ProfileStatus::Rejected | ProfileStatus::Incomplete)
            )
    }

    pub(crate) fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(national_id) = self.national_id {
            user.national_id = Some(national_id);
        }
        if let Some(employment_status) = self.employment_status {
            user.employment_status = Some(employment_status);
        }
        if let Some(monthly_income) = self.monthly_income {
            user.monthly_income = Some(monthly_income);
        }
        if let Some(address) = self.address {
            user.address = Some(address);
        }
        if let Some(profile_status) = self.profile_status {
            user.profile_status = profile_status;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: LoanApplicationId,
    /// Public reference such as `#LA2026001`.
    #[serde(rename = "applicationId")]
    pub reference: String,
    pub borrower_id: UserId,
    pub amount: Decimal,
    pub purpose: String,
    pub monthly_income: Decimal,
    pub employment_status: String,
    pub guarantor_name: String,
    pub guarantor_contact: String,
    pub status: ApplicationStatus,
    pub credit_score: Option<u16>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub comments: Option<String>,
}

/// Borrower supplied application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationSubmission {
    pub borrower_id: UserId,
    pub amount: Decimal,
    pub purpose: String,
    pub monthly_income: Decimal,
    pub employment_status: String,
    pub guarantor_name: String,
    pub guarantor_contact: String,
}

/// Record handed to the store; id and reference are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewLoanApplication {
    pub submission: LoanApplicationSubmission,
    pub credit_score: Option<u16>,
    pub submitted_at: DateTime<Utc>,
}

/// Agent decision on an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReview {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Validated review outcome applied by the store in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDecision {
    pub status: ApplicationStatus,
    pub comments: Option<String>,
    pub reviewed_by: UserId,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub user_id: UserId,
    pub application_id: Option<LoanApplicationId>,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub filename: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub user_id: UserId,
    #[serde(default)]
    pub application_id: Option<LoanApplicationId>,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReview {
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScore {
    pub id: CreditScoreId,
    pub user_id: UserId,
    pub score: u16,
    pub payment_history: Option<Decimal>,
    pub debt_to_income_ratio: Option<Decimal>,
    pub credit_utilization: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Bureau style figures supplied when refreshing a user's score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScoreUpdate {
    pub score: u16,
    #[serde(default)]
    pub payment_history: Option<Decimal>,
    #[serde(default)]
    pub debt_to_income_ratio: Option<Decimal>,
    #[serde(default)]
    pub credit_utilization: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "User Login")]
    UserLogin,
    #[serde(rename = "User Registration")]
    UserRegistration,
    #[serde(rename = "Profile Update")]
    ProfileUpdate,
    #[serde(rename = "Loan Application Submitted")]
    LoanApplicationSubmitted,
    #[serde(rename = "Application Approved")]
    ApplicationApproved,
    #[serde(rename = "Application Rejected")]
    ApplicationRejected,
    #[serde(rename = "Document Upload")]
    DocumentUpload,
    #[serde(rename = "Document Verified")]
    DocumentVerified,
    #[serde(rename = "Document Rejected")]
    DocumentRejected,
    #[serde(rename = "Credit Score Update")]
    CreditScoreUpdate,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UserLogin => "User Login",
            Self::UserRegistration => "User Registration",
            Self::ProfileUpdate => "Profile Update",
            Self::LoanApplicationSubmitted => "Loan Application Submitted",
            Self::ApplicationApproved => "Application Approved",
            Self::ApplicationRejected => "Application Rejected",
            Self::DocumentUpload => "Document Upload",
            Self::DocumentVerified => "Document Verified",
            Self::DocumentRejected => "Document Rejected",
            Self::CreditScoreUpdate => "Credit Score Update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub target: String,
    pub status: AuditStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub target: String,
    pub status: AuditStatus,
}

impl NewAuditLog {
    pub fn success(user_id: Option<UserId>, action: AuditAction, target: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            target: target.into(),
            status: AuditStatus::Success,
        }
    }

    pub fn failed(user_id: Option<UserId>, action: AuditAction, target: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            target: target.into(),
            status: AuditStatus::Failed,
        }
    }
}
