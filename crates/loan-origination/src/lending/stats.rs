use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{ApplicationStatus, AuditLog, AuditStatus, LoanApplication, User};
use crate::config::LendingConfig;

/// Dashboard figures for the admin and compliance views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_users: usize,
    pub total_applications: usize,
    pub pending_applications: usize,
    pub approved_applications: usize,
    pub rejected_applications: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_loan_volume: Decimal,
    /// Rejected share of all applications, one decimal place.
    pub default_rate: String,
    pub monthly_growth: f64,
    pub compliance_rate: f64,
    pub registered_agencies: u32,
}

impl OverviewStats {
    pub fn compute(
        users: &[User],
        applications: &[LoanApplication],
        audit_logs: &[AuditLog],
        config: &LendingConfig,
    ) -> Self {
        let count = |status: ApplicationStatus| {
            applications
                .iter()
                .filter(|application| application.status == status)
                .count()
        };
        let pending_applications = count(ApplicationStatus::UnderReview);
        let approved_applications = count(ApplicationStatus::Approved);
        let rejected_applications = count(ApplicationStatus::Rejected);

        let total_loan_volume = applications
            .iter()
            .filter(|application| application.status == ApplicationStatus::Approved)
            .map(|application| application.amount)
            .sum();

        Self {
            total_users: users.len(),
            total_applications: applications.len(),
            pending_applications,
            approved_applications,
            rejected_applications,
            total_loan_volume,
            default_rate: format!("{:.1}", default_rate(rejected_applications, applications.len())),
            monthly_growth: config.monthly_growth,
            compliance_rate: compliance_rate(audit_logs),
            registered_agencies: config.registered_agencies,
        }
    }
}

fn default_rate(rejected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    rejected as f64 / total as f64 * 100.0
}

/// Successful audited actions as a percentage, rounded to one decimal. An empty trail is fully compliant.
pub fn compliance_rate(audit_logs: &[AuditLog]) -> f64 {
    if audit_logs.is_empty() {
        return 100.0;
    }
    let successes = audit_logs
        .iter()
        .filter(|entry| entry.status == AuditStatus::Success)
        .count();
    let rate = successes as f64 / audit_logs.len() as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}
