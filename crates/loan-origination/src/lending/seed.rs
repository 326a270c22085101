use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::credentials::PasswordHash;
use super::domain::{
    CreditScoreUpdate, LoanApplicationSubmission, NewLoanApplication, NewUser, ProfileStatus, Role,
};
use super::repository::{LendingRepository, RepositoryError};

/// Password shared by every seeded account.
pub const DEMO_PASSWORD: &str = "password";

struct SeedUser {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    national_id: &'static str,
    role: Role,
}

const SEED_USERS: [SeedUser; 5] = [
    SeedUser {
        name: "John Doe",
        email: "borrower@test.com",
        phone: "+231-123-4567",
        national_id: "LIB123456789",
        role: Role::Borrower,
    },
    SeedUser {
        name: "Agent Smith",
        email: "agent@test.com",
        phone: "+231-123-4568",
        national_id: "LIB123456790",
        role: Role::Agent,
    },
    SeedUser {
        name: "Compliance Officer",
        email: "compliance@test.com",
        phone: "+231-123-4569",
        national_id: "LIB123456791",
        role: Role::Compliance,
    },
    SeedUser {
        name: "System Admin",
        email: "admin@test.com",
        phone: "+231-123-4570",
        national_id: "LIB123456792",
        role: Role::Admin,
    },
    SeedUser {
        name: "Boima Kollie",
        email: "boima@test.com",
        phone: "+231-123-4571",
        national_id: "LIB123456793",
        role: Role::Borrower,
    },
];

struct SeedApplication {
    borrower: usize,
    amount: i64,
    purpose: &'static str,
    employment_status: &'static str,
    monthly_income: i64,
    guarantor_name: &'static str,
    guarantor_contact: &'static str,
    credit_score: u16,
    days_ago: i64,
}

const SEED_APPLICATIONS: [SeedApplication; 3] = [
    SeedApplication {
        borrower: 0,
        amount: 25_000,
        purpose: "Business expansion for local farming equipment",
        employment_status: "self-employed",
        monthly_income: 3_500,
        guarantor_name: "Marie Johnson",
        guarantor_contact: "+231-777-987-654",
        credit_score: 720,
        days_ago: 5,
    },
    SeedApplication {
        borrower: 4,
        amount: 15_000,
        purpose: "Education funding for university tuition",
        employment_status: "employed",
        monthly_income: 2_200,
        guarantor_name: "Joseph Smith",
        guarantor_contact: "+231-777-456-789",
        credit_score: 685,
        days_ago: 3,
    },
    SeedApplication {
        borrower: 0,
        amount: 8_500,
        purpose: "Vehicle purchase for transportation business",
        employment_status: "business-owner",
        monthly_income: 2_800,
        guarantor_name: "Rebecca Wilson",
        guarantor_contact: "+231-777-321-987",
        credit_score: 710,
        days_ago: 1,
    },
];

/// Counts of what [`seed_demo_data`] inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub credit_scores: usize,
    pub applications: usize,
}

/// Populate an empty repository with the demo accounts and pending applications.
pub fn seed_demo_data<R>(repository: &R) -> Result<SeedSummary, RepositoryError>
where
    R: LendingRepository + ?Sized,
{
    let mut user_ids = Vec::with_capacity(SEED_USERS.len());
    for seed in &SEED_USERS {
        let profile_status = match seed.role {
            Role::Borrower => ProfileStatus::Incomplete,
            _ => ProfileStatus::Approved,
        };
        let user = repository.insert_user(NewUser {
            name: seed.name.to_string(),
            email: seed.email.to_string(),
            phone: seed.phone.to_string(),
            national_id: Some(seed.national_id.to_string()),
            password: PasswordHash::new(DEMO_PASSWORD),
            role: seed.role,
            profile_status,
        })?;
        user_ids.push(user.id);
    }

    repository.upsert_credit_score(
        user_ids[0],
        CreditScoreUpdate {
            score: 750,
            payment_history: Some(Decimal::new(9500, 2)),
            debt_to_income_ratio: Some(Decimal::new(3500, 2)),
            credit_utilization: Some(Decimal::new(2500, 2)),
        },
    )?;

    let now = Utc::now();
    for seed in &SEED_APPLICATIONS {
        repository.insert_application(NewLoanApplication {
            submission: LoanApplicationSubmission {
                borrower_id: user_ids[seed.borrower],
                amount: Decimal::from(seed.amount),
                purpose: seed.purpose.to_string(),
                monthly_income: Decimal::from(seed.monthly_income),
                employment_status: seed.employment_status.to_string(),
                guarantor_name: seed.guarantor_name.to_string(),
                guarantor_contact: seed.guarantor_contact.to_string(),
            },
            credit_score: Some(seed.credit_score),
            submitted_at: seeded_submission_time(now, seed.days_ago),
        })?;
    }

    let summary = SeedSummary {
        users: SEED_USERS.len(),
        credit_scores: 1,
        applications: SEED_APPLICATIONS.len(),
    };
    info!(?summary, "seeded demo lending data");
    Ok(summary)
}

/// Backdates a seeded submission without crossing into the previous year, so every
/// seeded reference carries the same year.
fn seeded_submission_time(now: DateTime<Utc>, days_ago: i64) -> DateTime<Utc> {
    let start_of_year = Utc
        .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (now - Duration::days(days_ago)).max(start_of_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::InMemoryLendingStore;

    #[test]
    fn early_january_submissions_stay_in_the_current_year() {
        let now = Utc
            .with_ymd_and_hms(2027, 1, 2, 9, 30, 0)
            .single()
            .expect("valid timestamp");

        let submitted = seeded_submission_time(now, 5);

        assert_eq!(submitted.year(), 2027);
        assert!(submitted <= now);
    }

    #[test]
    fn later_submissions_keep_their_offset() {
        let now = Utc
            .with_ymd_and_hms(2026, 6, 15, 12, 0, 0)
            .single()
            .expect("valid timestamp");

        assert_eq!(seeded_submission_time(now, 3), now - Duration::days(3));
    }

    #[test]
    fn seeded_references_share_one_year() {
        let store = InMemoryLendingStore::default();
        let summary = seed_demo_data(&store).expect("seed succeeds");

        let applications = store.applications().expect("query");
        assert_eq!(applications.len(), summary.applications);
        let year = applications[0].submitted_at.year();
        assert!(applications
            .iter()
            .all(|application| application.reference.starts_with(&format!("#LA{year}"))));
    }
}
