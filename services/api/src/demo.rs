use crate::infra::{build_service, StoreService};
use clap::Args;
use loan_origination::config::{AppConfig, LendingConfig};
use loan_origination::error::AppError;
use loan_origination::lending::{
    ApplicationReview, ApplicationStatus, CreditRating, CreditScorer, DocumentReview,
    DocumentStatus, DocumentType, DocumentUpload, FixedCreditScorer, LoanApplication,
    LoanApplicationSubmission, LoginRequest, OverviewStats, ProfileStatus, ProfileUpdate,
    PublicUser, RandomCreditScorer, SignupRequest, DEMO_PASSWORD,
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Score assigned to the demo borrower instead of a random draw (300-850)
    #[arg(long, value_parser = clap::value_parser!(u16).range(300..=850))]
    pub(crate) credit_score: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct StatsArgs {
    /// Print the overview as JSON, matching the /api/stats/overview payload
    #[arg(long)]
    pub(crate) json: bool,
}

fn seeded_config() -> Result<LendingConfig, AppError> {
    let mut lending = AppConfig::load()?.lending;
    lending.seed_demo_data = true;
    Ok(lending)
}

pub(crate) fn run_stats(args: StatsArgs) -> Result<(), AppError> {
    let service = build_service(&seeded_config()?, RandomCreditScorer)?;
    let stats = service.overview()?;

    if args.json {
        match serde_json::to_string_pretty(&stats) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Overview payload unavailable: {err}"),
        }
    } else {
        render_overview(&stats);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = seeded_config()?;
    match args.credit_score {
        Some(score) => walkthrough(build_service(&config, FixedCreditScorer(score))?)?,
        None => walkthrough(build_service(&config, RandomCreditScorer)?)?,
    };
    Ok(())
}

fn staff_login<S>(service: &StoreService<S>, email: &str) -> Result<PublicUser, AppError>
where
    S: CreditScorer + 'static,
{
    Ok(service.login(LoginRequest {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?)
}

/// Signup, application, document check and agent decision for one new borrower.
fn walkthrough<S>(service: Arc<StoreService<S>>) -> Result<LoanApplication, AppError>
where
    S: CreditScorer + 'static,
{
    println!("Loan origination demo");

    let agent = staff_login(&service, "agent@test.com")?;
    let compliance = staff_login(&service, "compliance@test.com")?;

    let borrower = service.signup(SignupRequest {
        name: "Musu Kollie".to_string(),
        email: "musu.kollie@example.com".to_string(),
        phone: "+231-770-123-456".to_string(),
        national_id: Some("LIB987654321".to_string()),
        password: "palm-butter-2024".to_string(),
    })?;
    println!(
        "\n1. {} <{}> signed up as {}",
        borrower.name,
        borrower.email,
        borrower.role.label()
    );

    let monthly_income = Decimal::new(1_800_00, 2);
    service.update_profile(
        Some(borrower.id),
        borrower.id,
        ProfileUpdate {
            employment_status: Some("self-employed".to_string()),
            monthly_income: Some(monthly_income),
            address: Some("Red Light Market, Paynesville".to_string()),
            profile_status: Some(ProfileStatus::Pending),
            ..ProfileUpdate::default()
        },
    )?;
    println!("2. Profile completed and sent for approval");

    let application = service.submit_application(LoanApplicationSubmission {
        borrower_id: borrower.id,
        amount: Decimal::new(7_500_00, 2),
        purpose: "Second-hand freezer for a cold drinks stand".to_string(),
        monthly_income,
        employment_status: "self-employed".to_string(),
        guarantor_name: "Sando Johnson".to_string(),
        guarantor_contact: "+231-886-909-112".to_string(),
    })?;
    let score = application.credit_score.unwrap_or_default();
    let rating = CreditRating::for_score(score);
    println!(
        "3. Application {} for ${} submitted on {} (credit score {score}, {})",
        application.reference,
        application.amount,
        application.submitted_at.format("%Y-%m-%d"),
        rating.label()
    );

    let document = service.upload_document(DocumentUpload {
        user_id: borrower.id,
        application_id: Some(application.id),
        kind: DocumentType::MobileMoneyStatement,
        filename: "mtn-momo-statement.pdf".to_string(),
    })?;
    println!("4. Uploaded {} as {}", document.filename, document.kind.label());

    service.review_document(
        Some(compliance.id),
        document.id,
        DocumentReview {
            status: DocumentStatus::Verified,
        },
    )?;
    println!("5. {} verified the statement", compliance.name);

    let review = if rating == CreditRating::Poor {
        ApplicationReview {
            status: ApplicationStatus::Rejected,
            comments: Some("Credit score below lending threshold".to_string()),
        }
    } else {
        ApplicationReview {
            status: ApplicationStatus::Approved,
            comments: Some("Income and mobile money history verified".to_string()),
        }
    };
    let reviewed = service.review_application(Some(agent.id), application.id, review)?;
    println!(
        "6. {} marked {} as {}",
        agent.name,
        reviewed.reference,
        reviewed.status.label()
    );

    println!();
    render_overview(&service.overview()?);

    println!("\nRecent audit trail");
    let trail = service.audit_logs(Some(compliance.id))?;
    for entry in trail.iter().take(6) {
        println!(
            "  {}  {:<28} {:<26} {:?}",
            entry.timestamp.format("%H:%M:%S"),
            entry.action.label(),
            entry.target,
            entry.status
        );
    }

    Ok(reviewed)
}

fn render_overview(stats: &OverviewStats) {
    println!("Portfolio overview");
    println!(
        "  Users: {}   Applications: {} ({} pending, {} approved, {} rejected)",
        stats.total_users,
        stats.total_applications,
        stats.pending_applications,
        stats.approved_applications,
        stats.rejected_applications
    );
    println!("  Approved loan volume: ${}", stats.total_loan_volume);
    println!("  Default rate: {}%", stats.default_rate);
    println!("  Compliance rate: {:.1}%", stats.compliance_rate);
    println!(
        "  Monthly growth: {:.1}%   Registered agencies: {}",
        stats.monthly_growth, stats.registered_agencies
    );
}
