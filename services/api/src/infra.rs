use loan_origination::config::LendingConfig;
use loan_origination::lending::{
    seed_demo_data, CreditScorer, InMemoryLendingStore, LendingService, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type StoreService<S> = LendingService<InMemoryLendingStore, S>;

/// Build the lending service over a fresh in-memory store, seeding it when configured.
pub(crate) fn build_service<S>(
    config: &LendingConfig,
    scorer: S,
) -> Result<Arc<StoreService<S>>, RepositoryError>
where
    S: CreditScorer + 'static,
{
    let store = Arc::new(InMemoryLendingStore::default());
    if config.seed_demo_data {
        let summary = seed_demo_data(store.as_ref())?;
        info!(
            users = summary.users,
            applications = summary.applications,
            "in-memory store seeded"
        );
    }

    Ok(Arc::new(LendingService::new(
        store,
        Arc::new(scorer),
        config.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_origination::lending::FixedCreditScorer;

    #[test]
    fn seeding_follows_configuration() {
        let seeded = build_service(&LendingConfig::default(), FixedCreditScorer(700))
            .expect("service builds");
        assert_eq!(seeded.list_users().expect("users").len(), 5);

        let config = LendingConfig {
            seed_demo_data: false,
            ..LendingConfig::default()
        };
        let empty = build_service(&config, FixedCreditScorer(700)).expect("service builds");
        assert!(empty.list_users().expect("users").is_empty());
        assert!(empty.list_applications(None).expect("applications").is_empty());
    }
}
