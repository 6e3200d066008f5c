//! # Integration Flows
//!
//! Raw wire objects submitted through `process`, asserting the stage that
//! stops them and the repository state left behind.

#[cfg(test)]
mod contracts_and_documents;
#[cfg(test)]
mod identities;
#[cfg(test)]
mod name_service;

#[cfg(test)]
pub(crate) mod support {
    use qc_18_platform_state::{InMemoryStateRepository, PlatformConfig, PlatformStateService};
    use quantum_telemetry::{init_logging, TelemetryConfig};
    use std::sync::Arc;

    pub const BLOCK_TIME_MS: u64 = 1_700_000_000_000;

    /// Install logging when `QC_LOG_LEVEL` is set.
    pub fn init_test_logging() {
        let config = TelemetryConfig::from_env();
        if std::env::var("QC_LOG_LEVEL").is_ok() {
            let _ = init_logging(&config);
        }
    }

    pub async fn service_with(
        config: PlatformConfig,
    ) -> (
        PlatformStateService<InMemoryStateRepository>,
        Arc<InMemoryStateRepository>,
    ) {
        init_test_logging();
        let repository = Arc::new(InMemoryStateRepository::with_block_time(BLOCK_TIME_MS));
        let service = PlatformStateService::initialize(Arc::clone(&repository), config)
            .await
            .expect("service initializes");
        (service, repository)
    }

    pub async fn service() -> (
        PlatformStateService<InMemoryStateRepository>,
        Arc<InMemoryStateRepository>,
    ) {
        service_with(PlatformConfig::default()).await
    }
}
