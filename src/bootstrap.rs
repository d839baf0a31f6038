use std::sync::Arc;
use tracing::info;

use crate::{
    adapters::{
        discord::DiscordWebhookTransport,
        solana::{SolanaConfig, SolanaLedgerClient},
        traits::{LedgerClient, NotificationTransport},
    },
    config::Config,
    error::AppResult,
    monitor::{
        EndpointSelector, MonitorScheduleConfig, MonitorScheduler, Notifier, ReconcilePolicy,
        ReconciliationEngine, RetryPolicy, SnapshotFetcher,
    },
};

pub fn initialize_monitor(config: &Config) -> AppResult<MonitorScheduler> {
    info!("Initializing monitor components ...");

    let ledger: Arc<dyn LedgerClient> = Arc::new(SolanaLedgerClient::new(SolanaConfig {
        endpoints: config.rpc_endpoints.clone(),
        commitment: config.commitment,
        request_timeout: config.rpc_timeout,
    })?);
    info!(
        "✅ Solana ledger client initialized with {} endpoints ({:?} commitment)",
        config.rpc_endpoints.len(),
        config.commitment.commitment
    );

    let transport: Arc<dyn NotificationTransport> = Arc::new(DiscordWebhookTransport::new(
        config.webhook_url.clone(),
        config.webhook_timeout,
    )?);
    info!("✅ Discord webhook transport initialized");

    let retry = RetryPolicy::new(config.retry_attempts, config.retry_delay);

    let policy = ReconcilePolicy {
        notify_on_balance_change: config.notify_on_balance_change,
    };
    info!(
        "✅ Reconciliation engine initialized (balance change alerts: {})",
        policy.notify_on_balance_change
    );

    Ok(MonitorScheduler::new(
        MonitorScheduleConfig {
            owner: config.wallet_address.clone(),
            poll_interval: config.poll_interval,
            baseline_retry: retry,
        },
        EndpointSelector::new(ledger.clone(), config.rpc_endpoints.clone()),
        SnapshotFetcher::new(ledger, retry),
        ReconciliationEngine::new(policy),
        Notifier::new(transport, config.explorer_base_url.clone()),
    ))
}
