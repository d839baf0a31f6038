// Wallet monitoring pipeline: endpoint selection, snapshot fetch,
// reconciliation and notification, driven by the scheduler.
pub mod endpoint;
pub mod fetcher;
pub mod notifier;
pub mod reconciler;
pub mod retry;
pub mod scheduler;

#[cfg(test)]
pub mod testing;

pub use endpoint::EndpointSelector;
pub use fetcher::SnapshotFetcher;
pub use notifier::Notifier;
pub use reconciler::{ReconcilePolicy, ReconciliationEngine};
pub use retry::RetryPolicy;
pub use scheduler::{MonitorScheduleConfig, MonitorScheduler};
