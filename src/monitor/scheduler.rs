// Monitor Scheduler - drives the fetch -> reconcile -> notify cycle
//
// Idle -> Baseline: initial scan with retries; failure is fatal
// Baseline -> Steady: fixed-period ticker, one cycle at a time
//
// The steady loop awaits each cycle before waiting on the next tick, and
// ticks missed while a cycle is in flight are skipped, so cycles never overlap
// and the engine has a single writer.

use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, MonitorError},
    monitor::{
        endpoint::EndpointSelector,
        fetcher::SnapshotFetcher,
        notifier::Notifier,
        reconciler::ReconciliationEngine,
        retry::RetryPolicy,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    Baseline,
    Steady,
}

/// Monitor schedule configuration
#[derive(Debug, Clone)]
pub struct MonitorScheduleConfig {
    /// Wallet whose token accounts are watched
    pub owner: String,
    pub poll_interval: Duration,
    pub baseline_retry: RetryPolicy,
}

/// Outcome of one steady-state cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub endpoint: String,
    pub held_tokens: usize,
    pub events: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct MonitorScheduler {
    config: MonitorScheduleConfig,
    selector: EndpointSelector,
    fetcher: SnapshotFetcher,
    engine: ReconciliationEngine,
    notifier: Notifier,
    phase: MonitorPhase,
}

impl MonitorScheduler {
    pub fn new(
        config: MonitorScheduleConfig,
        selector: EndpointSelector,
        fetcher: SnapshotFetcher,
        engine: ReconciliationEngine,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            selector,
            fetcher,
            engine,
            notifier,
            phase: MonitorPhase::Idle,
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Baseline then poll forever. Only returns if the baseline fails.
    pub async fn run(mut self) -> AppResult<()> {
        self.establish_baseline().await?;

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately; the first check waits one period
        ticker.tick().await;

        info!(
            "⏰ Checking {} every {:?}",
            self.config.owner, self.config.poll_interval
        );

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Initial scan: record every current holding as known, without alerts.
    pub async fn establish_baseline(&mut self) -> AppResult<usize> {
        self.phase = MonitorPhase::Baseline;
        info!("🚀 Starting token monitoring for {}", self.config.owner);

        let selector = &self.selector;
        let fetcher = &self.fetcher;
        let owner = self.config.owner.as_str();

        let result = self
            .config
            .baseline_retry
            .run("Initial scan", move |_| async move {
                let endpoint = selector.select_endpoint().await?;
                fetcher.fetch_snapshot(&endpoint, owner).await
            })
            .await;

        match result {
            Ok(snapshot) => {
                self.engine.baseline(&snapshot);
                self.phase = MonitorPhase::Steady;
                Ok(self.engine.known_count())
            }
            Err((attempts, e)) => {
                error!("❌ Failed to complete initial scan after {} attempts: {}", attempts, e);
                Err(MonitorError::BaselineFailed {
                    attempts,
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    /// One fetch -> reconcile -> notify pass. On error the engine is untouched.
    pub async fn run_cycle(&mut self) -> AppResult<CycleReport> {
        if self.phase != MonitorPhase::Steady {
            return Err(AppError::Internal(format!(
                "Monitoring cycle requested in {:?} phase",
                self.phase
            )));
        }

        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        debug!("🔄 Starting monitoring cycle {}", cycle_id);

        let endpoint = self.selector.select_endpoint().await?;
        let snapshot = self
            .fetcher
            .fetch_snapshot(&endpoint, &self.config.owner)
            .await?;

        let events = self.engine.reconcile(&snapshot);

        let mut delivered = 0;
        let mut failed = 0;
        for event in &events {
            if self.notifier.notify(event, &self.config.owner).await.is_delivered() {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        Ok(CycleReport {
            cycle_id,
            started_at,
            endpoint: endpoint.url,
            held_tokens: snapshot.len(),
            events: events.len(),
            delivered,
            failed,
        })
    }

    async fn tick(&mut self) {
        match self.run_cycle().await {
            Ok(report) if report.failed > 0 => warn!(
                "⚠️ Cycle {}: {} events, {} notifications failed",
                report.cycle_id, report.events, report.failed
            ),
            Ok(report) if report.events > 0 => info!(
                "✓ Cycle {}: {} events delivered via {}",
                report.cycle_id, report.delivered, report.endpoint
            ),
            Ok(report) => debug!(
                "✓ Cycle {}: no changes across {} held tokens",
                report.cycle_id, report.held_tokens
            ),
            Err(e) => error!(
                "❌ Monitoring cycle failed, will retry next interval: {}",
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{
        reconciler::ReconcilePolicy,
        testing::{balance, FakeLedger, RecordingTransport},
    };
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const ENDPOINTS: [&str; 3] = [
        "https://one.example",
        "https://two.example",
        "https://three.example",
    ];

    fn scheduler(
        ledger: Arc<FakeLedger>,
        transport: Arc<RecordingTransport>,
        policy: ReconcilePolicy,
    ) -> MonitorScheduler {
        let retry = RetryPolicy::default();
        MonitorScheduler::new(
            MonitorScheduleConfig {
                owner: "Wallet1".to_string(),
                poll_interval: Duration::from_secs(60),
                baseline_retry: retry,
            },
            EndpointSelector::new(ledger.clone(), ENDPOINTS.iter().map(|s| s.to_string()).collect()),
            SnapshotFetcher::new(ledger, retry),
            ReconciliationEngine::new(policy),
            Notifier::new(transport, "https://solscan.io".to_string()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_then_cycle_alerts_only_new_tokens() {
        let ledger = Arc::new(FakeLedger::new());
        let transport = Arc::new(RecordingTransport::new());
        ledger.set_balances(vec![balance("A", "5")]);

        let mut monitor = scheduler(ledger.clone(), transport.clone(), ReconcilePolicy::default());
        assert_eq!(monitor.phase(), MonitorPhase::Idle);
        assert_eq!(monitor.establish_baseline().await.unwrap(), 1);
        assert_eq!(monitor.phase(), MonitorPhase::Steady);

        ledger.set_balances(vec![balance("A", "5"), balance("B", "2")]);
        let report = monitor.run_cycle().await.unwrap();

        assert_eq!(report.events, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.endpoint, "https://one.example");
        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].fields[0].value, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_endpoints_down_at_baseline_is_fatal() {
        let ledger = Arc::new(FakeLedger::new());
        for endpoint in ENDPOINTS {
            ledger.set_down(endpoint);
        }

        let mut monitor = scheduler(ledger.clone(), Arc::new(RecordingTransport::new()), ReconcilePolicy::default());
        let err = monitor.establish_baseline().await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Monitor(MonitorError::BaselineFailed { attempts: 3, .. })
        ));
        assert_ne!(monitor.phase(), MonitorPhase::Steady);
        assert!(!monitor.engine().is_baselined());
        assert_eq!(ledger.probed().len(), 9);

        let run = scheduler(ledger, Arc::new(RecordingTransport::new()), ReconcilePolicy::default())
            .run()
            .await;
        assert!(run.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_requires_baseline() {
        let mut monitor = scheduler(
            Arc::new(FakeLedger::new()),
            Arc::new(RecordingTransport::new()),
            ReconcilePolicy::default(),
        );
        assert!(matches!(monitor.run_cycle().await, Err(AppError::Internal(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_leaves_state_unchanged() {
        let ledger = Arc::new(FakeLedger::new());
        let transport = Arc::new(RecordingTransport::new());
        ledger.set_balances(vec![balance("A", "5")]);

        let mut monitor = scheduler(ledger.clone(), transport.clone(), ReconcilePolicy::default());
        monitor.establish_baseline().await.unwrap();

        ledger.set_balances(vec![balance("A", "9"), balance("B", "1")]);
        ledger.fail_all_fetches(true);

        let err = monitor.run_cycle().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Monitor(MonitorError::FetchFailed { attempts: 3, .. })
        ));
        assert_eq!(monitor.engine().known_quantity(&"A".into()), Some(dec!(5)));
        assert_eq!(monitor.engine().known_quantity(&"B".into()), None);
        assert!(transport.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_failure_does_not_roll_back_state() {
        let ledger = Arc::new(FakeLedger::new());
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = scheduler(ledger.clone(), transport.clone(), ReconcilePolicy::default());
        monitor.establish_baseline().await.unwrap();

        transport.set_failing(true);
        ledger.set_balances(vec![balance("A", "5")]);
        let report = monitor.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(monitor.engine().known_quantity(&"A".into()), Some(dec!(5)));

        transport.set_failing(false);
        let report = monitor.run_cycle().await.unwrap();
        assert_eq!(report.events, 0);
        assert!(transport.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_loop_survives_failed_ticks() {
        let ledger = Arc::new(FakeLedger::new());
        let transport = Arc::new(RecordingTransport::new());
        ledger.set_balances(vec![balance("A", "5")]);

        let handle = tokio::spawn(
            scheduler(ledger.clone(), transport.clone(), ReconcilePolicy::default()).run(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ledger.fetch_calls(), 1);
        ledger.set_balances(vec![balance("A", "5"), balance("B", "2")]);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.delivered().len(), 1);

        // tick at 120s exhausts its retries by 124s
        ledger.fail_all_fetches(true);
        tokio::time::sleep(Duration::from_secs(70)).await;
        assert_eq!(transport.delivered().len(), 1);
        assert_eq!(ledger.fetch_calls(), 5);

        ledger.fail_all_fetches(false);
        ledger.set_balances(vec![balance("A", "5"), balance("B", "2"), balance("C", "1")]);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.delivered().len(), 2);
        assert_eq!(transport.delivered()[1].fields[0].value, "C");
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_never_overlap() {
        let ledger = Arc::new(FakeLedger::new());
        let handle = tokio::spawn(
            scheduler(ledger.clone(), Arc::new(RecordingTransport::new()), ReconcilePolicy::default())
                .run(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        ledger.set_fetch_delay(Duration::from_secs(150));

        // the cycle starting at 60s holds its fetch until 210s
        tokio::time::sleep(Duration::from_secs(208)).await;
        assert_eq!(ledger.fetch_calls(), 2);

        // the late tick fires once when that cycle settles
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ledger.fetch_calls(), 3);

        // ticks at 240s and 300s fall inside the 210s-360s cycle and are dropped
        tokio::time::sleep(Duration::from_secs(145)).await;
        assert_eq!(ledger.fetch_calls(), 3);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ledger.fetch_calls(), 4);
        assert_eq!(ledger.max_in_flight(), 1);

        handle.abort();
    }
}
