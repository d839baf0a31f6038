//! In-memory collaborators for monitor tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    adapters::traits::{AlertMessage, LedgerClient, NotificationTransport, RawTokenBalance},
    error::{AppError, AppResult},
};

/// Token balance carrying only a UI amount string
pub fn balance(mint: &str, ui_amount: &str) -> RawTokenBalance {
    RawTokenBalance {
        mint: mint.to_string(),
        amount: String::new(),
        decimals: 0,
        ui_amount: None,
        ui_amount_string: Some(ui_amount.to_string()),
    }
}

#[derive(Default)]
struct FakeLedgerState {
    down: HashSet<String>,
    probed: Vec<String>,
    balances: Vec<RawTokenBalance>,
    pending_fetch_failures: u32,
    fetch_always_fails: bool,
    fetch_calls: u32,
    fetch_delay: Duration,
    in_flight: u32,
    max_in_flight: u32,
}

#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<FakeLedgerState>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, endpoint: &str) {
        self.state.lock().unwrap().down.insert(endpoint.to_string());
    }

    pub fn set_up(&self, endpoint: &str) {
        self.state.lock().unwrap().down.remove(endpoint);
    }

    pub fn set_balances(&self, balances: Vec<RawTokenBalance>) {
        self.state.lock().unwrap().balances = balances;
    }

    pub fn fail_next_fetches(&self, count: u32) {
        self.state.lock().unwrap().pending_fetch_failures = count;
    }

    pub fn fail_all_fetches(&self, fail: bool) {
        self.state.lock().unwrap().fetch_always_fails = fail;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().fetch_delay = delay;
    }

    /// Highest number of fetches observed running at the same time
    pub fn max_in_flight(&self) -> u32 {
        self.state.lock().unwrap().max_in_flight
    }

    pub fn probed(&self) -> Vec<String> {
        self.state.lock().unwrap().probed.clone()
    }

    pub fn fetch_calls(&self) -> u32 {
        self.state.lock().unwrap().fetch_calls
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn block_height(&self, endpoint: &str) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.probed.push(endpoint.to_string());
        if state.down.contains(endpoint) {
            return Err(AppError::Rpc {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(250_000_000)
    }

    async fn token_balances(&self, endpoint: &str, _owner: &str) -> AppResult<Vec<RawTokenBalance>> {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            state.fetch_calls += 1;
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);

            let result = if state.fetch_always_fails || state.pending_fetch_failures > 0 {
                state.pending_fetch_failures = state.pending_fetch_failures.saturating_sub(1);
                Err(AppError::Rpc {
                    endpoint: endpoint.to_string(),
                    message: "request timed out".to_string(),
                })
            } else {
                Ok(state.balances.clone())
            };
            (result, state.fetch_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state.lock().unwrap().in_flight -= 1;
        result
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<AlertMessage>>,
    failing: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn delivered(&self) -> Vec<AlertMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &AlertMessage) -> AppResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(AppError::Transport("webhook unreachable".to_string()));
        }
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}
