use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::{str::FromStr, sync::Arc};
use tracing::{debug, warn};

use crate::{
    adapters::traits::{LedgerClient, RawTokenBalance},
    error::{AppError, AppResult, MonitorError},
    ledger::models::{MintAddress, Snapshot},
    monitor::{endpoint::EndpointHandle, retry::RetryPolicy},
};

/// Reads the owner's holdings into a `Snapshot`. Never touches engine state.
pub struct SnapshotFetcher {
    client: Arc<dyn LedgerClient>,
    retry: RetryPolicy,
}

impl SnapshotFetcher {
    pub fn new(client: Arc<dyn LedgerClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub async fn fetch_snapshot(&self, endpoint: &EndpointHandle, owner: &str) -> AppResult<Snapshot> {
        let client: &dyn LedgerClient = self.client.as_ref();
        let url = endpoint.url.as_str();

        let raw = self
            .retry
            .run("Token account fetch", move |_| client.token_balances(url, owner))
            .await
            .map_err(|(attempts, e)| MonitorError::FetchFailed {
                attempts,
                message: e.to_string(),
            })?;

        let snapshot = parse_snapshot(raw, Utc::now());
        debug!("📸 Snapshot from {}: {} held tokens", url, snapshot.len());
        Ok(snapshot)
    }
}

/// Normalize raw ledger entries. Unparseable entries are skipped with a
/// warning; non-positive quantities are dropped by `Snapshot`.
pub fn parse_snapshot(raw: Vec<RawTokenBalance>, observed_at: DateTime<Utc>) -> Snapshot {
    let entries = raw.into_iter().filter_map(|balance| match parse_quantity(&balance) {
        Ok(quantity) if !balance.mint.is_empty() => Some((MintAddress::new(balance.mint), quantity)),
        Ok(_) => {
            warn!("⚠️ Skipping token balance without a mint address");
            None
        }
        Err(e) => {
            warn!("⚠️ Skipping token balance for {}: {}", balance.mint, e);
            None
        }
    });

    Snapshot::new(entries, observed_at)
}

/// UI amount string first, then raw amount scaled by decimals, then the float.
fn parse_quantity(balance: &RawTokenBalance) -> AppResult<Decimal> {
    if let Some(ui) = balance.ui_amount_string.as_deref() {
        if let Ok(quantity) = Decimal::from_str(ui) {
            return Ok(quantity);
        }
    }

    if let Ok(base_units) = balance.amount.parse::<u64>() {
        let mut quantity = Decimal::from(base_units);
        if quantity.set_scale(u32::from(balance.decimals)).is_ok() {
            return Ok(quantity);
        }
    }

    if let Some(ui) = balance.ui_amount {
        return Ok(Decimal::try_from(ui)?);
    }

    Err(AppError::Parse(format!(
        "No usable amount (amount={:?}, decimals={})",
        balance.amount, balance.decimals
    )))
}
