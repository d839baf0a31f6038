use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::AppResult;

/// One token account as reported by the ledger, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTokenBalance {
    pub mint: String,
    /// Integer amount in base units, as a string
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
    pub ui_amount_string: Option<String>,
}

/// Read access to the ledger. Endpoints are passed per call so one client can
/// serve every candidate in the failover list.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Cheap liveness probe - current block height at `endpoint`
    async fn block_height(&self, endpoint: &str) -> AppResult<u64>;

    /// Enumerate every token account held by `owner`
    async fn token_balances(&self, endpoint: &str, owner: &str) -> AppResult<Vec<RawTokenBalance>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Transport-neutral alert, rendered by the notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Banner line shown above the alert body
    pub content: String,
    pub title: String,
    pub color: u32,
    pub fields: Vec<AlertField>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &AlertMessage) -> AppResult<()>;
}
