use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    adapters::traits::LedgerClient,
    error::{AppResult, MonitorError},
};

/// An endpoint that answered its liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointHandle {
    pub url: String,
    pub block_height: u64,
}

/// Picks the first live endpoint from a fixed priority list.
///
/// Holds no health state: every call probes again from the top, so an
/// endpoint that recovers is preferred again on the next cycle.
pub struct EndpointSelector {
    client: Arc<dyn LedgerClient>,
    candidates: Vec<String>,
}

impl EndpointSelector {
    pub fn new(client: Arc<dyn LedgerClient>, candidates: Vec<String>) -> Self {
        Self { client, candidates }
    }

    pub async fn select_endpoint(&self) -> AppResult<EndpointHandle> {
        for endpoint in &self.candidates {
            match self.client.block_height(endpoint).await {
                Ok(block_height) => {
                    info!("🔗 Connected successfully to {} (block height {})", endpoint, block_height);
                    return Ok(EndpointHandle {
                        url: endpoint.clone(),
                        block_height,
                    });
                }
                Err(e) => {
                    let failure = MonitorError::ProbeFailure {
                        endpoint: endpoint.clone(),
                        message: e.to_string(),
                    };
                    warn!("⚠️ {}, trying next...", failure);
                }
            }
        }

        Err(MonitorError::AllEndpointsUnavailable {
            attempted: self.candidates.len(),
        }
        .into())
    }
}
