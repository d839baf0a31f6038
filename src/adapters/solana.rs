use async_trait::async_trait;
use serde::Deserialize;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_request::TokenAccountsFilter};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::{
    adapters::traits::{LedgerClient, RawTokenBalance},
    error::{AppError, AppResult},
};

/// SPL Token program - owner of every classic token account
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[derive(Debug, Clone)]
pub struct SolanaConfig {
    pub endpoints: Vec<String>,
    pub commitment: CommitmentConfig,
    /// Bound on every RPC round trip
    pub request_timeout: Duration,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["https://api.mainnet-beta.solana.com".to_string()],
            commitment: CommitmentConfig::confirmed(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC ledger reader backed by one `RpcClient` per endpoint
pub struct SolanaLedgerClient {
    config: SolanaConfig,
    clients: HashMap<String, Arc<RpcClient>>,
    token_program: Pubkey,
}

impl SolanaLedgerClient {
    pub fn new(config: SolanaConfig) -> AppResult<Self> {
        let clients = config
            .endpoints
            .iter()
            .map(|url| (url.clone(), Arc::new(Self::build_client(&config, url))))
            .collect();

        let token_program = Pubkey::from_str(SPL_TOKEN_PROGRAM_ID)
            .map_err(|e| AppError::Internal(format!("Bad token program id: {}", e)))?;

        Ok(Self {
            config,
            clients,
            token_program,
        })
    }

    fn build_client(config: &SolanaConfig, url: &str) -> RpcClient {
        RpcClient::new_with_timeout_and_commitment(
            url.to_string(),
            config.request_timeout,
            config.commitment,
        )
    }

    fn client(&self, endpoint: &str) -> Arc<RpcClient> {
        match self.clients.get(endpoint) {
            Some(client) => client.clone(),
            None => Arc::new(Self::build_client(&self.config, endpoint)),
        }
    }
}

#[async_trait]
impl LedgerClient for SolanaLedgerClient {
    async fn block_height(&self, endpoint: &str) -> AppResult<u64> {
        self.client(endpoint)
            .get_block_height()
            .await
            .map_err(|e| AppError::Rpc {
                endpoint: endpoint.to_string(),
                message: format!("Failed to get block height: {}", e),
            })
    }

    async fn token_balances(&self, endpoint: &str, owner: &str) -> AppResult<Vec<RawTokenBalance>> {
        let owner_key = Pubkey::from_str(owner)
            .map_err(|e| AppError::InvalidAddress(format!("{}: {}", owner, e)))?;

        let accounts = self
            .client(endpoint)
            .get_token_accounts_by_owner(&owner_key, TokenAccountsFilter::ProgramId(self.token_program))
            .await
            .map_err(|e| AppError::Rpc {
                endpoint: endpoint.to_string(),
                message: format!("Failed to get token accounts: {}", e),
            })?;

        debug!("{} token accounts returned by {}", accounts.len(), endpoint);

        let mut balances = Vec::with_capacity(accounts.len());
        for keyed in accounts {
            let data = serde_json::to_value(&keyed.account.data)
                .map_err(|e| AppError::Parse(format!("Account data not serializable: {}", e)))?;

            match parse_token_account(&data) {
                Ok(balance) => balances.push(balance),
                Err(e) => warn!("⚠️ Skipping token account {}: {}", keyed.pubkey, e),
            }
        }

        Ok(balances)
    }
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    parsed: ParsedTokenAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    token_amount: UiTokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount: Option<f64>,
    ui_amount_string: Option<String>,
}

/// Decode a `jsonParsed` token account payload
fn parse_token_account(data: &serde_json::Value) -> AppResult<RawTokenBalance> {
    let parsed: ParsedAccountData = serde_json::from_value(data.clone())
        .map_err(|e| AppError::Parse(format!("Unexpected token account layout: {}", e)))?;

    let info = parsed.parsed.info;
    Ok(RawTokenBalance {
        mint: info.mint,
        amount: info.token_amount.amount,
        decimals: info.token_amount.decimals,
        ui_amount: info.token_amount.ui_amount,
        ui_amount_string: info.token_amount.ui_amount_string,
    })
}
