use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("RPC error at {endpoint}: {message}")]
    Rpc { endpoint: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the fetch -> reconcile -> notify pipeline
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Liveness probe failed for {endpoint}: {message}")]
    ProbeFailure { endpoint: String, message: String },

    #[error("All RPC endpoints failed ({attempted} tried)")]
    AllEndpointsUnavailable { attempted: usize },

    #[error("Snapshot fetch failed after {attempts} attempts: {message}")]
    FetchFailed { attempts: u32, message: String },

    #[error("Notification delivery failed: {0}")]
    NotifyFailure(String),

    #[error("Initial scan failed after {attempts} attempts: {message}")]
    BaselineFailed { attempts: u32, message: String },
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Transport(format!("HTTP request error: {}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::Parse(format!("Decimal conversion error: {}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
