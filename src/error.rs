use std::time::Duration;

use thiserror::Error;

// ─── Configuration ───────────────────────────────────────────────

/// Problems with the inbound configuration. Always raised before any
/// network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Database name is required")]
    MissingDatabase,
    #[error("Invalid connection target for host '{host}': {reason}")]
    InvalidTarget { host: String, reason: String },
}

// ─── Sampler ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connect, ping and budget expiry all land here.
    #[error("{message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<mongodb::error::Error>,
    },

    #[error("failed to find documents: {source}")]
    Query {
        #[source]
        source: mongodb::error::Error,
    },

    #[error("cursor error: {source}")]
    Cursor {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SamplerError {
    pub fn connect(source: mongodb::error::Error) -> Self {
        Self::Unavailable {
            message: format!("failed to connect to MongoDB: {source}"),
            source: Some(source),
        }
    }

    pub fn ping(source: mongodb::error::Error) -> Self {
        Self::Unavailable {
            message: format!("failed to ping MongoDB: {source}"),
            source: Some(source),
        }
    }

    pub fn timed_out(budget: Duration) -> Self {
        Self::Unavailable {
            message: format!("collection timed out after {}s", budget.as_secs_f64()),
            source: None,
        }
    }

    /// A query that never started is reported the same way as a lost
    /// connection.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Query { .. })
    }
}

// ─── Top level ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
    #[error("{source}")]
    Sampler {
        #[from]
        source: SamplerError,
    },
    #[error("Failed to write output: {source}")]
    Output {
        #[from]
        source: std::io::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;
