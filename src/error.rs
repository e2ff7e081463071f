use thiserror::Error;

/// Errors surfaced by the listing engine
#[derive(Debug, Error)]
pub enum MarketError {
    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A newer refresh or filter change replaced the request
    #[error("request superseded by a newer one")]
    Superseded,
}

impl MarketError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
