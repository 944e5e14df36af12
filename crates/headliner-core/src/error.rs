use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of the query layer. The message of this error becomes the digest
/// body when fetching fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("News query failed: {0}")]
    QueryFailed(String),
}

/// Failure of the mail notifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("SMTP authentication failed: {0}")]
    AuthFailed(String),

    #[error("SMTP transport failed: {0}")]
    TransportFailed(String),

    #[error("Unknown mail error: {0}")]
    Unknown(String),
}

impl SendError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SendError::AuthFailed(_) => "auth",
            SendError::TransportFailed(_) => "transport",
            SendError::Unknown(_) => "unknown",
        }
    }
}
