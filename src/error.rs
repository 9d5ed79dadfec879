use thiserror::Error;

#[derive(Error, Debug)]
pub enum HmsError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Statement error: {0}")]
    Statement(String),
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Not logged in")]
    NotAuthenticated,
    /// The executor already reported why; callers only learn that nothing happened.
    #[error("Operation did not complete")]
    Incomplete,
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, HmsError>;

impl From<rusqlite::Error> for HmsError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Statement(e.to_string())
    }
}

impl From<config::ConfigError> for HmsError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<serde_json::Error> for HmsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
