//! Mailbox provider trait.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub fn other(s: impl Into<String>) -> Self {
        ProviderError::Other(s.into())
    }
}

/// A disposable mailbox issued by a provider.
///
/// The token, where present, authenticates list/read calls for that mailbox.
/// Nothing is persisted; the mailbox dies with the run.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub address: String,
    pub token: Option<String>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
        }
    }

    pub fn with_token(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: Some(token.into()),
        }
    }
}

/// A message listing entry. Bodies are fetched separately via `read`.
#[derive(Debug, Clone)]
pub struct MessageSummary {
    pub id: String,
    pub received_at: Option<String>,
    pub subject: Option<String>,
}

/// Temporary-mailbox provider capability interface.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Cheap reachability probe, used by the providers CLI command.
    async fn is_available(&self) -> bool;

    /// Request a fresh disposable mailbox.
    async fn create(&self) -> Result<Mailbox>;

    /// List messages currently in the mailbox.
    async fn list(&self, mailbox: &Mailbox) -> Result<Vec<MessageSummary>>;

    /// Fetch one message body by id.
    async fn read(&self, mailbox: &Mailbox, id: &str) -> Result<String>;
}
