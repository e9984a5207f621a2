//! Hexagonal ports. Telegram and the arXiv API live behind these traits,
//! implemented in the adapter crates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub max_message_len: usize,
}

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is kept minimal so future
/// adapters can fit behind the same interface with capability flags.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
}

/// One result from the paper index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paper {
    pub title: String,
    pub link: String,
    pub first_author: String,
    pub published: DateTime<Utc>,
}

/// Port for the external paper index.
///
/// Implementations return at most `max_results` papers sorted by submission
/// date, newest first.
#[async_trait]
pub trait PaperIndexPort: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>>;
}
