//! Inbox polling loop.
//!
//! Fixed-interval, deadline-bounded polling over any [`MailProvider`]. Each
//! iteration lists the mailbox, reads messages not yet seen, and tries to
//! extract a demo code. Per-iteration provider errors are soft: logged and
//! treated as an empty iteration. Stops on the first extracted code.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

use crate::config::PollingConfig;
use crate::extract::extract_demo_code;
use crate::providers::{MailProvider, Mailbox};

/// A code pulled out of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundCode {
    pub code: String,
    pub message_id: String,
}

pub struct InboxPoller {
    provider: Arc<dyn MailProvider>,
    config: PollingConfig,
}

impl InboxPoller {
    pub fn new(provider: Arc<dyn MailProvider>, config: PollingConfig) -> Self {
        Self { provider, config }
    }

    /// Poll until a code is found or the wall-clock timeout elapses.
    ///
    /// The deadline starts after the initial delay; message ids are
    /// de-duplicated so each body is read at most once per run.
    pub async fn poll(&self, mailbox: &Mailbox) -> Option<FoundCode> {
        if !self.config.initial_delay().is_zero() {
            tracing::info!(
                delay_secs = self.config.initial_delay_secs,
                "waiting before first poll"
            );
            sleep(self.config.initial_delay()).await;
        }

        let deadline = Instant::now() + self.config.timeout();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut iteration = 0u32;

        loop {
            iteration += 1;
            if let Some(found) = self.poll_once(mailbox, &mut seen_ids).await {
                tracing::info!(code = %found.code, iteration, "demo code found");
                return Some(found);
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    iteration,
                    timeout_secs = self.config.timeout_secs,
                    address = %mailbox.address,
                    "polling timed out without a code"
                );
                return None;
            }

            sleep(self.config.interval()).await;
        }
    }

    async fn poll_once(&self, mailbox: &Mailbox, seen_ids: &mut HashSet<String>) -> Option<FoundCode> {
        let messages = match self.provider.list(mailbox).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "list failed");
                return None;
            }
        };

        if !messages.is_empty() {
            tracing::debug!(count = messages.len(), "messages in mailbox");
        }

        for message in messages {
            if seen_ids.contains(&message.id) {
                continue;
            }

            let body = match self.provider.read(mailbox, &message.id).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(id = %message.id, error = %e, "read failed");
                    continue;
                }
            };
            seen_ids.insert(message.id.clone());

            if let Some(code) = extract_demo_code(&body) {
                return Some(FoundCode {
                    code: code.to_string(),
                    message_id: message.id,
                });
            }
        }

        None
    }
}
