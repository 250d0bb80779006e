//! Last-resort local address generator.
//!
//! Produces a pseudo-random address on a hardcoded domain list when every
//! remote provider is down. The address is not verified deliverable and the
//! inbox cannot be read, so a run on this provider can only end in timeout.

use async_trait::async_trait;

use super::provider::{MailProvider, Mailbox, MessageSummary, Result};

const BUILTIN_DOMAINS: &[&str] = &["sharklasers.com", "grr.la"];

pub struct LocalProvider {
    domains: Vec<String>,
}

impl LocalProvider {
    /// An empty list falls back to the built-in domains so address
    /// generation can never panic on the modulo below.
    pub fn new(domains: Vec<String>) -> Self {
        let domains = if domains.is_empty() {
            BUILTIN_DOMAINS.iter().map(|d| d.to_string()).collect()
        } else {
            domains
        };
        Self { domains }
    }

    fn generate_address(&self) -> String {
        // The tail of a ULID is its random component; the head is a
        // timestamp and would repeat within the same millisecond.
        let id = ulid::Ulid::new().to_string().to_lowercase();
        let local_part = &id[id.len() - 12..];
        let domain = &self.domains[fastrand_index(self.domains.len())];
        format!("{}@{}", local_part, domain)
    }
}

/// Pick an index without pulling in an RNG crate: the low bits of a fresh
/// ULID's random component are good enough for domain selection.
fn fastrand_index(len: usize) -> usize {
    (ulid::Ulid::new().random() % len as u128) as usize
}

#[async_trait]
impl MailProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn create(&self) -> Result<Mailbox> {
        let address = self.generate_address();
        tracing::warn!(
            %address,
            "generated local fallback address; deliverability is unverified"
        );
        Ok(Mailbox::new(address))
    }

    async fn list(&self, _mailbox: &Mailbox) -> Result<Vec<MessageSummary>> {
        // No inbox behind a generated address.
        Ok(Vec::new())
    }

    async fn read(&self, _mailbox: &Mailbox, _id: &str) -> Result<String> {
        Ok(String::new())
    }
}
