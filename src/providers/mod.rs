//! Mailbox providers module.

use reqwest::Client;
use std::sync::Arc;

pub mod guerrillamail;
pub mod local;
pub mod provider;
pub mod tempmail;

pub use provider::{MailProvider, Mailbox, MessageSummary, ProviderError, Result};

use crate::config::Settings;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Provider factory.
pub fn create_provider(name: &str, client: &Client, settings: &Settings) -> Arc<dyn MailProvider> {
    match name {
        "guerrillamail" => Arc::new(guerrillamail::GuerrillaMailProvider::new(client.clone())),
        "local" => Arc::new(local::LocalProvider::new(
            settings.mailbox.fallback_domains.clone(),
        )),
        _ => Arc::new(tempmail::TempMailProvider::new(client.clone())),
    }
}

/// Provider chain for this run: primary, configured fallbacks, then the
/// local generator as the unconditional last resort.
pub fn provider_chain(settings: &Settings) -> Vec<String> {
    let mut chain = vec![settings.mailbox.provider.clone()];
    for name in &settings.mailbox.fallback_providers {
        if !chain.contains(name) {
            chain.push(name.clone());
        }
    }
    if !chain.iter().any(|n| n == "local") {
        chain.push("local".to_string());
    }
    chain
}

/// Walk the provider chain until one yields a mailbox.
///
/// Each provider's `create` goes through the shared retry policy. Exhausting
/// the whole chain is a terminal setup failure.
pub async fn provision(
    client: &Client,
    settings: &Settings,
    policy: &RetryPolicy,
) -> crate::error::Result<(Arc<dyn MailProvider>, Mailbox)> {
    let chain = provider_chain(settings);
    let mut last_error = String::new();

    for name in &chain {
        let provider = create_provider(name, client, settings);
        tracing::info!(provider = %name, "provisioning mailbox");

        let created = retry_with_backoff(policy, || provider.create()).await;
        match created {
            Ok(mailbox) => return Ok((provider, mailbox)),
            Err(e) => {
                tracing::warn!(provider = %name, error = %e, "provider failed, trying next");
                last_error = e.to_string();
            }
        }
    }

    Err(crate::error::Error::Provider(format!(
        "all providers failed ({}); last error: {}",
        chain.join(", "),
        last_error
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_chain_ends_with_local() {
        let settings = Settings::default();
        let chain = provider_chain(&settings);
        assert_eq!(chain, vec!["tempmail", "guerrillamail", "local"]);
    }

    #[test]
    fn test_chain_deduplicates() {
        let mut settings = Settings::default();
        settings.mailbox.provider = "guerrillamail".to_string();
        settings.mailbox.fallback_providers =
            vec!["guerrillamail".to_string(), "tempmail".to_string()];
        let chain = provider_chain(&settings);
        assert_eq!(chain, vec!["guerrillamail", "tempmail", "local"]);
    }

    #[test]
    fn test_chain_with_local_primary() {
        let mut settings = Settings::default();
        settings.mailbox.provider = "local".to_string();
        settings.mailbox.fallback_providers.clear();
        assert_eq!(provider_chain(&settings), vec!["local"]);
    }

    #[test]
    fn test_factory_names() {
        let settings = Settings::default();
        let client = Client::new();
        for name in ["tempmail", "guerrillamail", "local"] {
            assert_eq!(create_provider(name, &client, &settings).name(), name);
        }
        // Unknown names fall back to the primary provider.
        assert_eq!(
            create_provider("unknown", &client, &settings).name(),
            "tempmail"
        );
    }

    #[tokio::test]
    async fn test_provision_with_local_generator() {
        let mut settings = Settings::default();
        settings.mailbox.provider = "local".to_string();
        settings.mailbox.fallback_providers.clear();

        let client = Client::new();
        let policy = RetryPolicy::no_retry();
        let (provider, mailbox) = provision(&client, &settings, &policy).await.unwrap();
        assert_eq!(provider.name(), "local");
        assert!(mailbox.address.contains('@'));
    }
}
