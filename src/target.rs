//! Target-site form submission.
//!
//! Two fixed endpoints: a GET page checked for a literal marker, and a POST
//! form endpoint answered with a literal success phrase. Both checks are
//! page-structure assumptions; when a marker disappears the run is over.

use reqwest::Client;
use std::time::Duration;

use crate::config::TargetConfig;
use crate::error::{Error, Result};
use crate::retry::{is_retryable_status, retry_if, RetryPolicy};

/// Fetch failure split by retry eligibility.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("transient: {0}")]
    Transient(String),

    #[error("{0}")]
    Terminal(String),
}

pub struct TargetSite {
    client: Client,
    config: TargetConfig,
    policy: RetryPolicy,
}

impl TargetSite {
    pub fn new(client: Client, config: TargetConfig, policy: RetryPolicy) -> Self {
        Self {
            client,
            config,
            policy,
        }
    }

    /// Fetch a URL and return the body text. Connection failures and
    /// retryable statuses go through the shared retry policy; any other
    /// status is a hard answer.
    async fn fetch_text(&self, build: impl Fn() -> reqwest::RequestBuilder) -> Result<String> {
        let result = retry_if(
            &self.policy,
            || async {
                let response = build()
                    .header("User-Agent", &self.config.user_agent)
                    .timeout(Duration::from_secs(20))
                    .send()
                    .await
                    .map_err(|e| FetchError::Transient(e.to_string()))?;

                let status = response.status();
                if is_retryable_status(status) {
                    return Err(FetchError::Transient(format!("HTTP {}", status)));
                }
                if !status.is_success() {
                    return Err(FetchError::Terminal(format!("HTTP {}", status)));
                }

                response
                    .text()
                    .await
                    .map_err(|e| FetchError::Transient(e.to_string()))
            },
            |e| matches!(e, FetchError::Transient(_)),
        )
        .await;

        result.map_err(|e| Error::Target(e.to_string()))
    }

    /// Verify the request page is reachable and still carries the form.
    pub async fn check(&self) -> Result<()> {
        let body = self
            .fetch_text(|| self.client.get(&self.config.check_url))
            .await?;

        if !body.contains(&self.config.page_marker) {
            return Err(Error::Target(format!(
                "page marker not found at {}; form moved or access blocked",
                self.config.check_url
            )));
        }

        tracing::info!(url = %self.config.check_url, "target page reachable");
        Ok(())
    }

    /// Submit the disposable address to the demo-code form.
    pub async fn submit(&self, email: &str) -> Result<()> {
        let form = [(self.config.form_field.as_str(), email)];
        let body = self
            .fetch_text(|| self.client.post(&self.config.submit_url).form(&form))
            .await?;

        if !body.contains(&self.config.success_marker) {
            let preview: String = body.chars().take(400).collect();
            tracing::debug!(response = %preview, "unexpected submit response");
            return Err(Error::Target(
                "success marker not found in submit response".to_string(),
            ));
        }

        tracing::info!(%email, "demo code requested");
        Ok(())
    }
}
