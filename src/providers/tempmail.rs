//! temp-mail.org provider (unofficial web2 API).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{MailProvider, Mailbox, MessageSummary, ProviderError, Result};

const DEFAULT_BASE_URL: &str = "https://web2.temp-mail.org";
// The endpoint rejects the default reqwest UA.
const USER_AGENT: &str = "PostmanRuntime/7.49.1";

pub struct TempMailProvider {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CreateResponse {
    mailbox: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageEntry>,
}

#[derive(Deserialize)]
struct MessageEntry {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "receivedAt")]
    received_at: Option<String>,
    subject: Option<String>,
}

#[derive(Deserialize)]
struct ReadResponse {
    #[serde(rename = "bodyHtml")]
    body_html: Option<String>,
    #[serde(rename = "bodyPreview")]
    body_preview: Option<String>,
    #[serde(rename = "textBody")]
    text_body: Option<String>,
}

impl ReadResponse {
    /// First non-empty body representation, HTML preferred.
    fn into_body(self) -> String {
        [self.body_html, self.body_preview, self.text_body]
            .into_iter()
            .flatten()
            .find(|b| !b.is_empty())
            .unwrap_or_default()
    }
}

impl TempMailProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn bearer(mailbox: &Mailbox) -> Result<&str> {
        mailbox
            .token
            .as_deref()
            .ok_or_else(|| ProviderError::other("tempmail mailbox is missing its token"))
    }
}

#[async_trait]
impl MailProvider for TempMailProvider {
    fn name(&self) -> &str {
        "tempmail"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(&self.base_url)
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .is_ok()
    }

    async fn create(&self) -> Result<Mailbox> {
        let response = self
            .client
            .post(format!("{}/mailbox", self.base_url))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .json(&serde_json::json!({}))
            .timeout(Duration::from_secs(60))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, text)));
        }

        let created: CreateResponse = response.json().await?;
        match (created.mailbox, created.token) {
            (Some(address), Some(token)) => {
                tracing::info!(provider = "tempmail", %address, "mailbox created");
                Ok(Mailbox::with_token(address, token))
            }
            _ => Err(ProviderError::ParseError(
                "no 'mailbox' or 'token' in response".to_string(),
            )),
        }
    }

    async fn list(&self, mailbox: &Mailbox) -> Result<Vec<MessageSummary>> {
        let token = Self::bearer(mailbox)?;

        let response = self
            .client
            .get(format!("{}/messages", self.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "list returned HTTP {}",
                response.status()
            )));
        }

        let listed: ListResponse = response.json().await?;
        Ok(listed
            .messages
            .into_iter()
            .filter_map(|m| {
                m.id.map(|id| MessageSummary {
                    id,
                    received_at: m.received_at,
                    subject: m.subject,
                })
            })
            .collect())
    }

    async fn read(&self, mailbox: &Mailbox, id: &str) -> Result<String> {
        let token = Self::bearer(mailbox)?;

        let response = self
            .client
            .get(format!("{}/messages/{}", self.base_url, id))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "read {} returned HTTP {}",
                id,
                response.status()
            )));
        }

        let message: ReadResponse = response.json().await?;
        Ok(message.into_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_response_shape() {
        let json = r#"{"mailbox": "abc123@tempmail.example", "token": "eyJhbGciOi"}"#;
        let parsed: CreateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mailbox.as_deref(), Some("abc123@tempmail.example"));
        assert_eq!(parsed.token.as_deref(), Some("eyJhbGciOi"));
    }

    #[test]
    fn test_list_response_shape() {
        let json = r#"{"messages": [
            {"_id": "m1", "receivedAt": "2024-01-01T00:00:00Z", "subject": "Demo"},
            {"receivedAt": "2024-01-01T00:00:01Z"}
        ]}"#;
        let parsed: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].id.as_deref(), Some("m1"));
        // Entries without an id are dropped by list().
        assert!(parsed.messages[1].id.is_none());
    }

    #[test]
    fn test_list_response_missing_messages_field() {
        let parsed: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.messages.is_empty());
    }

    #[test]
    fn test_body_preference_order() {
        let full = ReadResponse {
            body_html: Some("<p>html</p>".to_string()),
            body_preview: Some("preview".to_string()),
            text_body: Some("text".to_string()),
        };
        assert_eq!(full.into_body(), "<p>html</p>");

        let preview_only = ReadResponse {
            body_html: Some(String::new()),
            body_preview: Some("preview".to_string()),
            text_body: None,
        };
        assert_eq!(preview_only.into_body(), "preview");

        let empty = ReadResponse {
            body_html: None,
            body_preview: None,
            text_body: None,
        };
        assert_eq!(empty.into_body(), "");
    }
}
