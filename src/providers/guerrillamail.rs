//! Guerrilla Mail provider (ajax.php API).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{MailProvider, Mailbox, MessageSummary, ProviderError, Result};

const DEFAULT_BASE_URL: &str = "https://api.guerrillamail.com/ajax.php";

pub struct GuerrillaMailProvider {
    client: Client,
    base_url: String,
}

/// The API serializes ids and timestamps inconsistently (string or number).
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(i64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GetAddressResponse {
    email_addr: Option<String>,
    sid_token: Option<String>,
}

#[derive(Deserialize)]
struct CheckEmailResponse {
    #[serde(default)]
    list: Vec<EmailEntry>,
}

#[derive(Deserialize)]
struct EmailEntry {
    mail_id: Option<StringOrNumber>,
    mail_timestamp: Option<StringOrNumber>,
    mail_subject: Option<String>,
}

#[derive(Deserialize)]
struct FetchEmailResponse {
    mail_body: Option<String>,
}

impl GuerrillaMailProvider {
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

    fn sid_token(mailbox: &Mailbox) -> Result<&str> {
        mailbox
            .token
            .as_deref()
            .ok_or_else(|| ProviderError::other("guerrillamail mailbox is missing its sid_token"))
    }

    async fn call<T: serde::de::DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "ajax.php returned HTTP {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailProvider for GuerrillaMailProvider {
    fn name(&self) -> &str {
        "guerrillamail"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(&self.base_url)
            .query(&[("f", "get_email_address")])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn create(&self) -> Result<Mailbox> {
        let created: GetAddressResponse = self
            .call(&[("f", "get_email_address"), ("lang", "en")])
            .await?;

        match (created.email_addr, created.sid_token) {
            (Some(address), Some(sid_token)) => {
                tracing::info!(provider = "guerrillamail", %address, "mailbox created");
                Ok(Mailbox::with_token(address, sid_token))
            }
            _ => Err(ProviderError::ParseError(
                "no 'email_addr' or 'sid_token' in response".to_string(),
            )),
        }
    }

    async fn list(&self, mailbox: &Mailbox) -> Result<Vec<MessageSummary>> {
        let sid_token = Self::sid_token(mailbox)?;
        let checked: CheckEmailResponse = self
            .call(&[("f", "check_email"), ("seq", "0"), ("sid_token", sid_token)])
            .await?;

        Ok(checked
            .list
            .into_iter()
            .filter_map(|m| {
                m.mail_id.map(|id| MessageSummary {
                    id: id.into_string(),
                    received_at: m.mail_timestamp.map(StringOrNumber::into_string),
                    subject: m.mail_subject,
                })
            })
            .collect())
    }

    async fn read(&self, mailbox: &Mailbox, id: &str) -> Result<String> {
        let sid_token = Self::sid_token(mailbox)?;
        let fetched: FetchEmailResponse = self
            .call(&[
                ("f", "fetch_email"),
                ("email_id", id),
                ("sid_token", sid_token),
            ])
            .await?;

        Ok(fetched.mail_body.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_address_shape() {
        let json = r#"{"email_addr": "xyz@sharklasers.com", "sid_token": "abcdef", "alias": "x"}"#;
        let parsed: GetAddressResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.email_addr.as_deref(), Some("xyz@sharklasers.com"));
        assert_eq!(parsed.sid_token.as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_check_email_mixed_id_types() {
        let json = r#"{"list": [
            {"mail_id": 12345, "mail_timestamp": 1700000000, "mail_subject": "Demo"},
            {"mail_id": "67890", "mail_timestamp": "1700000001"}
        ]}"#;
        let parsed: CheckEmailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.list.len(), 2);
        assert_eq!(parsed.list[0].mail_id.clone().unwrap().into_string(), "12345");
        assert_eq!(parsed.list[1].mail_id.clone().unwrap().into_string(), "67890");
    }

    #[test]
    fn test_fetch_email_missing_body() {
        let parsed: FetchEmailResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.mail_body.is_none());
    }
}
