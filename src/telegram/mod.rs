//! Telegram relay for discovered demo codes.

use reqwest::Client;
use std::time::Duration;

use crate::config::TelegramConfig;

/// Sends the discovered code to a Telegram channel via the Bot API.
///
/// Built once per run from explicit configuration. When credentials are
/// missing the notifier is disabled: sends report failure without raising,
/// and the run's outcome is unaffected either way.
pub struct Notifier {
    client: Client,
    credentials: Option<Credentials>,
}

struct Credentials {
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn from_config(client: Client, config: &TelegramConfig) -> Self {
        let credentials = match (&config.bot_token, &config.chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(Credentials {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => {
                tracing::warn!("telegram credentials missing, notifications disabled");
                None
            }
        };

        Self { client, credentials }
    }

    /// Disabled notifier, used by `--no-notify`.
    pub fn disabled(client: Client) -> Self {
        Self {
            client,
            credentials: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Relay a code. Returns whether delivery succeeded; never errors and is
    /// never retried.
    pub async fn send_code(&self, code: &str, email: &str) -> bool {
        let Some(credentials) = &self.credentials else {
            return false;
        };

        let text = format_message(code, email);
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            credentials.bot_token
        );

        let result = self
            .client
            .post(url)
            .form(&[
                ("chat_id", credentials.chat_id.as_str()),
                ("text", text.as_str()),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ])
            .timeout(Duration::from_secs(15))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("code relayed to telegram");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                tracing::warn!(%status, response = %preview, "telegram send failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "telegram send failed");
                false
            }
        }
    }
}

fn format_message(code: &str, email: &str) -> String {
    format!(
        "🆕 <b>Новый демо-код hidemyname</b>\n\n\
         📧 Email: <code>{email}</code>\n\
         🔑 Код: <code>{code}</code>\n\
         ⏰ Получено: {}\n\
         ✅ Работает 24 часа",
        chrono::Utc::now().format("%d.%m.%Y %H:%M:%S UTC")
    )
}
