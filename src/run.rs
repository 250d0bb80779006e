//! Run pipeline: provision, submit, poll, extract, notify.

use reqwest::Client;

use crate::config::Settings;
use crate::error::Result;
use crate::poll::InboxPoller;
use crate::providers;
use crate::retry::RetryPolicy;
use crate::target::TargetSite;
use crate::telegram::Notifier;

/// Run-level stages; transitions are one-directional. Any unrecoverable
/// failure before polling exits the run early instead of reaching a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    MailboxCreated,
    FormSubmitted,
    Polling,
    CodeFound,
    Notified,
    Timeout,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Init => "init",
            RunStage::MailboxCreated => "mailbox_created",
            RunStage::FormSubmitted => "form_submitted",
            RunStage::Polling => "polling",
            RunStage::CodeFound => "code_found",
            RunStage::Notified => "notified",
            RunStage::Timeout => "timeout",
        }
    }
}

fn enter(stage: RunStage) {
    tracing::info!(stage = stage.as_str(), "stage entered");
}

/// Terminal result of a completed run. Setup failures are `Err` instead and
/// map to a non-zero exit code.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    CodeFound {
        code: String,
        address: String,
        notified: bool,
    },
    Timeout {
        address: String,
    },
}

/// Execute one full run.
pub async fn execute(settings: &Settings, notify: bool) -> Result<RunOutcome> {
    enter(RunStage::Init);
    let client = Client::new();
    let policy = RetryPolicy::from(&settings.retry);

    let (provider, mailbox) = providers::provision(&client, settings, &policy).await?;
    enter(RunStage::MailboxCreated);
    tracing::info!(provider = provider.name(), address = %mailbox.address, "mailbox ready");

    let site = TargetSite::new(client.clone(), settings.target.clone(), policy.clone());
    site.check().await?;
    site.submit(&mailbox.address).await?;
    enter(RunStage::FormSubmitted);

    enter(RunStage::Polling);
    let poller = InboxPoller::new(provider, settings.polling.clone());
    let found = poller.poll(&mailbox).await;

    match found {
        Some(found) => {
            enter(RunStage::CodeFound);
            let notifier = if notify {
                Notifier::from_config(client, &settings.telegram)
            } else {
                Notifier::disabled(client)
            };
            let notified = notifier.send_code(&found.code, &mailbox.address).await;
            if notified {
                enter(RunStage::Notified);
            }
            Ok(RunOutcome::CodeFound {
                code: found.code,
                address: mailbox.address,
                notified,
            })
        }
        None => {
            enter(RunStage::Timeout);
            Ok(RunOutcome::Timeout {
                address: mailbox.address,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(RunStage::Init.as_str(), "init");
        assert_eq!(RunStage::MailboxCreated.as_str(), "mailbox_created");
        assert_eq!(RunStage::Timeout.as_str(), "timeout");
    }
}
