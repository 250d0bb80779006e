//! CLI commands for demo-relay using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Read;

use crate::config::load_settings_or_default;
use crate::extract::extract_demo_code;
use crate::providers;
use crate::run::{execute, RunOutcome};

/// demo-relay - fetch a demo code through a disposable mailbox.
#[derive(Parser)]
#[command(name = "demo-relay")]
#[command(version = "0.1.0")]
#[command(about = "Disposable-mailbox demo-code fetcher with Telegram relay", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline: provision, submit, poll, relay
    Run {
        /// Mailbox provider: tempmail, guerrillamail, local
        #[arg(long)]
        provider: Option<String>,

        /// Polling wall-clock timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Sleep between polling iterations in seconds
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Skip the Telegram relay even if credentials are set
        #[arg(long)]
        no_notify: bool,
    },

    /// List the provider chain and probe availability
    Providers,

    /// Extract a demo code from a message body (stdin unless --body is given)
    Extract {
        /// Body text; stdin is read when omitted
        #[arg(long)]
        body: Option<String>,
    },
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run {
                provider,
                timeout_secs,
                interval_secs,
                no_notify,
            } => cmd_run(provider, timeout_secs, interval_secs, no_notify).await,
            Command::Providers => cmd_providers().await,
            Command::Extract { body } => cmd_extract(body),
        }
    }
}

async fn cmd_run(
    provider: Option<String>,
    timeout_secs: Option<u64>,
    interval_secs: Option<u64>,
    no_notify: bool,
) -> Result<()> {
    let mut settings = load_settings_or_default();
    if let Some(provider) = provider {
        settings.mailbox.provider = provider;
    }
    if let Some(timeout_secs) = timeout_secs {
        settings.polling.timeout_secs = timeout_secs;
    }
    if let Some(interval_secs) = interval_secs {
        settings.polling.interval_secs = interval_secs;
    }
    // Flag overrides bypass the settings-file load path, so re-validate here;
    // a zero interval would otherwise poll in a hot loop.
    crate::config::validate_settings(&settings)?;

    match execute(&settings, !no_notify).await? {
        RunOutcome::CodeFound {
            code,
            address,
            notified,
        } => {
            println!("code: {}", code);
            println!("email: {}", address);
            println!("relayed: {}", if notified { "yes" } else { "no" });
        }
        RunOutcome::Timeout { address } => {
            println!("no code arrived before the timeout");
            println!("email for manual checking: {}", address);
        }
    }

    // Timeout is still a normal completion; only setup failures exit non-zero.
    Ok(())
}

async fn cmd_providers() -> Result<()> {
    let settings = load_settings_or_default();
    let client = reqwest::Client::new();

    for name in providers::provider_chain(&settings) {
        let provider = providers::create_provider(&name, &client, &settings);
        let available = provider.is_available().await;
        println!(
            "{:<16} {}",
            provider.name(),
            if available { "available" } else { "unreachable" }
        );
    }

    Ok(())
}

fn cmd_extract(body: Option<String>) -> Result<()> {
    let body = match body {
        Some(body) => body,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    match extract_demo_code(&body) {
        Some(code) => {
            println!("{}", code);
            Ok(())
        }
        None => Err(anyhow::anyhow!("no demo code in input")),
    }
}
