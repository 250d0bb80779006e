//! demo-relay library root.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod poll;
pub mod providers;
pub mod retry;
pub mod run;
pub mod target;
pub mod telegram;

pub use cli::Commands;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use error::{Error, Result};
pub use extract::extract_demo_code;
pub use poll::{FoundCode, InboxPoller};
pub use providers::{MailProvider, Mailbox};
pub use run::{execute, RunOutcome};
pub use telegram::Notifier;
