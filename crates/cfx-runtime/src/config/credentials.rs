//! Signaling password resolution.

use console::{style, Term};
use dialoguer::Password;
use tracing::debug;

use super::{ConfigError, FrameworkSettings};

/// Environment variable consulted when the configuration has no password.
pub const PASSWORD_ENV: &str = "CFX_XMPP_PASSWORD";

/// Source of a password typed by the operator.
pub trait PasswordPrompt {
    /// Ask for the password of `username`. `None` if nothing was entered.
    fn prompt(&self, username: &str) -> Option<String>;
}

/// Interactive prompt on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt {
    /// Write the prompt to stdout instead of stderr.
    pub to_stdout: bool,
}

impl PasswordPrompt for TerminalPrompt {
    fn prompt(&self, username: &str) -> Option<String> {
        let term = if self.to_stdout {
            Term::stdout()
        } else {
            Term::stderr()
        };
        Password::new()
            .with_prompt(format!("Password for {}", style(username).bold()))
            .interact_on(&term)
            .ok()
            .filter(|p| !p.is_empty())
    }
}

/// Resolve the signaling password: configuration, then `env_value`, then
/// the prompt.
pub fn resolve_password(
    settings: &FrameworkSettings,
    env_value: Option<String>,
    prompt: &dyn PasswordPrompt,
) -> Result<String, ConfigError> {
    if let Some(password) = settings.xmpp_password.as_ref().filter(|p| !p.is_empty()) {
        debug!("Using password from configuration");
        return Ok(password.clone());
    }
    if let Some(password) = env_value.filter(|p| !p.is_empty()) {
        debug!(env = PASSWORD_ENV, "Using password from environment");
        return Ok(password);
    }

    let username = settings.xmpp_username.clone().unwrap_or_default();
    prompt
        .prompt(&username)
        .ok_or(ConfigError::MissingCredential {
            username,
            env: PASSWORD_ENV,
        })
}
