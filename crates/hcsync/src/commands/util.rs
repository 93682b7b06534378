//! Shared helpers for command handlers: prompts and progress spinners.

use std::time::Duration;

use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use crate::error::CliError;

/// Map a dialoguer / terminal I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}

/// Ask a yes/no question, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()
        .map_err(prompt_err)
}

pub fn prompt_username() -> Result<String, CliError> {
    let user: String = Input::new()
        .with_prompt("Login")
        .interact_text()
        .map_err(prompt_err)?;
    Ok(user.trim().to_owned())
}

/// Read the password without echo. Never stored.
pub fn prompt_password() -> Result<SecretString, CliError> {
    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    Ok(SecretString::from(pass))
}

/// A spinner on stderr; call `finish_and_clear` when the step ends.
pub fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
