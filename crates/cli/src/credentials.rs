//! Destination credentials: from configuration, or prompted for.

use anyhow::{Context, Result};
use ferry_core::config::DatabaseConfig;
use inquire::{Password, PasswordDisplayMode, Text};

/// Database username and password.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Use configured credentials, prompting on the terminal for whatever is missing.
pub fn resolve(database: &DatabaseConfig) -> Result<Credentials> {
    resolve_with(database, prompt_username, prompt_password)
}

/// Use configured credentials, asking the given prompts for whatever is missing.
pub fn resolve_with(
    database: &DatabaseConfig, ask_username: impl FnOnce() -> Result<String>,
    ask_password: impl FnOnce() -> Result<String>,
) -> Result<Credentials> {
    let username = match &database.username {
        Some(username) => username.clone(),
        None => ask_username()?,
    };
    let password = match &database.password {
        Some(password) => password.clone(),
        None => ask_password()?,
    };
    Ok(Credentials { username, password })
}

fn prompt_username() -> Result<String> {
    Text::new("Enter username:").prompt().context("failed to read username")
}

fn prompt_password() -> Result<String> {
    Password::new("Enter password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("failed to read password")
}
