//! CLI Commands
//!
//! Implementation of all wallet CLI commands.

pub mod address;
pub mod config;
pub mod create;
pub mod delete;
pub mod export;
pub mod import;
pub mod list;
pub mod select;
pub mod sign;

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use std::sync::Arc;

use crate::manager::{UnlockedWallet, WalletManager};
use crate::storage::FileStorage;

/// The manager the CLI runs against
pub type Manager = Arc<WalletManager<FileStorage>>;

/// Minimum length accepted for a new wallet password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Prompt for password input (hidden)
pub fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let password = rpassword::read_password()?;
    Ok(password)
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password() -> Result<String> {
    loop {
        let password = prompt_password("Enter wallet password: ")?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            print_error(&format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
            continue;
        }

        let confirm = prompt_password("Confirm password: ")?;

        if password != confirm {
            print_error("Passwords do not match");
            continue;
        }

        return Ok(password);
    }
}

/// Prompt for confirmation
pub fn prompt_confirm(message: &str) -> Result<bool> {
    print!("{} [y/N]: ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("\x1b[31mError:\x1b[0m {}", message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("\x1b[32m{}\x1b[0m", message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("\x1b[33mWarning:\x1b[0m {}", message);
}

/// Lay out recovery words in numbered rows of four
pub fn format_mnemonic_grid(words: &[&str]) -> Vec<String> {
    words
        .chunks(4)
        .enumerate()
        .map(|(row, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(col, word)| format!("{:>2}. {:<12}", row * 4 + col + 1, word))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Print a recovery phrase in four columns
pub fn print_mnemonic(phrase: &str) {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    println!("Your recovery phrase ({} words):", words.len());
    println!();
    for line in format_mnemonic_grid(&words) {
        println!("{}", line);
    }
    println!();
}

/// Run slow wallet work (key derivation) off the async runtime
pub async fn blocking<T, F>(manager: &Manager, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&WalletManager<FileStorage>) -> Result<T, crate::WalletError> + Send + 'static,
{
    let manager = Arc::clone(manager);
    let result = tokio::task::spawn_blocking(move || f(manager.as_ref())).await?;
    Ok(result?)
}

/// Resolve an explicit wallet name or fall back to the active wallet
pub fn resolve_wallet_name(manager: &Manager, name: Option<String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    manager
        .get_active_wallet()?
        .map(|record| record.name)
        .ok_or_else(|| anyhow!("No active wallet. Run 'token-wallet create' or 'token-wallet use <name>' first."))
}

/// Prompt for the wallet password and unlock it
pub async fn unlock_with_prompt(manager: &Manager, name: &str) -> Result<UnlockedWallet> {
    let password = zeroize::Zeroizing::new(prompt_password(&format!(
        "Enter password for '{}': ",
        name
    ))?);
    let name = name.to_string();
    blocking(manager, move |m| m.unlock(&name, &password)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_grid() {
        let words: Vec<&str> = "a b c d e f g h i j k l".split(' ').collect();
        let lines = format_mnemonic_grid(&words);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(" 1. a"));
        assert!(lines[2].contains("12. l"));
        assert!(!lines[2].ends_with(' '));
    }

    #[test]
    fn test_mnemonic_grid_24() {
        let phrase = "w ".repeat(24);
        let words: Vec<&str> = phrase.split_whitespace().collect();
        let lines = format_mnemonic_grid(&words);
        assert_eq!(lines.len(), 6);
        assert!(lines[5].contains("24. w"));
    }
}
