//! Wallet import command

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use zeroize::Zeroizing;

use crate::config::Network;
use crate::keys::{normalize_phrase, validate_mnemonic};
use crate::store::validate_wallet_name;

use super::{blocking, print_success, prompt_new_password, Manager};

/// Run the import command
pub async fn run(manager: &Manager, name: String, network: Option<Network>) -> Result<()> {
    validate_wallet_name(&name)?;
    if manager.find_wallet(&name)?.is_some() {
        return Err(anyhow!("A wallet named '{}' already exists", name));
    }

    let phrase = prompt_mnemonic()?;
    validate_mnemonic(&phrase)?;

    let network = match network {
        Some(network) => network,
        None => manager.load_config()?.network,
    };

    println!();
    let password = Zeroizing::new(prompt_new_password()?);

    let record = {
        let name = name.clone();
        blocking(manager, move |m| m.import_wallet(&name, &phrase, &password, network)).await?
    };

    println!();
    print_success(&format!("Wallet '{}' imported successfully!", name));
    println!();
    println!("Your receiving address ({}):", record.network);
    println!("  {}", record.address);

    Ok(())
}

/// Prompt user to enter their recovery phrase
fn prompt_mnemonic() -> Result<Zeroizing<String>> {
    println!();
    println!("Enter your 12 or 24-word recovery phrase:");
    println!("(Enter all words on one line, separated by spaces)");
    println!();

    print!("> ");
    io::stdout().flush()?;

    let mut input = Zeroizing::new(String::new());
    io::stdin().read_line(&mut input)?;

    Ok(normalize_phrase(&input))
}
