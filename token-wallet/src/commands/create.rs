//! Wallet creation command

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use zeroize::Zeroizing;

use crate::config::Network;
use crate::store::validate_wallet_name;

use super::{
    blocking, print_mnemonic, print_success, print_warning, prompt_confirm, prompt_new_password,
    Manager,
};

/// Run the create command
pub async fn run(manager: &Manager, name: String, network: Option<Network>) -> Result<()> {
    validate_wallet_name(&name)?;
    if manager.find_wallet(&name)?.is_some() {
        return Err(anyhow!("A wallet named '{}' already exists", name));
    }

    let network = match network {
        Some(network) => network,
        None => manager.load_config()?.network,
    };

    println!();
    let password = Zeroizing::new(prompt_new_password()?);

    let created = {
        let name = name.clone();
        blocking(manager, move |m| m.create_wallet(&name, &password, network)).await?
    };

    println!();
    print_mnemonic(created.mnemonic.as_str());
    let words: Vec<&str> = created.mnemonic.as_str().split_whitespace().collect();

    // Verify the user has written it down
    if prompt_confirm("Have you written down your recovery phrase?")? {
        let verify_index = rand::random::<usize>() % words.len();
        print!("Verify: Enter word #{}: ", verify_index + 1);
        io::stdout().flush()?;

        let mut input = Zeroizing::new(String::new());
        io::stdin().read_line(&mut input)?;

        if input.trim().eq_ignore_ascii_case(words[verify_index]) {
            print_success("Recovery phrase verified.");
        } else {
            print_warning("That word does not match. Use 'token-wallet export' to view the phrase again.");
        }
    } else {
        print_warning("Use 'token-wallet export' to view the phrase again before funding this wallet.");
    }

    println!();
    print_success(&format!("Wallet '{}' created successfully!", name));
    println!();
    println!("Your receiving address ({}):", created.record.network);
    println!("  {}", created.record.address);
    println!();
    print_warning("IMPORTANT: Write down your recovery phrase and store it safely!");
    print_warning("Anyone with this phrase can access your funds.");
    print_warning("If you lose it, you cannot recover your wallet.");

    Ok(())
}
