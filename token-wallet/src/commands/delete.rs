//! Wallet deletion command

use anyhow::{anyhow, Result};

use super::{print_success, print_warning, prompt_confirm, Manager};

/// Run the delete command
pub fn run(manager: &Manager, name: &str, yes: bool) -> Result<()> {
    let record = manager
        .find_wallet(name)?
        .ok_or_else(|| anyhow!("No wallet named '{}'", name))?;

    if !yes {
        print_warning("Deleting a wallet removes its encrypted recovery phrase from this machine.");
        print_warning("Funds can only be recovered afterwards with the recovery phrase.");
        println!("Address: {}", record.address);
        println!();

        if !prompt_confirm(&format!("Delete wallet '{}'?", name))? {
            println!("Aborted.");
            return Ok(());
        }
    }

    manager.delete_wallet(name)?;
    print_success(&format!("Wallet '{}' deleted", name));

    match manager.get_active_wallet()? {
        Some(active) => println!("Active wallet: {}", active.name),
        None => println!("No active wallet."),
    }

    Ok(())
}
