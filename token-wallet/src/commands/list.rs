//! Wallet listing command

use anyhow::Result;

use super::Manager;

/// Run the list command
pub fn run(manager: &Manager) -> Result<()> {
    let wallets = manager.list_wallets()?;

    if wallets.is_empty() {
        println!("No wallets found. Run 'token-wallet create <name>' to create one.");
        return Ok(());
    }

    let active = manager.get_active_wallet()?.map(|record| record.name);

    println!();
    println!("  {:<20} {:<10} {}", "NAME", "NETWORK", "ADDRESS");
    for wallet in &wallets {
        let marker = if active.as_deref() == Some(wallet.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<20} {:<10} {}",
            marker, wallet.name, wallet.network, wallet.address
        );
    }
    println!();
    println!("{} wallet(s)", wallets.len());

    Ok(())
}
