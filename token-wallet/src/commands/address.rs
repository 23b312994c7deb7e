//! Address display command

use anyhow::{anyhow, Result};

use super::{resolve_wallet_name, Manager};

/// Run the address command
///
/// Addresses are public, so no password is needed.
pub fn run(manager: &Manager, name: Option<String>) -> Result<()> {
    let name = resolve_wallet_name(manager, name)?;
    let record = manager
        .find_wallet(&name)?
        .ok_or_else(|| anyhow!("No wallet named '{}'", name))?;

    println!();
    println!("Receiving address for '{}' ({}):", record.name, record.network);
    println!();
    println!("  {}", record.address);
    println!();

    Ok(())
}
