//! Wallet export/backup command

use anyhow::Result;

use super::{
    print_mnemonic, print_warning, prompt_confirm, resolve_wallet_name, unlock_with_prompt,
    Manager,
};

/// Run the export command
pub async fn run(manager: &Manager, name: Option<String>, keypair: bool) -> Result<()> {
    let name = resolve_wallet_name(manager, name)?;
    let wallet = unlock_with_prompt(manager, &name).await?;

    println!();
    print_warning("IMPORTANT: Keep your recovery phrase secret!");
    print_warning("Anyone with these words can access your funds.");
    println!();

    if !prompt_confirm("Show recovery phrase on screen?")? {
        println!("Aborted.");
        return Ok(());
    }

    println!();
    print_mnemonic(wallet.mnemonic_phrase());
    println!("Address: {}", wallet.address());
    println!(
        "Created: {}",
        wallet.created_at().format("%Y-%m-%d %H:%M:%S UTC")
    );

    if keypair {
        let bytes = wallet.keys().keypair_bytes();
        let rendered = bytes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        println!();
        println!("Keypair (Solana CLI format):");
        println!("[{}]", rendered);
    }

    wallet.lock();
    Ok(())
}
