//! Message signing and verification commands

use anyhow::{anyhow, Result};

use crate::keys::{parse_address, verify as verify_signature};

use super::{print_error, print_success, resolve_wallet_name, unlock_with_prompt, Manager};

/// Run the sign command
pub async fn run(manager: &Manager, message: &str, wallet: Option<String>) -> Result<()> {
    let name = resolve_wallet_name(manager, wallet)?;
    let wallet = unlock_with_prompt(manager, &name).await?;

    let signature = wallet.sign(message.as_bytes());

    println!();
    println!("Signer:    {}", wallet.address());
    println!("Signature: {}", bs58::encode(signature).into_string());

    wallet.lock();
    Ok(())
}

/// Run the verify command
pub fn verify(address: &str, message: &str, signature: &str) -> Result<()> {
    let public_key =
        parse_address(address).ok_or_else(|| anyhow!("'{}' is not a valid address", address))?;
    let signature = bs58::decode(signature.trim())
        .into_vec()
        .map_err(|e| anyhow!("Signature is not valid base58: {}", e))?;

    if verify_signature(message.as_bytes(), &signature, &public_key) {
        print_success("Signature is valid");
        Ok(())
    } else {
        print_error("Signature is NOT valid for this address and message");
        Err(anyhow!("verification failed"))
    }
}
