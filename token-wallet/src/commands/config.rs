//! Configuration command

use anyhow::{anyhow, Result};

use crate::config::{Network, API_KEY_ENV_VAR, RPC_URL_ENV_VAR};

use super::{print_success, Manager};

/// Run the config command
///
/// With no flags, prints the effective configuration.
pub fn run(manager: &Manager, network: Option<Network>, rpc: Option<String>) -> Result<()> {
    let mut config = manager.load_config()?;

    if network.is_some() || rpc.is_some() {
        if let Some(network) = network {
            config.set_network(network);
        }
        if let Some(rpc) = rpc {
            let rpc = rpc.trim();
            if !(rpc.starts_with("http://") || rpc.starts_with("https://")) {
                return Err(anyhow!("RPC endpoint must be an http(s) URL"));
            }
            config.rpc_endpoint = rpc.to_string();
        }
        manager.save_config(&config)?;
        print_success("Configuration updated");
    }

    let effective = config.with_env_overrides();

    println!();
    println!(
        "Active wallet: {}",
        effective.active_wallet.as_deref().unwrap_or("(none)")
    );
    println!("Network:       {}", effective.network);
    println!("RPC endpoint:  {}", effective.rpc_endpoint);
    if std::env::var_os(RPC_URL_ENV_VAR).is_some() {
        println!("               (overridden by {})", RPC_URL_ENV_VAR);
    }
    println!(
        "API key:       {}",
        if effective.api_key.is_some() {
            "set (from environment)"
        } else {
            "not set"
        }
    );
    if effective.api_key.is_none() {
        println!("               (set {} to provide one)", API_KEY_ENV_VAR);
    }

    Ok(())
}
