//! Active wallet selection command

use anyhow::Result;

use super::{print_success, Manager};

/// Run the use command
pub fn run(manager: &Manager, name: &str) -> Result<()> {
    manager.set_active_wallet(name)?;
    print_success(&format!("Active wallet is now '{}'", name));
    Ok(())
}
