use jotpad_core::state::StoreMode;

use crate::commands::common::Workspace;
use crate::error::CliError;

/// Wipe the demo slots and reseed the welcome notes.
pub fn run_reset(workspace: &Workspace) -> Result<(), CliError> {
    if workspace.mode != StoreMode::OfflineDemo {
        return Err(CliError::DemoOnly("reset"));
    }

    workspace.local.clear_demo_data();
    workspace.local.initialize();
    println!("Reset demo data ({} notes)", workspace.local.get_notes().len());
    Ok(())
}
