use crate::commands::common::{normalize_note_identifier, resolve_note, Workspace};
use crate::error::CliError;

pub async fn run_delete(workspace: &Workspace, id: &str) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let note = resolve_note(&normalized_id, &workspace.repository.notes())?;

    workspace.repository.delete_note(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
