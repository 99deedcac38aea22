use jotpad_core::NotePatch;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_note_identifier, resolve_note, Workspace,
};
use crate::error::CliError;

pub async fn run_edit(
    workspace: &Workspace,
    id: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let note = resolve_note(&normalized_id, &workspace.repository.notes())?;

    let patch = if title.is_none() && content.is_none() {
        let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
            return Err(CliError::EmptyEditedContent);
        };
        if edited_content == note.content {
            println!("{}", note.id);
            return Ok(());
        }
        NotePatch::content(edited_content)
    } else {
        NotePatch {
            title: title.map(|title| title.trim().to_string()),
            content: content.map(|content| content.trim().to_string()),
        }
    };

    let title_after = patch.title.as_deref().unwrap_or(&note.title);
    let content_after = patch.content.as_deref().unwrap_or(&note.content);
    if title_after.is_empty() && content_after.is_empty() {
        return Err(CliError::EmptyEditedContent);
    }

    workspace.repository.update_note(&note.id, patch).await?;
    println!("{}", note.id);
    Ok(())
}
