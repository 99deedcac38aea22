use crate::commands::common::{format_note_lines, note_to_list_item, NoteListItem, Workspace};
use crate::error::CliError;

pub fn run_list(workspace: &Workspace, limit: usize, as_json: bool) -> Result<(), CliError> {
    let notes = workspace.notes(limit);

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
