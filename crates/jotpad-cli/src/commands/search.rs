use crate::commands::common::{
    format_note_lines, normalize_search_query, note_to_list_item, NoteListItem, Workspace,
};
use crate::error::CliError;

pub fn run_search(
    workspace: &Workspace,
    query: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let notes = workspace
        .repository
        .search(&normalized_query)
        .into_iter()
        .take(limit)
        .collect::<Vec<_>>();

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
