use chrono::Utc;
use jotpad_core::services::NotesView;

use crate::commands::common::{format_note_lines, Workspace};
use crate::error::CliError;

pub async fn run_watch(workspace: &Workspace) -> Result<(), CliError> {
    let mut receiver = workspace.repository.watch();
    print_view(&receiver.borrow_and_update());

    loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&receiver.borrow_and_update());
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    Ok(())
}

fn print_view(view: &NotesView) {
    for line in render_view(view) {
        println!("{line}");
    }
}

pub fn render_view(view: &NotesView) -> Vec<String> {
    let mode = view.mode.map_or("stopped", |mode| mode.label());
    let mut lines = vec![format!(
        "-- {} notes ({mode}) at {} --",
        view.notes.len(),
        Utc::now().format("%H:%M:%S")
    )];
    if let Some(error) = &view.error {
        lines.push(format!("! {error}"));
    }
    lines.extend(format_note_lines(&view.notes));
    lines
}
