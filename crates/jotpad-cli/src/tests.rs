use std::path::Path;

use jotpad_core::services::NotesView;
use jotpad_core::state::StoreMode;
use jotpad_core::{NewNote, Note, NoteId};
use tempfile::TempDir;

use crate::commands::add::run_add;
use crate::commands::common::{
    default_editor, format_relative_time, normalize_content, normalize_note_identifier,
    normalize_search_query, note_preview, open_workspace, resolve_new_note, resolve_note,
    AppOptions, Workspace,
};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::reset::run_reset;
use crate::commands::watch::render_view;
use crate::error::CliError;

fn offline_options(dir: &Path) -> AppOptions {
    AppOptions {
        online: false,
        user: None,
        data_dir: Some(dir.join("data")),
        config: Some(dir.join("config.json")),
    }
}

async fn offline_workspace(dir: &TempDir) -> Workspace {
    open_workspace(&offline_options(dir.path())).await.unwrap()
}

fn note_with_id(id: &str, title: &str) -> Note {
    let mut note = Note::new("user", NewNote::new(title, ""));
    note.id = NoteId::from(id);
    note
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let note = Note::new(
        "user",
        NewNote::new("This is a very long sentence that should be shortened", ""),
    );
    let preview = note_preview(&note, 20);
    assert_eq!(preview, "This is a very lo...");
}

#[test]
fn note_preview_falls_back_to_content_for_untitled_notes() {
    let note = Note::new("user", NewNote::new("  ", "first   line\nsecond line"));
    assert_eq!(note_preview(&note, 40), "first line");
}

#[test]
fn normalize_search_query_rejects_empty() {
    assert!(normalize_search_query(" \n\t ").is_err());
    assert_eq!(
        normalize_search_query("  exact phrase  ").unwrap(),
        "exact phrase"
    );
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier(" \n "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(
        normalize_note_identifier("  abc123  ").unwrap(),
        "abc123".to_string()
    );
}

#[test]
fn resolve_new_note_joins_and_trims_arguments() {
    let data = resolve_new_note(" Groceries ", &["Milk,".to_string(), "eggs".to_string()]).unwrap();
    assert_eq!(data, NewNote::new("Groceries", "Milk, eggs"));
}

#[test]
fn resolve_note_supports_exact_and_prefix_id() {
    let notes = vec![
        note_with_id("11111111-aaaa", "Note A"),
        note_with_id("11111111-bbbb", "Note B"),
        note_with_id("11111111-bbbb-2", "Note C"),
    ];

    assert_eq!(resolve_note("11111111-aaaa", &notes).unwrap().title, "Note A");
    assert_eq!(resolve_note("11111111-a", &notes).unwrap().title, "Note A");
    // An exact id wins even when it is also a prefix of another id.
    assert_eq!(resolve_note("11111111-bbbb", &notes).unwrap().title, "Note B");
}

#[test]
fn resolve_note_rejects_ambiguous_and_missing() {
    let notes = vec![
        note_with_id("aaaaaaaa-1", "Left"),
        note_with_id("aaaaaaaa-2", "Right"),
    ];

    assert!(matches!(
        resolve_note("aaaaaaaa", &notes),
        Err(CliError::AmbiguousNoteId(_))
    ));
    assert!(matches!(
        resolve_note("does-not-exist", &notes),
        Err(CliError::NoteNotFound(_))
    ));
}

#[test]
fn render_view_shows_mode_and_error() {
    let view = NotesView {
        notes: vec![note_with_id("abc", "Groceries")],
        loading: false,
        error: Some("Failed to create note in demo mode".to_string()),
        mode: Some(StoreMode::OfflineDemo),
        user_id: Some("offline-demo-user".to_string()),
    };

    let lines = render_view(&view);
    assert!(lines[0].contains("1 notes (offline demo)"));
    assert_eq!(lines[1], "! Failed to create note in demo mode");
    assert!(lines[2].contains("Groceries"));
}

#[tokio::test]
async fn offline_workspace_starts_with_seeded_notes() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = offline_workspace(&dir).await;

    assert_eq!(workspace.mode, StoreMode::OfflineDemo);
    assert_eq!(workspace.notes(10).len(), 3);
    assert_eq!(workspace.notes(2).len(), 2);
}

#[tokio::test]
async fn added_notes_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    {
        let workspace = offline_workspace(&dir).await;
        run_add(&workspace, "Groceries", &["Milk, eggs".to_string()])
            .await
            .unwrap();
        assert_eq!(workspace.notes(10)[0].title, "Groceries");
    }

    let reopened = offline_workspace(&dir).await;
    let notes = reopened.notes(10);
    assert_eq!(notes.len(), 4);
    assert_eq!(notes[0].content, "Milk, eggs");
}

#[tokio::test]
async fn run_delete_accepts_exact_and_prefix_id() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = offline_workspace(&dir).await;
    let notes = workspace.notes(10);

    run_delete(&workspace, notes[0].id.as_str()).await.unwrap();
    assert_eq!(workspace.notes(10).len(), 2);

    let remaining = workspace.notes(10);
    let full_id = remaining[0].id.as_str();
    let prefix = &full_id[..full_id.len() - 1];
    run_delete(&workspace, prefix).await.unwrap();
    assert_eq!(workspace.notes(10).len(), 1);

    let error = run_delete(&workspace, notes[0].id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::NoteNotFound(_)));
}

#[tokio::test]
async fn run_edit_updates_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = offline_workspace(&dir).await;
    let target = workspace.notes(10)[2].clone();

    run_edit(&workspace, target.id.as_str(), Some("Renamed".to_string()), None)
        .await
        .unwrap();

    let edited = workspace.notes(10)[0].clone();
    assert_eq!(edited.id, target.id);
    assert_eq!(edited.title, "Renamed");
    assert_eq!(edited.content, target.content);

    let error = run_edit(
        &workspace,
        target.id.as_str(),
        Some(String::new()),
        Some("  ".to_string()),
    )
    .await
    .unwrap_err();
    assert!(matches!(error, CliError::EmptyEditedContent));
}

#[tokio::test]
async fn run_reset_restores_the_welcome_notes() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = offline_workspace(&dir).await;
    run_add(&workspace, "scratch", &["pad".to_string()])
        .await
        .unwrap();
    assert_eq!(workspace.notes(10).len(), 4);

    run_reset(&workspace).unwrap();
    let notes = workspace.notes(10);
    assert_eq!(notes.len(), 3);
    assert!(notes[0].title.starts_with("Welcome to Demo Mode!"));
}

#[tokio::test]
async fn online_mode_requires_user_and_api_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = offline_options(dir.path());
    options.online = true;

    let Err(error) = open_workspace(&options).await else {
        panic!("online mode without --user should fail");
    };
    assert!(matches!(error, CliError::Config(message) if message.contains("--user")));

    std::fs::write(dir.path().join("config.json"), "{}").unwrap();
    options.user = Some("alice".to_string());
    let Err(error) = open_workspace(&options).await else {
        panic!("online mode without notes_api_url should fail");
    };
    assert!(matches!(error, CliError::Config(message) if message.contains("notes_api_url")));
}
