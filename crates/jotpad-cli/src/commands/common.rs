use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jotpad_core::backend::NoteBackend;
use jotpad_core::config::AppConfig;
use jotpad_core::offline::LocalNoteStore;
use jotpad_core::remote::{HttpDocumentClient, RemoteNoteStore};
use jotpad_core::services::NoteRepository;
use jotpad_core::state::StoreMode;
use jotpad_core::storage::FileKeyValueStore;
use jotpad_core::util::normalize_text_option;
use jotpad_core::{NewNote, Note};
use serde::Serialize;

use crate::config::{load_config, resolve_data_dir};
use crate::error::CliError;

/// Global flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub online: bool,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// An observed note repository plus the offline store behind it.
pub struct Workspace {
    pub repository: NoteRepository,
    pub local: LocalNoteStore,
    pub mode: StoreMode,
}

impl Workspace {
    pub fn notes(&self, limit: usize) -> Vec<Note> {
        self.repository.notes().into_iter().take(limit).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub user_id: String,
    pub timestamp: String,
    pub relative_time: String,
}

/// Build the repository for the requested mode and wait for its first snapshot.
pub async fn open_workspace(options: &AppOptions) -> Result<Workspace, CliError> {
    let config = load_config(options.config.as_deref())?;
    let data_dir = resolve_data_dir(options.data_dir.clone(), &config)?;
    let local = LocalNoteStore::new(Arc::new(FileKeyValueStore::open(&data_dir)?));
    let repository = NoteRepository::new(Arc::new(local.clone()), remote_backend(&config)?);

    let (mode, user_id) = if options.online {
        let user_id = normalize_text_option(options.user.clone())
            .ok_or_else(|| CliError::Config("--online requires --user <UID>".to_string()))?;
        if !repository.has_online_store() {
            return Err(CliError::Config(
                "online mode needs notes_api_url in config.json or JOTPAD_API_URL".to_string(),
            ));
        }
        (StoreMode::Online, user_id)
    } else {
        local.initialize();
        (StoreMode::OfflineDemo, local.demo_user().uid.clone())
    };

    repository.observe_notes(&user_id, mode).await?;
    repository.wait_until_loaded().await;
    tracing::debug!("Workspace ready in {mode} mode");

    Ok(Workspace {
        repository,
        local,
        mode,
    })
}

fn remote_backend(config: &AppConfig) -> Result<Option<Arc<dyn NoteBackend>>, CliError> {
    let Some(url) = config.notes_api_url.clone() else {
        return Ok(None);
    };
    let client = HttpDocumentClient::new(url, config.notes_api_key.clone())?;
    let store: Arc<dyn NoteBackend> = Arc::new(
        RemoteNoteStore::new(client)
            .with_retry_policy(config.retry_policy())
            .with_poll_interval(config.poll_interval()),
    );
    Ok(Some(store))
}

/// Find a note by exact id, then by unique id prefix.
pub fn resolve_note(note_query: &str, notes: &[Note]) -> Result<Note, CliError> {
    if let Some(note) = notes.iter().find(|note| note.id.as_str() == note_query) {
        return Ok(note.clone());
    }

    let matching = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(note_query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query.to_string())),
        [note] => Ok((*note).clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| note.id.as_str().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = note.id.as_str().chars().take(13).collect::<String>();
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.timestamp.timestamp_millis(), now_ms);
            format!("{short_id:<13}  {preview:<40}  {relative_time}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        user_id: note.user_id.clone(),
        timestamp: note.timestamp.to_rfc3339(),
        relative_time: format_relative_time(note.timestamp.timestamp_millis(), now_ms),
    }
}

/// Title (or first content line for untitled notes), whitespace-collapsed and
/// truncated with an ellipsis.
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.title_preview(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Build the new note from `--title` and the content arguments, falling back
/// to piped stdin for content.
pub fn resolve_new_note(title: &str, content_parts: &[String]) -> Result<NewNote, CliError> {
    let content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => Some(content),
        None => read_piped_stdin()?,
    };
    let data = NewNote::new(title, content.unwrap_or_default()).trimmed();
    if data.is_blank() {
        Err(CliError::EmptyContent)
    } else {
        Ok(data)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("jotpad-note-{}-{now}.md", std::process::id()))
}
