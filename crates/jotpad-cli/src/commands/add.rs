use crate::commands::common::{resolve_new_note, Workspace};
use crate::error::CliError;

pub async fn run_add(
    workspace: &Workspace,
    title: &str,
    content_parts: &[String],
) -> Result<(), CliError> {
    let data = resolve_new_note(title, content_parts)?;
    let id = workspace.repository.create_note(data).await?;

    println!("{id}");
    Ok(())
}
