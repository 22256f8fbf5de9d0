use tracing::info;

use crate::error::AppError;
use crate::host::{Action, Host};
use crate::models::{NewTodo, Todo};
use crate::App;

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Changed(Todo),
    Deleted(Todo),
    Searched,
    OpenedBackups,
    Quit,
}

pub fn dispatch(app: &mut App, host: &mut dyn Host, action: Action) -> Result<Outcome, AppError> {
    match action {
        Action::Create(new) => create(app, new),
        Action::CreateTopPriority(title) => create(app, NewTodo::top_priority(title)),
        Action::Edit { id, patch } => {
            if let Some(ref title) = patch.title {
                if title.trim().is_empty() {
                    return Err(AppError::BadRequest("Title cannot be empty"));
                }
            }
            let todo = app.session.edit(&id, &patch)?;
            info!(id = %todo.id, title = %todo.title, "Edited todo");
            Ok(Outcome::Changed(todo))
        }
        Action::ToggleCompleted(id) => {
            let todo = app.session.toggle_completed(&id)?;
            info!(id = %todo.id, completed = todo.is_completed, "Toggled completion");
            Ok(Outcome::Changed(todo))
        }
        Action::TogglePriority { id, priority } => {
            let todo = app.session.toggle_priority(&id, priority)?;
            info!(
                id = %todo.id,
                priority = priority.name(),
                value = todo.flag(priority),
                "Toggled priority"
            );
            Ok(Outcome::Changed(todo))
        }
        Action::Delete(id) => {
            let todo = app.session.delete(&id)?;
            info!(id = %todo.id, "Deleted todo");
            Ok(Outcome::Deleted(todo))
        }
        Action::Search(text) => {
            app.search = text;
            Ok(Outcome::Searched)
        }
        Action::OpenBackups => {
            host.open_backup_folder(&app.backup_dir)?;
            Ok(Outcome::OpenedBackups)
        }
        Action::Quit => Ok(Outcome::Quit),
    }
}

/// A blank title falls back to the current search text.
fn create(app: &mut App, mut new: NewTodo) -> Result<Outcome, AppError> {
    if new.title.trim().is_empty() {
        new.title = app.search.trim().to_string();
    }
    if new.title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty"));
    }

    let todo = app.session.create(new)?;
    info!(id = %todo.id, title = %todo.title, "Created todo");
    Ok(Outcome::Changed(todo))
}
