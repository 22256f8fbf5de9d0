//! The surface a UI host needs: something to render a list, and actions
//! flowing back. Actions always name items by id.

use std::io;
use std::path::Path;

use crate::models::{NewTodo, Priority, Todo, TodoPatch};

#[derive(Debug)]
pub struct ListView<'a> {
    pub sections: Vec<Section<'a>>,
}

impl<'a> ListView<'a> {
    /// Items in display order across all sections.
    pub fn items(&self) -> impl Iterator<Item = &'a Todo> + '_ {
        self.sections.iter().flat_map(|s| s.items.iter().copied())
    }
}

#[derive(Debug)]
pub struct Section<'a> {
    pub title: &'static str,
    pub subtitle: String,
    pub items: Vec<&'a Todo>,
}

impl<'a> Section<'a> {
    pub fn new(title: &'static str, items: Vec<&'a Todo>) -> Self {
        Section {
            title,
            subtitle: format!("ongoing {}: {}", title.to_lowercase(), items.len()),
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create(NewTodo),
    CreateTopPriority(String),
    Edit { id: String, patch: TodoPatch },
    ToggleCompleted(String),
    TogglePriority { id: String, priority: Priority },
    Delete(String),
    Search(String),
    OpenBackups,
    Quit,
}

pub trait Host {
    fn render(&mut self, view: &ListView<'_>) -> io::Result<()>;
    fn open_backup_folder(&mut self, path: &Path) -> io::Result<()>;
}
