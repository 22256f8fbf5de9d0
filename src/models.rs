use serde::{Deserialize, Serialize};

use crate::id::generate_id;

pub const TITLE_PLACEHOLDER: &str = "[Title not found]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    pub urgent: bool,
    pub important: bool,
    pub quick: bool,
}

impl Todo {
    /// Builds a fresh item with a newly generated id.
    pub fn new(new: NewTodo) -> Self {
        Todo {
            id: generate_id(),
            title: title_or_placeholder(new.title),
            is_completed: false,
            urgent: new.urgent,
            important: new.important,
            quick: new.quick,
        }
    }

    pub fn flag(&self, priority: Priority) -> bool {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::Important => self.important,
            Priority::Quick => self.quick,
        }
    }
}

/// Shape of an item as found in storage. Every field is optional so that
/// older or hand-edited data still loads.
#[derive(Debug, Default, Deserialize)]
pub struct StoredTodo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "isCompleted")]
    pub is_completed: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub quick: bool,
}

impl From<StoredTodo> for Todo {
    fn from(stored: StoredTodo) -> Self {
        Todo {
            id: stored
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_id),
            title: title_or_placeholder(stored.title.unwrap_or_default()),
            is_completed: stored.is_completed,
            urgent: stored.urgent,
            important: stored.important,
            quick: stored.quick,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub urgent: bool,
    pub important: bool,
    pub quick: bool,
}

impl NewTodo {
    pub fn top_priority(title: impl Into<String>) -> Self {
        NewTodo {
            title: title.into(),
            urgent: true,
            important: true,
            quick: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub urgent: Option<bool>,
    pub important: Option<bool>,
    pub quick: Option<bool>,
}

impl TodoPatch {
    pub fn apply(&self, todo: &Todo) -> Todo {
        Todo {
            id: todo.id.clone(),
            title: match &self.title {
                Some(title) => title_or_placeholder(title.clone()),
                None => todo.title.clone(),
            },
            is_completed: todo.is_completed,
            urgent: self.urgent.unwrap_or(todo.urgent),
            important: self.important.unwrap_or(todo.important),
            quick: self.quick.unwrap_or(todo.quick),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    Important,
    Quick,
}

impl Priority {
    pub fn name(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Important => "important",
            Priority::Quick => "quick",
        }
    }

    /// Patch that flips this flag relative to `todo`.
    pub fn toggle(self, todo: &Todo) -> TodoPatch {
        let flipped = Some(!todo.flag(self));
        match self {
            Priority::Urgent => TodoPatch {
                urgent: flipped,
                ..TodoPatch::default()
            },
            Priority::Important => TodoPatch {
                important: flipped,
                ..TodoPatch::default()
            },
            Priority::Quick => TodoPatch {
                quick: flipped,
                ..TodoPatch::default()
            },
        }
    }
}

fn title_or_placeholder(title: String) -> String {
    if title.trim().is_empty() {
        TITLE_PLACEHOLDER.to_string()
    } else {
        title
    }
}
