use tracing::debug;

use crate::error::AppError;
use crate::host::{ListView, Section};
use crate::models::{NewTodo, Priority, Todo, TodoPatch};
use crate::ordering::{find, insert, reinsert, remove};

/// Receives the full state after every mutation of a [`TodoSession`].
pub trait ChangeListener {
    fn todos_changed(&self, active: &[Todo], done: &[Todo]) -> Result<(), AppError>;
}

/// The in-memory todo lists for one application session.
///
/// Mutations never edit the current lists in place: the new ordering is
/// computed first, swapped in, and then announced to every listener. A
/// listener error is returned to the caller but the in-memory change stays.
pub struct TodoSession {
    active: Vec<Todo>,
    done: Vec<Todo>,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl TodoSession {
    pub fn new(active: Vec<Todo>, done: Vec<Todo>) -> Self {
        TodoSession {
            active,
            done,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn active(&self) -> &[Todo] {
        &self.active
    }

    pub fn done(&self) -> &[Todo] {
        &self.done
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        find(id, &self.active).or_else(|| find(id, &self.done))
    }

    pub fn create(&mut self, new: NewTodo) -> Result<Todo, AppError> {
        let todo = Todo::new(new);
        let active = insert(todo.clone(), &self.active);
        self.commit(active, self.done.clone())?;
        Ok(todo)
    }

    /// Applies `patch` to the currently stored item and moves it to the
    /// position its new score calls for.
    pub fn edit(&mut self, id: &str, patch: &TodoPatch) -> Result<Todo, AppError> {
        if let Some(current) = find(id, &self.active) {
            let updated = patch.apply(current);
            let active = reinsert(updated.clone(), &self.active);
            self.commit(active, self.done.clone())?;
            Ok(updated)
        } else if let Some(current) = find(id, &self.done) {
            let updated = patch.apply(current);
            let done = reinsert(updated.clone(), &self.done);
            self.commit(self.active.clone(), done)?;
            Ok(updated)
        } else {
            Err(AppError::NotFound(id.to_string()))
        }
    }

    pub fn toggle_priority(&mut self, id: &str, priority: Priority) -> Result<Todo, AppError> {
        let current = self
            .get(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let patch = priority.toggle(current);
        self.edit(id, &patch)
    }

    /// Moves the item between the active and done lists.
    pub fn toggle_completed(&mut self, id: &str) -> Result<Todo, AppError> {
        let (from_active, active) = remove(id, &self.active);
        let (from_done, done) = remove(id, &self.done);

        match (from_active, from_done) {
            (Some(mut todo), _) => {
                todo.is_completed = true;
                let done = insert(todo.clone(), &done);
                self.commit(active, done)?;
                Ok(todo)
            }
            (None, Some(mut todo)) => {
                todo.is_completed = false;
                let active = insert(todo.clone(), &active);
                self.commit(active, done)?;
                Ok(todo)
            }
            (None, None) => Err(AppError::NotFound(id.to_string())),
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<Todo, AppError> {
        let (from_active, active) = remove(id, &self.active);
        let (from_done, done) = remove(id, &self.done);
        let removed = from_active
            .or(from_done)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        self.commit(active, done)?;
        Ok(removed)
    }

    /// Both lists, filtered to titles containing `search` (ignoring case).
    pub fn view(&self, search: &str) -> ListView<'_> {
        let needle = search.to_lowercase();
        ListView {
            sections: vec![
                Section::new("Todos", matching(&self.active, &needle)),
                Section::new("Done", matching(&self.done, &needle)),
            ],
        }
    }

    fn commit(&mut self, active: Vec<Todo>, done: Vec<Todo>) -> Result<(), AppError> {
        self.active = active;
        self.done = done;
        debug!(
            active = self.active.len(),
            done = self.done.len(),
            "todos changed"
        );
        for listener in &self.listeners {
            listener.todos_changed(&self.active, &self.done)?;
        }
        Ok(())
    }
}

fn matching<'a>(list: &'a [Todo], needle: &str) -> Vec<&'a Todo> {
    list.iter()
        .filter(|t| t.title.to_lowercase().contains(needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Recorder {
        calls: Rc<RefCell<Vec<(usize, usize)>>>,
    }

    impl ChangeListener for Recorder {
        fn todos_changed(&self, active: &[Todo], done: &[Todo]) -> Result<(), AppError> {
            self.calls.borrow_mut().push((active.len(), done.len()));
            Ok(())
        }
    }

    struct Failing;

    impl ChangeListener for Failing {
        fn todos_changed(&self, _: &[Todo], _: &[Todo]) -> Result<(), AppError> {
            Err(AppError::Database("disk full".to_string()))
        }
    }

    fn new_todo(title: &str, urgent: bool, important: bool, quick: bool) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            urgent,
            important,
            quick,
        }
    }

    fn titles(list: &[Todo]) -> Vec<&str> {
        list.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn every_mutation_notifies_listeners() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        session.subscribe(Box::new(Recorder {
            calls: calls.clone(),
        }));

        let a = session.create(new_todo("a", true, false, false)).unwrap();
        session.toggle_priority(&a.id, Priority::Quick).unwrap();
        session.toggle_completed(&a.id).unwrap();
        session.delete(&a.id).unwrap();

        assert_eq!(*calls.borrow(), vec![(1, 0), (1, 0), (0, 1), (0, 0)]);
    }

    #[test]
    fn toggling_priority_relocates_item() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        session.create(new_todo("important", false, true, false)).unwrap();
        let quick = session.create(new_todo("quick", false, false, true)).unwrap();
        assert_eq!(titles(session.active()), vec!["important", "quick"]);

        let updated = session.toggle_priority(&quick.id, Priority::Urgent).unwrap();
        assert!(updated.urgent && updated.quick);
        assert_eq!(updated.id, quick.id);
        assert_eq!(titles(session.active()), vec!["quick", "important"]);
    }

    #[test]
    fn toggle_reads_current_item_not_stale_copy() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        let stale = session.create(new_todo("a", false, false, false)).unwrap();

        session.toggle_priority(&stale.id, Priority::Urgent).unwrap();
        session.toggle_priority(&stale.id, Priority::Urgent).unwrap();
        let current = session.get(&stale.id).unwrap();
        assert!(!current.urgent);

        session.toggle_priority(&stale.id, Priority::Important).unwrap();
        let current = session.get(&stale.id).unwrap();
        assert!(current.important);
        assert!(!current.urgent);
    }

    #[test]
    fn edit_title_keeps_flags() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        let todo = session.create(new_todo("draft", true, false, true)).unwrap();
        let patch = TodoPatch {
            title: Some("final".to_string()),
            ..TodoPatch::default()
        };
        let updated = session.edit(&todo.id, &patch).unwrap();
        assert_eq!(updated.title, "final");
        assert!(updated.urgent && updated.quick);
        assert_eq!(session.active().len(), 1);
    }

    #[test]
    fn completion_moves_between_lists_by_score() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        let low = session.create(new_todo("low", false, false, true)).unwrap();
        let high = session.create(new_todo("high", true, true, false)).unwrap();

        session.toggle_completed(&low.id).unwrap();
        let done_high = session.toggle_completed(&high.id).unwrap();
        assert!(done_high.is_completed);
        assert!(session.active().is_empty());
        assert_eq!(titles(session.done()), vec!["high", "low"]);

        let reopened = session.toggle_completed(&low.id).unwrap();
        assert!(!reopened.is_completed);
        assert_eq!(titles(session.active()), vec!["low"]);
        assert_eq!(titles(session.done()), vec!["high"]);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        assert!(matches!(session.delete("nope"), Err(AppError::NotFound(_))));
        assert!(matches!(
            session.toggle_completed("nope"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            session.toggle_priority("nope", Priority::Quick),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn listener_failure_is_surfaced_but_change_is_kept() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        session.subscribe(Box::new(Failing));
        let result = session.create(new_todo("a", false, false, false));
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(session.active().len(), 1);
    }

    #[test]
    fn view_filters_case_insensitively() {
        let mut session = TodoSession::new(Vec::new(), Vec::new());
        session.create(new_todo("Buy Milk", false, false, false)).unwrap();
        let bread = session.create(new_todo("bake bread", false, false, false)).unwrap();
        session.toggle_completed(&bread.id).unwrap();
        session.create(new_todo("milk the cow", false, false, false)).unwrap();

        let view = session.view("MILK");
        assert_eq!(view.sections[0].items.len(), 2);
        assert_eq!(view.sections[1].items.len(), 0);
        assert_eq!(view.sections[0].subtitle, "ongoing todos: 2");

        let view = session.view("");
        assert_eq!(view.sections[1].subtitle, "ongoing done: 1");
    }
}
