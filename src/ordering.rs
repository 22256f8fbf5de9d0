//! Priority scoring and score-ordered insertion.
//!
//! Lists are kept in descending score order. Every function here borrows its
//! input and returns a new vector.

use crate::models::Todo;

pub fn score(todo: &Todo) -> f64 {
    1.5 * f64::from(u8::from(todo.urgent))
        + f64::from(u8::from(todo.important))
        + 0.5 * f64::from(u8::from(todo.quick))
}

/// Inserts `todo` before the first item whose score is not greater than its
/// own, so it lands ahead of equally scored items. Appends when every item
/// outranks it.
pub fn insert(todo: Todo, list: &[Todo]) -> Vec<Todo> {
    let todo_score = score(&todo);
    let index = list
        .iter()
        .position(|t| score(t) <= todo_score)
        .unwrap_or(list.len());

    let mut out = Vec::with_capacity(list.len() + 1);
    out.extend_from_slice(&list[..index]);
    out.push(todo);
    out.extend_from_slice(&list[index..]);
    out
}

/// Removes the item with `id`. The list is returned unchanged (as a copy)
/// when no item matches.
pub fn remove(id: &str, list: &[Todo]) -> (Option<Todo>, Vec<Todo>) {
    let mut removed = None;
    let mut rest = Vec::with_capacity(list.len());
    for todo in list {
        if removed.is_none() && todo.id == id {
            removed = Some(todo.clone());
        } else {
            rest.push(todo.clone());
        }
    }
    (removed, rest)
}

/// Replaces the item sharing `todo.id` and moves it to the position its
/// current score calls for.
pub fn reinsert(todo: Todo, list: &[Todo]) -> Vec<Todo> {
    let (_, rest) = remove(&todo.id, list);
    insert(todo, &rest)
}

pub fn find<'a>(id: &str, list: &'a [Todo]) -> Option<&'a Todo> {
    list.iter().find(|t| t.id == id)
}
