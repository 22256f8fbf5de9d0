use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Result};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{StoredTodo, Todo};

pub type DbPool = Arc<Mutex<Connection>>;

pub const TODO_KEY: &str = "IQU_TODO_LIST";
pub const DONE_KEY: &str = "IQU_TODO_LIST_DONE";

pub fn init_db(path: &Path) -> Result<DbPool> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_memory_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )
}

fn lock(pool: &DbPool) -> Result<MutexGuard<'_, Connection>, AppError> {
    pool.lock()
        .map_err(|_| AppError::Database("connection lock poisoned".to_string()))
}

// Key/value operations
pub fn get_item(pool: &DbPool, key: &str) -> Result<Option<String>, AppError> {
    let conn = lock(pool)?;
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

pub fn set_item(pool: &DbPool, key: &str, value: &str) -> Result<(), AppError> {
    let conn = lock(pool)?;
    write_item(&conn, key, value)?;
    Ok(())
}

fn write_item(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

// Todo list operations
pub fn load_todos(pool: &DbPool) -> Result<(Vec<Todo>, Vec<Todo>), AppError> {
    let todos = load_list(pool, TODO_KEY)?;
    let dones = load_list(pool, DONE_KEY)?;
    Ok((todos, dones))
}

fn load_list(pool: &DbPool, key: &str) -> Result<Vec<Todo>, AppError> {
    match get_item(pool, key)? {
        Some(data) => Ok(parse_todos(key, &data)),
        None => {
            debug!(key, "no data found in storage");
            Ok(Vec::new())
        }
    }
}

/// Parses a stored list, defaulting missing fields. Anything that is not a
/// JSON array of objects yields an empty list.
pub fn parse_todos(key: &str, data: &str) -> Vec<Todo> {
    match serde_json::from_str::<Vec<StoredTodo>>(data) {
        Ok(stored) => stored.into_iter().map(Todo::from).collect(),
        Err(err) => {
            warn!(key, error = %err, "could not parse stored todos, starting empty");
            Vec::new()
        }
    }
}

/// Writes both lists in one transaction. Either both keys change or neither.
pub fn store_lists(pool: &DbPool, todos: &[Todo], dones: &[Todo]) -> Result<(), AppError> {
    let todos = serde_json::to_string(todos)?;
    let dones = serde_json::to_string(dones)?;

    let mut conn = lock(pool)?;
    let tx = conn.transaction()?;
    write_item(&tx, TODO_KEY, &todos)?;
    write_item(&tx, DONE_KEY, &dones)?;
    tx.commit()?;
    Ok(())
}
