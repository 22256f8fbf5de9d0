pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod host;
pub mod id;
pub mod models;
pub mod ordering;
pub mod pipeline;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use error::AppError;
use pipeline::{BackupTask, FileBackup, PersistencePipeline};
use session::TodoSession;

pub struct App {
    pub session: TodoSession,
    pub search: String,
    pub backup_dir: PathBuf,
}

/// Loads the stored lists and wires the session to the persistence
/// pipeline. Must be called from within a tokio runtime.
pub fn open_app(config: &Config) -> Result<(App, BackupTask), AppError> {
    let db = db::init_db(&config.database_path())?;
    let (todos, dones) = db::load_todos(&db)?;
    tracing::info!(
        todos = todos.len(),
        dones = dones.len(),
        path = %config.database_path().display(),
        "loaded todos"
    );

    let sink = Arc::new(FileBackup::new(config.backup_dir()));
    let (pipeline, backups) = PersistencePipeline::spawn(db, sink, config.backup_window);

    let mut session = TodoSession::new(todos, dones);
    session.subscribe(Box::new(pipeline));

    let app = App {
        session,
        search: String::new(),
        backup_dir: config.backup_dir().to_path_buf(),
    };
    Ok((app, backups))
}
