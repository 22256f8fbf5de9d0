//! Line-oriented host: prints the list to a writer and turns typed commands
//! into [`Action`]s.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::error::AppError;
use crate::host::{Action, Host, ListView};
use crate::models::{NewTodo, Priority, Todo, TodoPatch};

pub const HELP: &str = "\
commands:
  n <title> [+u] [+i] [+q]   create todo
  N <title>                  create top priority todo
  e <n> <title>              edit title
  c <n>                      toggle completed
  u|i|q <n>                  toggle urgent / important / quick
  d <n>                      delete
  / [text]                   search (empty clears)
  b                          show backups
  quit                       exit";

pub struct TerminalHost<W> {
    out: W,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        TerminalHost { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn render(&mut self, view: &ListView<'_>) -> io::Result<()> {
        let mut number = 1;
        for section in &view.sections {
            writeln!(self.out, "{} ({})", section.title, section.subtitle)?;
            for todo in &section.items {
                writeln!(self.out, "{:>3}. {}", number, format_item(todo))?;
                number += 1;
            }
        }
        self.out.flush()
    }

    fn open_backup_folder(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "backups: {}", path.display())?;
        let mut command = Command::new(opener());
        command.arg(path);
        if let Err(err) = spawn_reaped(command) {
            warn!(error = %err, path = %path.display(), "could not open backup folder");
        }
        self.out.flush()
    }
}

/// Starts `command` and waits for it on a background thread so the child
/// is reaped once it exits.
fn spawn_reaped(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || {
        let status = child.wait();
        if let Err(ref err) = status {
            warn!(error = %err, "failed waiting for file browser");
        }
        status
    }))
}

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

fn format_item(todo: &Todo) -> String {
    let mark = |on: bool, c: char| if on { c } else { ' ' };
    format!(
        "[{}] {}  [{}][{}][{}]",
        mark(todo.is_completed, 'x'),
        todo.title,
        mark(todo.urgent, 'U'),
        mark(todo.important, 'I'),
        mark(todo.quick, 'Q'),
    )
}

/// Parses one input line. Item numbers refer to `view`, the list the user
/// was looking at, and are resolved to ids here.
pub fn parse_command(line: &str, view: &ListView<'_>) -> Result<Action, AppError> {
    let line = line.trim();
    if let Some(text) = line.strip_prefix('/') {
        return Ok(Action::Search(text.trim().to_string()));
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "n" => Ok(Action::Create(parse_new_todo(rest))),
        "N" => Ok(Action::CreateTopPriority(rest.to_string())),
        "e" => {
            let (number, title) = rest
                .split_once(char::is_whitespace)
                .ok_or(AppError::BadRequest("usage: e <n> <title>"))?;
            Ok(Action::Edit {
                id: resolve(number, view)?,
                patch: TodoPatch {
                    title: Some(title.trim().to_string()),
                    ..TodoPatch::default()
                },
            })
        }
        "c" => Ok(Action::ToggleCompleted(resolve(rest, view)?)),
        "u" => toggle(rest, view, Priority::Urgent),
        "i" => toggle(rest, view, Priority::Important),
        "q" => toggle(rest, view, Priority::Quick),
        "d" => Ok(Action::Delete(resolve(rest, view)?)),
        "b" => Ok(Action::OpenBackups),
        "quit" | "exit" => Ok(Action::Quit),
        _ => Err(AppError::BadRequest("Unknown command")),
    }
}

fn parse_new_todo(rest: &str) -> NewTodo {
    let mut new = NewTodo::default();
    let mut words = Vec::new();
    for word in rest.split_whitespace() {
        match word {
            "+u" => new.urgent = true,
            "+i" => new.important = true,
            "+q" => new.quick = true,
            _ => words.push(word),
        }
    }
    new.title = words.join(" ");
    new
}

fn toggle(rest: &str, view: &ListView<'_>, priority: Priority) -> Result<Action, AppError> {
    Ok(Action::TogglePriority {
        id: resolve(rest, view)?,
        priority,
    })
}

fn resolve(number: &str, view: &ListView<'_>) -> Result<String, AppError> {
    let number: usize = number
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("expected an item number"))?;
    number
        .checked_sub(1)
        .and_then(|index| view.items().nth(index))
        .map(|todo| todo.id.clone())
        .ok_or(AppError::BadRequest("no item with that number"))
}
