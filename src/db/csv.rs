//! Row-oriented file format for a manager's state.
//!
//! ```text
//! id,type,title,status,description,startTime,duration,epic
//! 1,TASK,Groceries,NEW,"Bread, eggs",2030-01-01T09:00:00,60,
//! 2,EPIC,Move house,IN_PROGRESS,,2030-01-02T08:00:00,120,
//! 3,SUBTASK,Pack,DONE,,2030-01-02T08:00:00,120,2
//!
//! HISTORY:
//! 3
//! 1
//! ```
//!
//! One row per item, then an optional history section listing viewed ids from
//! least to most recent. Empty `startTime`/`duration` cells mean the value is
//! absent. Epic rows carry their derived fields for readability only; they are
//! recomputed on load.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;

use crate::manager::TaskManager;
use crate::models::*;

pub const HEADER: &str = "id,type,title,status,description,startTime,duration,epic";
pub const HISTORY_MARKER: &str = "HISTORY:";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const SHORT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Everything read from a file, not yet applied to a manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub epics: Vec<Epic>,
    pub subtasks: Vec<Subtask>,
    pub history: Vec<TaskId>,
}

impl Snapshot {
    pub fn capture(manager: &TaskManager) -> Self {
        Self {
            tasks: manager.list_tasks(),
            epics: manager.list_epics(),
            subtasks: manager.list_subtasks(),
            history: manager.history_ids(),
        }
    }

    /// Replays the snapshot into `manager` under the saved ids.
    ///
    /// Epics go first so subtasks can attach to them whatever order the rows
    /// were written in.
    pub fn restore_into(self, manager: &mut TaskManager) -> Result<()> {
        for epic in self.epics {
            let id = epic.id;
            manager
                .restore_epic(epic)
                .with_context(|| format!("Failed to restore epic {}", id))?;
        }
        for task in self.tasks {
            let id = task.id;
            manager
                .restore_task(task)
                .with_context(|| format!("Failed to restore task {}", id))?;
        }
        for subtask in self.subtasks {
            let id = subtask.id;
            manager
                .restore_subtask(subtask)
                .with_context(|| format!("Failed to restore subtask {}", id))?;
        }
        manager.restore_history(&self.history);
        Ok(())
    }
}

pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for task in &snapshot.tasks {
        push_row(
            &mut out,
            task.id,
            EntityKind::Task,
            &task.title,
            task.status,
            &task.description,
            task.start_time,
            task.duration_minutes,
            None,
        );
    }
    for epic in &snapshot.epics {
        push_row(
            &mut out,
            epic.id,
            EntityKind::Epic,
            &epic.title,
            epic.status,
            &epic.description,
            epic.start_time,
            epic.duration_minutes,
            None,
        );
    }
    for subtask in &snapshot.subtasks {
        push_row(
            &mut out,
            subtask.id,
            EntityKind::Subtask,
            &subtask.title,
            subtask.status,
            &subtask.description,
            subtask.start_time,
            subtask.duration_minutes,
            Some(subtask.epic_id),
        );
    }

    if !snapshot.history.is_empty() {
        out.push('\n');
        out.push_str(HISTORY_MARKER);
        out.push('\n');
        for id in &snapshot.history {
            out.push_str(&id.to_string());
            out.push('\n');
        }
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn push_row(
    out: &mut String,
    id: TaskId,
    kind: EntityKind,
    title: &str,
    status: Status,
    description: &str,
    start_time: Option<NaiveDateTime>,
    duration_minutes: Option<i64>,
    epic_id: Option<TaskId>,
) {
    let cells = [
        id.to_string(),
        kind.as_str().to_string(),
        quote(title),
        status.as_str().to_string(),
        quote(description),
        start_time
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default(),
        duration_minutes.map(|d| d.to_string()).unwrap_or_default(),
        epic_id.map(|id| id.to_string()).unwrap_or_default(),
    ];
    out.push_str(&cells.join(","));
    out.push('\n');
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

pub fn parse(content: &str) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();
    let mut in_history = false;

    for (index, (line, cells)) in records(content)?.into_iter().enumerate() {
        if index == 0 {
            if cells.join(",") != HEADER {
                bail!("line {}: expected header `{}`", line, HEADER);
            }
            continue;
        }
        if cells.len() == 1 && cells[0].trim().is_empty() {
            continue;
        }
        if cells.len() == 1 && cells[0].trim() == HISTORY_MARKER {
            in_history = true;
            continue;
        }

        if in_history {
            let id = cells[0]
                .trim()
                .parse()
                .map_err(|_| anyhow!("line {}: invalid history id `{}`", line, cells[0]))?;
            snapshot.history.push(id);
            continue;
        }

        parse_row(&mut snapshot, &cells).with_context(|| format!("line {}", line))?;
    }

    Ok(snapshot)
}

fn parse_row(snapshot: &mut Snapshot, cells: &[String]) -> Result<()> {
    if cells.len() < 7 || cells.len() > 8 {
        bail!("expected 7 or 8 columns, found {}", cells.len());
    }

    let id: TaskId = cells[0]
        .parse()
        .map_err(|_| anyhow!("invalid id `{}`", cells[0]))?;
    let kind = EntityKind::from_str(&cells[1])
        .ok_or_else(|| anyhow!("unknown type `{}`", cells[1]))?;
    let title = cells[2].clone();
    let status =
        Status::from_str(&cells[3]).ok_or_else(|| anyhow!("unknown status `{}`", cells[3]))?;
    let description = cells[4].clone();
    let start_time = parse_time(&cells[5])?;
    let duration_minutes = optional(&cells[6])
        .map(|d| d.parse().map_err(|_| anyhow!("invalid duration `{}`", d)))
        .transpose()?;

    match kind {
        EntityKind::Task => snapshot.tasks.push(Task {
            id,
            title,
            description,
            status,
            start_time,
            duration_minutes,
        }),
        EntityKind::Epic => snapshot.epics.push(Epic {
            id,
            title,
            description,
            status,
            start_time,
            duration_minutes,
            end_time: None,
            subtask_ids: Vec::new(),
        }),
        EntityKind::Subtask => {
            let epic_id = cells
                .get(7)
                .and_then(|cell| optional(cell))
                .ok_or_else(|| anyhow!("subtask {} has no epic", id))?;
            let epic_id = epic_id
                .parse()
                .map_err(|_| anyhow!("invalid epic id `{}`", epic_id))?;
            snapshot.subtasks.push(Subtask {
                id,
                epic_id,
                title,
                description,
                status,
                start_time,
                duration_minutes,
            });
        }
    }
    Ok(())
}

fn optional(cell: &str) -> Option<&str> {
    let cell = cell.trim();
    (!cell.is_empty()).then_some(cell)
}

fn parse_time(cell: &str) -> Result<Option<NaiveDateTime>> {
    let Some(cell) = optional(cell) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(cell, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(cell, SHORT_TIME_FORMAT))
        .or_else(|_| cell.parse::<NaiveDateTime>())
        .map(Some)
        .map_err(|_| anyhow!("invalid start time `{}`", cell))
}

/// Splits `content` into records of cells, honouring double-quoted cells that
/// may contain commas, escaped quotes (`""`) and line breaks. Each record is
/// paired with the line it starts on.
fn records(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut line = 1;
    let mut record_line = 1;
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if cell.is_empty() => in_quotes = true,
            (',', false) => cells.push(std::mem::take(&mut cell)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                cells.push(std::mem::take(&mut cell));
                records.push((record_line, std::mem::take(&mut cells)));
                line += 1;
                record_line = line;
            }
            ('\n', true) => {
                cell.push(c);
                line += 1;
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        bail!("line {}: unterminated quoted value", record_line);
    }
    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        records.push((record_line, cells));
    }
    Ok(records)
}
