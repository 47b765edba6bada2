//! Task CRUD with a fixed calendar ordering.
//!
//! Every write is a single SQL statement with `RETURNING`, so the record
//! handed back is exactly what was committed and concurrent writers on the
//! same row serialize inside SQLite.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::models::{parse_date, NewTask, Task, TaskUpdate};
use super::storage::{format_date, get_date, get_timestamp, now_timestamp, today};

const TASK_COLUMNS: &str =
    "id, content, description, due_date, is_completed, image_ref, created_at";

/// Soonest due first; newest first among tasks due the same day
const TASK_ORDER: &str = "ORDER BY due_date ASC, created_at DESC, id DESC";

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        content: row.get(1)?,
        description: row.get(2)?,
        due_date: get_date(row, 3)?,
        is_completed: row.get(4)?,
        image_ref: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
    })
}

fn validate_content(content: &str) -> StoreResult<()> {
    if content.trim().is_empty() {
        return Err(StoreError::Validation(
            "task content must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Storage interface for tasks
pub struct TaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> TaskStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        TaskStore { conn }
    }

    /// Insert a task. Description defaults to empty and due date to today.
    pub fn create(&self, new_task: &NewTask) -> StoreResult<Task> {
        validate_content(&new_task.content)?;
        let due_date = match new_task.due_date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => today(),
        };
        let description = new_task.description.as_deref().unwrap_or("");

        let task = self.conn.query_row(
            &format!(
                "INSERT INTO tasks (content, description, due_date, is_completed, image_ref, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5)
                 RETURNING {TASK_COLUMNS}"
            ),
            params![
                new_task.content,
                description,
                format_date(due_date),
                new_task.image_ref,
                now_timestamp(),
            ],
            task_from_row,
        )?;

        debug!(id = task.id, due = %task.due_date, "task created");
        Ok(task)
    }

    /// Fetch a single task
    pub fn get(&self, id: i64) -> StoreResult<Task> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                task_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    /// All tasks, soonest due first and newest first within a day
    pub fn list(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks {TASK_ORDER}"))?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Tasks due on one calendar day, in the same order as [`TaskStore::list`]
    pub fn list_on(&self, date: NaiveDate) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE due_date = ?1 {TASK_ORDER}"
        ))?;
        let tasks = stmt
            .query_map([format_date(date)], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Replace content, description and due date. Completion state,
    /// image reference and creation time are left alone.
    pub fn update(&self, id: i64, update: &TaskUpdate) -> StoreResult<Task> {
        validate_content(&update.content)?;
        let due_date = parse_date(&update.due_date)?;

        let task = self
            .conn
            .query_row(
                &format!(
                    "UPDATE tasks SET content = ?1, description = ?2, due_date = ?3
                     WHERE id = ?4
                     RETURNING {TASK_COLUMNS}"
                ),
                params![update.content, update.description, format_date(due_date), id],
                task_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        debug!(id, "task updated");
        Ok(task)
    }

    /// Flip `is_completed` in one statement and return the new state
    pub fn toggle_completion(&self, id: i64) -> StoreResult<Task> {
        let task = self
            .conn
            .query_row(
                &format!(
                    "UPDATE tasks SET is_completed = NOT is_completed
                     WHERE id = ?1
                     RETURNING {TASK_COLUMNS}"
                ),
                [id],
                task_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        debug!(id, completed = task.is_completed, "task toggled");
        Ok(task)
    }

    /// Remove a task. Deleting a missing id is an error, including a second
    /// delete of the same id.
    pub fn delete(&self, id: i64) -> StoreResult<()> {
        let removed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(id, "task deleted");
        Ok(())
    }
}
