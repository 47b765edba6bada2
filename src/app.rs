//! Command dispatch: opens the database, calls into the stores and
//! renders results as text or JSON.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::cli::{AppConfig, Commands, MetricCommand, TaskCommand};
use crate::data::{
    format_date, history, parse_date, today, DailyMetric, Database, MetricFields, MetricSeries,
    NewTask, StoreError, Task, TaskUpdate, TrainingSummary,
};

/// Open the configured database and run one command against it
pub fn run(config: &AppConfig, command: Commands, out: &mut impl Write) -> Result<()> {
    let db = Database::open(&config.db_path, config.busy_timeout)?;
    execute(&db, command, config.json, out)
}

/// Run one command against an already open database
pub fn execute(db: &Database, command: Commands, json: bool, out: &mut impl Write) -> Result<()> {
    let mut output = Output { out, json };
    match command {
        Commands::Task(cmd) => run_task(db, cmd, &mut output),
        Commands::Metric(cmd) => run_metric(db, cmd, &mut output),
    }
}

fn run_task(db: &Database, cmd: TaskCommand, output: &mut Output<'_, impl Write>) -> Result<()> {
    let store = db.tasks();
    match cmd {
        TaskCommand::Add {
            content,
            description,
            due,
            image,
        } => {
            let new_task = NewTask {
                description,
                due_date: due,
                image_ref: image,
                ..NewTask::new(content)
            };
            let task = store.create(&new_task).map_err(report)?;
            output.task(&task)
        }
        TaskCommand::List { on } => {
            let tasks = match on {
                Some(raw) => store.list_on(parse_date(&raw)?)?,
                None => store.list()?,
            };
            output.tasks(&tasks)
        }
        TaskCommand::Show { id } => {
            let task = store.get(id).map_err(report)?;
            output.task(&task)
        }
        TaskCommand::Edit {
            id,
            content,
            description,
            due,
        } => {
            let update = TaskUpdate {
                content,
                description,
                due_date: due,
            };
            let task = store.update(id, &update).map_err(report)?;
            output.task(&task)
        }
        TaskCommand::Toggle { id } => {
            let task = store.toggle_completion(id).map_err(report)?;
            output.task(&task)
        }
        TaskCommand::Delete { id } => {
            store.delete(id).map_err(report)?;
            output.message(&format!("Task {id} deleted."))
        }
    }
}

fn run_metric(
    db: &Database,
    cmd: MetricCommand,
    output: &mut Output<'_, impl Write>,
) -> Result<()> {
    let store = db.metrics();
    match cmd {
        MetricCommand::Log {
            date,
            height,
            weight,
            body_fat,
        } => {
            let fields = MetricFields {
                height,
                weight,
                body_fat,
                ..Default::default()
            };
            if fields.is_empty() {
                anyhow::bail!("Nothing to record: pass at least one of --height, --weight, --body-fat");
            }
            let date = date.date.unwrap_or_else(today_string);
            let record = store.upsert(&date, &fields).map_err(report)?;
            output.metric(&record)
        }
        MetricCommand::Train {
            category,
            date,
            off,
        } => {
            let date = date.date.unwrap_or_else(today_string);
            let record = store
                .upsert(&date, &MetricFields::training(category, !off))
                .map_err(report)?;
            output.metric(&record)
        }
        MetricCommand::Show { date } => {
            let date = parse_date(&date.date.unwrap_or_else(today_string))?;
            match store.get(date)? {
                Some(record) => output.metric(&record),
                None => output.message(&format!("Nothing recorded for {date}.")),
            }
        }
        MetricCommand::Latest => match store.latest()? {
            Some(record) => output.metric(&record),
            None => output.message("No records."),
        },
        MetricCommand::Recent { limit } => {
            let records = store.list_recent(limit)?;
            let summary = history::training_summary(&records);
            output.recent(&records, &summary)
        }
        MetricCommand::Chart { field, limit } => {
            let records = store.list_recent(limit)?;
            output.series(&history::series(&records, field))
        }
    }
}

fn today_string() -> String {
    format_date(today())
}

/// Log expected store outcomes before handing them to anyhow
fn report(err: StoreError) -> StoreError {
    match &err {
        StoreError::NotFound(id) => warn!(id, "task not found"),
        StoreError::Validation(reason) => warn!(%reason, "rejected input"),
        StoreError::Storage(_) => {}
    }
    err
}

fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

#[derive(Serialize)]
struct RecentReport<'a> {
    records: &'a [DailyMetric],
    training: &'a TrainingSummary,
}

struct Output<'w, W: Write> {
    out: &'w mut W,
    json: bool,
}

impl<W: Write> Output<'_, W> {
    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *self.out, value).context("Failed to write JSON")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn task_line(&mut self, task: &Task) -> Result<()> {
        let mark = if task.is_completed { "x" } else { " " };
        write!(self.out, "[{mark}] #{} {} {}", task.id, task.due_date, task.content)?;
        if !task.description.is_empty() {
            write!(self.out, " - {}", task.description)?;
        }
        if let Some(image) = &task.image_ref {
            write!(self.out, " (image: {image})")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn task(&mut self, task: &Task) -> Result<()> {
        if self.json {
            return self.write_json(task);
        }
        self.task_line(task)
    }

    fn tasks(&mut self, tasks: &[Task]) -> Result<()> {
        if self.json {
            return self.write_json(tasks);
        }
        if tasks.is_empty() {
            writeln!(self.out, "No tasks.")?;
        }
        for task in tasks {
            self.task_line(task)?;
        }
        Ok(())
    }

    fn metric_line(&mut self, record: &DailyMetric) -> Result<()> {
        writeln!(
            self.out,
            "{}  height {:>6}  weight {:>6}  body fat {:>5}  upper {:<3} core {:<3} lower {:<3}",
            record.date,
            number(record.height),
            number(record.weight),
            number(record.body_fat),
            yes_no(record.train_upper),
            yes_no(record.train_core),
            yes_no(record.train_lower),
        )?;
        Ok(())
    }

    fn metric(&mut self, record: &DailyMetric) -> Result<()> {
        if self.json {
            return self.write_json(record);
        }
        self.metric_line(record)
    }

    fn recent(&mut self, records: &[DailyMetric], summary: &TrainingSummary) -> Result<()> {
        if self.json {
            return self.write_json(&RecentReport {
                records,
                training: summary,
            });
        }
        if records.is_empty() {
            writeln!(self.out, "No records.")?;
            return Ok(());
        }
        for record in records {
            self.metric_line(record)?;
        }
        writeln!(
            self.out,
            "Trained on {} of {} days (upper {}, core {}, lower {})",
            summary.active_days, summary.days, summary.upper, summary.core, summary.lower
        )?;
        Ok(())
    }

    fn series(&mut self, series: &MetricSeries) -> Result<()> {
        if self.json {
            return self.write_json(series);
        }
        if series.is_empty() {
            writeln!(self.out, "No {} values recorded.", series.field.name())?;
            return Ok(());
        }
        for point in &series.points {
            writeln!(self.out, "{}  {:.1}", point.date, point.value)?;
        }
        if let Some(change) = series.change() {
            writeln!(self.out, "Change in {}: {change:+.1}", series.field.name())?;
        }
        Ok(())
    }

    fn message(&mut self, text: &str) -> Result<()> {
        if self.json {
            return self.write_json(&serde_json::json!({ "message": text }));
        }
        writeln!(self.out, "{text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn exec(db: &Database, args: &[&str]) -> Result<String> {
        let mut argv = vec!["profit-ops"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        execute(db, cli.command, cli.json, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_task_add_and_list_text() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["task", "add", "Leg day", "--due", "2025-01-03", "-d", "squats"]).unwrap();
        exec(&db, &["task", "add", "Rest", "--due", "2025-01-01"]).unwrap();

        let listing = exec(&db, &["task", "list"]).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2025-01-01 Rest"));
        assert!(lines[1].contains("2025-01-03 Leg day - squats"));
    }

    #[test]
    fn test_task_toggle_json() {
        let db = Database::open_in_memory().unwrap();
        let created = exec(&db, &["--json", "task", "add", "Stretch"]).unwrap();
        let task: Task = serde_json::from_str(&created).unwrap();
        assert!(!task.is_completed);

        let id = task.id.to_string();
        let toggled = exec(&db, &["--json", "task", "toggle", id.as_str()]).unwrap();
        let task: Task = serde_json::from_str(&toggled).unwrap();
        assert!(task.is_completed);
    }

    #[test]
    fn test_task_delete_twice_fails() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["task", "add", "Once"]).unwrap();
        let id = db.tasks().list().unwrap()[0].id.to_string();

        assert!(exec(&db, &["task", "delete", id.as_str()]).unwrap().contains("deleted"));
        let err = exec(&db, &["task", "delete", id.as_str()]).unwrap_err();
        assert!(err.downcast_ref::<StoreError>().unwrap().is_not_found());
    }

    #[test]
    fn test_task_list_on_rejects_bad_date() {
        let db = Database::open_in_memory().unwrap();
        let err = exec(&db, &["task", "list", "--on", "tomorrow"]).unwrap_err();
        assert!(err.downcast_ref::<StoreError>().unwrap().is_validation());
    }

    #[test]
    fn test_metric_log_and_train_merge() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["metric", "log", "--date", "2025-06-01", "--weight", "70"]).unwrap();
        exec(&db, &["metric", "train", "upper", "--date", "2025-06-01"]).unwrap();

        let recent = exec(&db, &["--json", "metric", "recent"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&recent).unwrap();
        let records = value["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["weight"], 70.0);
        assert_eq!(records[0]["train_upper"], true);
        assert_eq!(value["training"]["active_days"], 1);
    }

    #[test]
    fn test_metric_log_requires_a_value() {
        let db = Database::open_in_memory().unwrap();
        assert!(exec(&db, &["metric", "log", "--date", "2025-06-01"]).is_err());
        assert!(db.metrics().list_recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_metric_show_and_latest() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(exec(&db, &["metric", "latest"]).unwrap(), "No records.\n");

        exec(&db, &["metric", "log", "--date", "2025-06-01", "--weight", "70"]).unwrap();
        exec(&db, &["metric", "train", "lower", "--date", "2025-06-03"]).unwrap();

        let latest: DailyMetric =
            serde_json::from_str(&exec(&db, &["--json", "metric", "latest"]).unwrap()).unwrap();
        assert_eq!(latest.date.to_string(), "2025-06-03");
        assert_eq!(latest.train_lower, Some(true));
        assert_eq!(latest.weight, None);

        let shown = exec(&db, &["metric", "show", "--date", "2025-06-01"]).unwrap();
        assert!(shown.starts_with("2025-06-01"));
        assert!(shown.contains("70.0"));

        let missing = exec(&db, &["metric", "show", "--date", "2025-06-02"]).unwrap();
        assert_eq!(missing, "Nothing recorded for 2025-06-02.\n");
    }

    #[test]
    fn test_metric_date_defaults_to_today() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["metric", "train", "core"]).unwrap();

        let record = db.metrics().latest().unwrap().unwrap();
        assert_eq!(record.date, today());
        assert_eq!(record.train_core, Some(true));
        assert_eq!(db.metrics().get(today()).unwrap(), Some(record));
    }

    #[test]
    fn test_metric_log_rejects_nan() {
        let db = Database::open_in_memory().unwrap();
        let err = exec(
            &db,
            &["metric", "log", "--date", "2025-06-01", "--weight", "NaN"],
        )
        .unwrap_err();
        assert!(err.downcast_ref::<StoreError>().unwrap().is_validation());
        assert!(db.metrics().list_recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_metric_chart_text() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["metric", "log", "--date", "2025-06-02", "--weight", "69.5"]).unwrap();
        exec(&db, &["metric", "log", "--date", "2025-06-01", "--weight", "70"]).unwrap();

        let chart = exec(&db, &["metric", "chart", "weight"]).unwrap();
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "2025-06-01  70.0");
        assert_eq!(lines[1], "2025-06-02  69.5");
        assert_eq!(lines[2], "Change in weight: -0.5");
    }
}
