//! Sequential execution of the tasks listed in a config file.
//!
//! A task that cannot run is logged and recorded, and the batch moves on.
//! Only configuration loading is fatal, which happens before this module.

use std::path::PathBuf;

use prettytable::{Table, row};
use serde_json::Value;

use crate::config::{Mode, Task};
use crate::convert::{ConvertOptions, ConvertOutcome, convert_particles};
use crate::error::ConvertError;
use crate::export::Driver;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Written { features: usize, driver: Driver },
    /// Ran to completion but nothing valid was left to export
    NoOutput,
    /// Rejected before any output was attempted
    Skipped(String),
    /// The export itself failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    /// 1-based position in the config file
    pub index: usize,
    pub mode: Option<Mode>,
    pub output: Option<PathBuf>,
    pub outcome: TaskOutcome,
}

/// Validate and run one task entry. Never panics on bad input.
pub fn run_task(index: usize, entry: &Value) -> TaskReport {
    let task = match Task::from_value(entry) {
        Ok(task) => task,
        Err(e) => {
            tracing::error!("task {index}: {e}");
            return TaskReport {
                index,
                mode: None,
                output: None,
                outcome: TaskOutcome::Skipped(e.to_string()),
            };
        }
    };

    tracing::info!(
        "starting task {index}: {} -> {} ({})",
        task.input.display(),
        task.output.display(),
        task.mode
    );

    let options = ConvertOptions::from(&task);
    let outcome = match convert_particles(&options) {
        Ok(ConvertOutcome::Written { features, driver }) => {
            TaskOutcome::Written { features, driver }
        }
        Ok(ConvertOutcome::NoOutput) => TaskOutcome::NoOutput,
        Err(ConvertError::Dataset(e)) => {
            tracing::error!("task {index}: {e}");
            TaskOutcome::Skipped(e.to_string())
        }
        Err(ConvertError::Export(e)) => {
            tracing::error!("task {index}: failed to save {}: {e:?}", task.output.display());
            TaskOutcome::Failed(format!("{e:#}"))
        }
    };

    TaskReport {
        index,
        mode: Some(task.mode),
        output: Some(task.output),
        outcome,
    }
}

/// Run every entry in order; one failing task does not stop the rest.
pub fn run_batch(entries: &[Value]) -> Vec<TaskReport> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| run_task(i + 1, entry))
        .collect()
}

fn describe(outcome: &TaskOutcome) -> (String, String) {
    match outcome {
        TaskOutcome::Written { features, driver } => {
            ("written".into(), format!("{features} features ({})", driver.name()))
        }
        TaskOutcome::NoOutput => ("no output".into(), "no valid geometry".into()),
        TaskOutcome::Skipped(reason) => ("skipped".into(), reason.clone()),
        TaskOutcome::Failed(reason) => ("failed".into(), reason.clone()),
    }
}

pub fn summary_table(reports: &[TaskReport]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "mode", "output", "status", "detail"]);
    for report in reports {
        let (status, detail) = describe(&report.outcome);
        let mode = report.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".into());
        let output = report
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(row![report.index, mode, output, status, detail]);
    }
    table
}

pub fn print_summary(reports: &[TaskReport]) {
    if !reports.is_empty() {
        summary_table(reports).printstd();
    }
    tracing::info!("all tasks completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_entries_are_skipped() {
        let entries = vec![
            json!({"output_path": "a.shp", "mode": "point"}),
            json!({"input_nc": "a.nc", "output_path": "a.shp", "mode": "polygon"}),
            json!(42),
        ];
        let reports = run_batch(&entries);

        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            reports[0].outcome,
            TaskOutcome::Skipped("task missing 'input_nc'".into())
        );
        assert!(matches!(&reports[1].outcome, TaskOutcome::Skipped(r) if r.contains("polygon")));
        assert!(matches!(reports[2].outcome, TaskOutcome::Skipped(_)));
        assert!(reports.iter().all(|r| r.mode.is_none()));
    }

    #[test]
    fn test_missing_input_file_is_skipped() {
        let entry = json!({
            "input_nc": "does/not/exist.nc",
            "output_path": "out.gpkg",
            "mode": "line"
        });
        let report = run_task(1, &entry);
        assert_eq!(report.mode, Some(Mode::Line));
        assert!(matches!(&report.outcome, TaskOutcome::Skipped(r) if r.contains("not found")));
    }

    #[test]
    fn test_summary_has_one_row_per_task() {
        let reports = vec![
            TaskReport {
                index: 1,
                mode: Some(Mode::Point),
                output: Some("a.csv".into()),
                outcome: TaskOutcome::Written {
                    features: 12,
                    driver: Driver::Csv,
                },
            },
            TaskReport {
                index: 2,
                mode: None,
                output: None,
                outcome: TaskOutcome::Skipped("task missing 'mode'".into()),
            },
        ];
        let table = summary_table(&reports);
        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("12 features (CSV)"));
        assert!(rendered.contains("task missing 'mode'"));
    }
}
