//! Batch configuration: the JSON task file and per-task validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, TaskError};

/// Output geometry kind produced by a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One point per valid (particle, timestep) pair
    Point,
    /// One polyline per particle
    Line,
}

impl FromStr for Mode {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(Mode::Point),
            "line" => Ok(Mode::Line),
            _ => Err(TaskError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Point => write!(f, "point"),
            Mode::Line => write!(f, "line"),
        }
    }
}

/// Shape of the top-level JSON document.
///
/// Variant order matters for the untagged decode: an object carrying a
/// `tasks` array is a wrapper, any other object is a single task.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ConfigFile {
    List(Vec<Value>),
    Wrapped { tasks: Vec<Value> },
    Single(serde_json::Map<String, Value>),
    Other(Value),
}

impl ConfigFile {
    /// Flatten into the raw task entries, in file order.
    pub fn into_entries(self) -> Vec<Value> {
        match self {
            ConfigFile::Wrapped { tasks } => tasks,
            ConfigFile::List(tasks) => tasks,
            ConfigFile::Single(task) => vec![Value::Object(task)],
            ConfigFile::Other(value) => {
                tracing::warn!("config root is neither an object nor an array ({value}); no tasks");
                Vec::new()
            }
        }
    }
}

/// Read and decode the JSON task file at `path`.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<ConfigFile, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default)]
    input_nc: Option<String>,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    downscale_hour: Option<f64>,
    #[serde(default)]
    fill_tolerance: Option<f64>,
}

/// A validated conversion task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Input NetCDF file
    pub input: PathBuf,
    /// Output file; its extension selects the export format
    pub output: PathBuf,
    pub mode: Mode,
    /// Requested sampling interval in hours
    pub downscale_hours: f64,
    /// Absolute tolerance for fill-value detection (`None` = exact match)
    pub fill_tolerance: Option<f64>,
}

pub const DEFAULT_DOWNSCALE_HOURS: f64 = 1.0;

impl Task {
    /// Validate one raw task entry from the config file.
    pub fn from_value(value: &Value) -> Result<Self, TaskError> {
        if !value.is_object() {
            return Err(TaskError::NotAnObject);
        }
        let raw: RawTask =
            RawTask::deserialize(value).map_err(|e| TaskError::Malformed(e.to_string()))?;

        let input = raw
            .input_nc
            .filter(|s| !s.is_empty())
            .ok_or(TaskError::MissingField { field: "input_nc" })?;
        let output = raw
            .output_path
            .filter(|s| !s.is_empty())
            .ok_or(TaskError::MissingField {
                field: "output_path",
            })?;

        let mode = match raw.mode {
            Some(m) => m.parse()?,
            None => Mode::Point,
        };

        let downscale_hours = raw.downscale_hour.unwrap_or(DEFAULT_DOWNSCALE_HOURS);
        if !(downscale_hours.is_finite() && downscale_hours > 0.0) {
            return Err(TaskError::InvalidDownscale(downscale_hours));
        }

        if let Some(tol) = raw.fill_tolerance
            && !(tol.is_finite() && tol >= 0.0)
        {
            return Err(TaskError::InvalidTolerance(tol));
        }

        Ok(Task {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            mode,
            downscale_hours,
            fill_tolerance: raw.fill_tolerance,
        })
    }
}
