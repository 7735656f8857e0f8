//! Loader for particle tracking NetCDF output.
//!
//! Expects `particles_x_coordinate` and `particles_y_coordinate` shaped
//! `[time, particle]` and a CF-encoded `time` axis.

use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use netcdf::AttributeValue;

use crate::error::DatasetError;
use crate::time::decode_cf_times;

pub const X_VAR: &str = "particles_x_coordinate";
pub const Y_VAR: &str = "particles_y_coordinate";
pub const TIME_VAR: &str = "time";

/// Sentinel used when the x variable carries no `_FillValue` attribute.
pub const DEFAULT_FILL_VALUE: f64 = -999.0;

/// Raw particle coordinates with their time axis.
#[derive(Debug, Clone)]
pub struct ParticleDataset {
    /// Longitudes, `[time, particle]`
    pub x: Array2<f64>,
    /// Latitudes, `[time, particle]`
    pub y: Array2<f64>,
    pub times: Vec<DateTime<Utc>>,
    pub fill_value: f64,
}

impl ParticleDataset {
    /// Build a dataset, checking that both coordinate arrays and the time
    /// axis agree on shape.
    pub fn new(
        x: Array2<f64>,
        y: Array2<f64>,
        times: Vec<DateTime<Utc>>,
        fill_value: f64,
    ) -> Result<Self, DatasetError> {
        if x.dim() != y.dim() {
            return Err(DatasetError::Shape(format!(
                "{X_VAR} is {:?} but {Y_VAR} is {:?}",
                x.dim(),
                y.dim()
            )));
        }
        if x.nrows() != times.len() {
            return Err(DatasetError::Shape(format!(
                "coordinates have {} timesteps but {TIME_VAR} has {}",
                x.nrows(),
                times.len()
            )));
        }
        Ok(Self {
            x,
            y,
            times,
            fill_value,
        })
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn n_particles(&self) -> usize {
        self.x.ncols()
    }
}

/// Open `path` and read coordinates, time axis and fill value.
///
/// The NetCDF handle is released before returning, on success or error.
pub fn open_dataset(path: &Path) -> Result<ParticleDataset, DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = netcdf::open(path)?;

    let x = read_2d_f64(&file, X_VAR, path)?;
    let y = read_2d_f64(&file, Y_VAR, path)?;
    let times = read_time_axis(&file, path)?;
    let fill_value = read_fill_value(&file, X_VAR, path)?;

    tracing::info!(
        file = %path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
        timesteps = times.len(),
        particles = x.ncols(),
        fill_value,
        "loaded NetCDF"
    );

    ParticleDataset::new(x, y, times, fill_value)
}

fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, DatasetError> {
    file.variable(name).ok_or_else(|| DatasetError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

fn read_2d_f64(file: &netcdf::File, name: &str, path: &Path) -> Result<Array2<f64>, DatasetError> {
    let var = variable(file, name, path)?;
    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(DatasetError::DimensionMismatch {
            name: name.to_string(),
            expected: 2,
            got: dims.len(),
        });
    }
    let shape = (dims[0].len(), dims[1].len());
    let data = var.get_values::<f64, _>(..)?;
    Array2::from_shape_vec(shape, data).map_err(|e| DatasetError::Shape(format!("{name}: {e}")))
}

fn read_time_axis(file: &netcdf::File, path: &Path) -> Result<Vec<DateTime<Utc>>, DatasetError> {
    let var = variable(file, TIME_VAR, path)?;
    if var.dimensions().len() != 1 {
        return Err(DatasetError::DimensionMismatch {
            name: TIME_VAR.to_string(),
            expected: 1,
            got: var.dimensions().len(),
        });
    }
    let offsets = var.get_values::<f64, _>(..)?;

    let units = match var.attribute_value("units") {
        Some(Ok(AttributeValue::Str(s))) => s,
        Some(Ok(other)) => {
            return Err(DatasetError::InvalidTime {
                reason: format!("'units' attribute is not a string: {other:?}"),
            });
        }
        Some(Err(e)) => return Err(e.into()),
        None => {
            return Err(DatasetError::InvalidTime {
                reason: format!("time variable '{TIME_VAR}' has no 'units' attribute"),
            });
        }
    };

    decode_cf_times(&offsets, &units)
}

/// `_FillValue` of `name`, or [`DEFAULT_FILL_VALUE`] when absent or not numeric.
fn read_fill_value(file: &netcdf::File, name: &str, path: &Path) -> Result<f64, DatasetError> {
    let var = variable(file, name, path)?;
    let Some(attr) = var.attribute_value("_FillValue") else {
        return Ok(DEFAULT_FILL_VALUE);
    };
    let attr = attr?;
    match fill_from_attribute(&attr) {
        Some(v) => Ok(v),
        None => {
            tracing::warn!(
                "{name}: unsupported _FillValue {attr:?}, using {DEFAULT_FILL_VALUE}"
            );
            Ok(DEFAULT_FILL_VALUE)
        }
    }
}

fn fill_from_attribute(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Float(v) => Some(f64::from(*v)),
        AttributeValue::Longlong(v) => Some(*v as f64),
        AttributeValue::Ulonglong(v) => Some(*v as f64),
        AttributeValue::Int(v) => Some(f64::from(*v)),
        AttributeValue::Uint(v) => Some(f64::from(*v)),
        AttributeValue::Short(v) => Some(f64::from(*v)),
        AttributeValue::Ushort(v) => Some(f64::from(*v)),
        AttributeValue::Schar(v) => Some(f64::from(*v)),
        AttributeValue::Uchar(v) => Some(f64::from(*v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|f| f64::from(*f)),
        AttributeValue::Longlongs(v) => v.first().map(|i| *i as f64),
        AttributeValue::Ulonglongs(v) => v.first().map(|i| *i as f64),
        AttributeValue::Ints(v) => v.first().map(|i| f64::from(*i)),
        AttributeValue::Uints(v) => v.first().map(|i| f64::from(*i)),
        AttributeValue::Shorts(v) => v.first().map(|i| f64::from(*i)),
        AttributeValue::Ushorts(v) => v.first().map(|i| f64::from(*i)),
        AttributeValue::Schars(v) => v.first().map(|i| f64::from(*i)),
        AttributeValue::Uchars(v) => v.first().map(|i| f64::from(*i)),
        _ => None,
    }
}
