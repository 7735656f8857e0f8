use std::path::PathBuf;

use crate::config::{DEFAULT_DOWNSCALE_HOURS, Mode, Task};
use crate::dataset::{ParticleDataset, open_dataset};
use crate::downscale::downscale;
use crate::error::ConvertError;
use crate::export::{self, Driver};
use crate::geometry::{FeatureCollection, line, point};
use crate::mask::{self, FillMatcher};

/// Options for converting a particle tracking NetCDF file to GIS features
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Path to the input NetCDF file
    pub input_path: PathBuf,
    /// Path to the output file; the extension selects the format
    pub output_path: PathBuf,
    /// Points or tracks
    pub mode: Mode,
    /// Target sampling interval in hours
    pub downscale_hours: f64,
    /// Absolute tolerance for fill-value detection, exact match when `None`
    pub fill_tolerance: Option<f64>,
}

impl ConvertOptions {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            mode,
            downscale_hours: DEFAULT_DOWNSCALE_HOURS,
            fill_tolerance: None,
        }
    }

    pub fn with_downscale_hours(mut self, hours: f64) -> Self {
        self.downscale_hours = hours;
        self
    }

    pub fn with_fill_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.fill_tolerance = tolerance;
        self
    }
}

impl From<&Task> for ConvertOptions {
    fn from(task: &Task) -> Self {
        Self {
            input_path: task.input.clone(),
            output_path: task.output.clone(),
            mode: task.mode,
            downscale_hours: task.downscale_hours,
            fill_tolerance: task.fill_tolerance,
        }
    }
}

/// What a successful conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertOutcome {
    /// `features` geometries were written with `driver`
    Written { features: usize, driver: Driver },
    /// Nothing valid survived masking; no file was written
    NoOutput,
}

/// Downscale, mask and build geometries for an already loaded dataset.
///
/// Returns `None` when no valid geometry remains.
pub fn build_collection(
    dataset: &ParticleDataset,
    mode: Mode,
    downscale_hours: f64,
    fill_tolerance: Option<f64>,
) -> Option<FeatureCollection> {
    let sub = downscale(dataset, downscale_hours);
    let matcher = FillMatcher::with_tolerance(dataset.fill_value, fill_tolerance);
    let masked = mask::apply(sub.x, sub.y, matcher);

    match mode {
        Mode::Line => line::build_tracks(&masked, &sub.times),
        Mode::Point => point::build_points(&masked, &sub.times),
    }
}

/// Convert one NetCDF file into points or tracks
///
/// # Arguments
///
/// * `options` - Conversion options
///
/// # Returns
///
/// [`ConvertOutcome::NoOutput`] when every sample is masked out; this is not
/// an error and leaves the output path untouched.
///
/// # Example
///
/// ```rust,no_run
/// use trk2gis::{convert_particles, ConvertOptions, Mode};
///
/// let options = ConvertOptions::new("marine-refuse_trk.nc", "out/tracks.gpkg", Mode::Line)
///     .with_downscale_hours(3.0);
/// convert_particles(&options)?;
/// # Ok::<(), trk2gis::error::ConvertError>(())
/// ```
pub fn convert_particles(options: &ConvertOptions) -> Result<ConvertOutcome, ConvertError> {
    let dataset = open_dataset(&options.input_path)?;

    let Some(collection) = build_collection(
        &dataset,
        options.mode,
        options.downscale_hours,
        options.fill_tolerance,
    ) else {
        match options.mode {
            Mode::Line => tracing::warn!("no valid particle tracks found, skipping export"),
            Mode::Point => tracing::warn!("no valid points found, skipping export"),
        }
        return Ok(ConvertOutcome::NoOutput);
    };

    let descriptor =
        export::export(&collection, &options.output_path).map_err(ConvertError::Export)?;

    Ok(ConvertOutcome::Written {
        features: collection.len(),
        driver: descriptor.driver,
    })
}
