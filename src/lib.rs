//! trk2gis - Convert particle tracking NetCDF output into GIS vector data
//!
//! Reads `x`/`y` particle position arrays on a `[time, particle]` grid,
//! subsamples them to a coarser interval, masks fill values and writes
//! either one track per particle or one point per valid sample.
//!
//! # Pipeline
//!
//! - **Loader** ([`dataset`]): coordinates, CF time axis and fill value
//! - **Downscaler** ([`downscale`]): median native timestep and integer stride
//! - **Masker** ([`mask`]): fill sentinel to NaN and joint validity
//! - **Geometry** ([`geometry`]): tracks or points with their attributes
//! - **Export** ([`export`]): format chosen by output file extension
//!
//! # Example
//!
//! ```rust,no_run
//! use trk2gis::{convert_particles, ConvertOptions, Mode};
//!
//! let options = ConvertOptions::new("run_trk.nc", "out/points.geojson", Mode::Point)
//!     .with_downscale_hours(6.0);
//!
//! convert_particles(&options)?;
//! # Ok::<(), trk2gis::error::ConvertError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod convert;
pub mod dataset;
pub mod downscale;
pub mod error;
pub mod export;
pub mod geometry;
pub mod mask;
pub mod time;

// Re-export main types for convenience
pub use config::{Mode, Task};
pub use convert::{ConvertOptions, ConvertOutcome, convert_particles};
pub use dataset::{ParticleDataset, open_dataset};
