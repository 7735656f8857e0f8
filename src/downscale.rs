//! Temporal downscaling: pick an integer stride from the native timestep and
//! keep every k-th record along the time axis.

use chrono::{DateTime, Utc};
use ndarray::{Array2, s};
use ordered_float::OrderedFloat;

use crate::dataset::ParticleDataset;
use crate::time::{round_to_second, seconds_between};

/// Result of stride selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stride {
    /// Median spacing of the input time axis, in seconds (0 when undefined)
    pub native_seconds: f64,
    /// Keep every `step`-th record, starting at index 0
    pub step: usize,
}

/// Downsampled coordinates. Timestamps are rounded to whole seconds.
#[derive(Debug, Clone)]
pub struct Downscaled {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub times: Vec<DateTime<Utc>>,
    pub stride: Stride,
}

impl Downscaled {
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn n_particles(&self) -> usize {
        self.x.ncols()
    }
}

/// Median of the consecutive differences of `times`, in seconds.
///
/// Returns `None` for axes shorter than two entries.
pub fn median_timestep(times: &[DateTime<Utc>]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    let mut diffs: Vec<OrderedFloat<f64>> = times
        .windows(2)
        .map(|w| OrderedFloat(seconds_between(w[0], w[1])))
        .collect();
    diffs.sort_unstable();

    let n = diffs.len();
    let mid = n / 2;
    let median = if n % 2 == 0 {
        (diffs[mid - 1].0 + diffs[mid].0) / 2.0
    } else {
        diffs[mid].0
    };
    Some(median)
}

/// stride = max(1, round(desired / native)), ties to even.
///
/// A missing, zero, negative or non-finite native step yields a stride of 1.
pub fn compute_stride(times: &[DateTime<Utc>], downscale_hours: f64) -> Stride {
    let desired_seconds = downscale_hours * 3600.0;
    let native_seconds = median_timestep(times).unwrap_or(0.0);

    let step = if native_seconds.is_finite() && native_seconds > 0.0 {
        let ratio = (desired_seconds / native_seconds).round_ties_even();
        // saturates for huge ratios; `downscale` clamps to the axis length
        if ratio >= 1.0 {
            ratio as usize
        } else {
            1
        }
    } else {
        1
    };

    Stride {
        native_seconds: if native_seconds.is_finite() { native_seconds } else { 0.0 },
        step,
    }
}

/// Number of records kept from an axis of length `n` at stride `step`.
pub fn retained_len(n: usize, step: usize) -> usize {
    n.div_ceil(step.max(1))
}

/// Subsample the dataset along time with the stride for `downscale_hours`.
///
/// A stride longer than the time axis keeps only the first record.
pub fn downscale(dataset: &ParticleDataset, downscale_hours: f64) -> Downscaled {
    let mut stride = compute_stride(&dataset.times, downscale_hours);
    stride.step = stride.step.min(dataset.n_times().max(1));
    tracing::info!(
        "native timestep ≈ {:.1}s → downscaling every {}-th record (~{:.2} hr interval)",
        stride.native_seconds,
        stride.step,
        downscale_hours
    );

    let step = isize::try_from(stride.step).unwrap_or(isize::MAX);
    let x = dataset.x.slice(s![..;step, ..]).to_owned();
    let y = dataset.y.slice(s![..;step, ..]).to_owned();
    let times: Vec<DateTime<Utc>> = dataset
        .times
        .iter()
        .step_by(stride.step)
        .map(|t| round_to_second(*t))
        .collect();

    tracing::info!(
        "downscaled dimensions: {} timesteps × {} particles",
        times.len(),
        x.ncols()
    );

    Downscaled { x, y, times, stride }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn hourly(n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + TimeDelta::hours(i as i64)).collect()
    }

    #[test]
    fn test_median_timestep() {
        assert_eq!(median_timestep(&hourly(1)), None);
        assert_eq!(median_timestep(&hourly(5)), Some(3600.0));

        // one long gap does not move the median
        let mut times = hourly(4);
        times.push(times[3] + TimeDelta::hours(10));
        assert_eq!(median_timestep(&times), Some(3600.0));
    }

    #[test]
    fn test_stride_hourly_to_three_hours() {
        let times = hourly(100);
        let stride = compute_stride(&times, 3.0);
        assert_eq!(stride.step, 3);
        assert_eq!(stride.native_seconds, 3600.0);
        assert_eq!(retained_len(100, stride.step), 34);
    }

    #[test]
    fn test_stride_never_below_one() {
        let times = hourly(10);
        assert_eq!(compute_stride(&times, 0.1).step, 1);
        assert_eq!(compute_stride(&times, 1.0).step, 1);
        // exact halves round to the even stride
        assert_eq!(compute_stride(&times, 2.5).step, 2);
        assert_eq!(compute_stride(&times, 3.5).step, 4);
        assert_eq!(compute_stride(&times, 2.6).step, 3);
    }

    #[test]
    fn test_degenerate_axes() {
        let single = hourly(1);
        assert_eq!(compute_stride(&single, 3.0).step, 1);

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let flat = vec![t0; 5];
        let stride = compute_stride(&flat, 3.0);
        assert_eq!(stride.step, 1);
        assert_eq!(stride.native_seconds, 0.0);
    }

    #[test]
    fn test_huge_interval_keeps_first_record() {
        let times = hourly(5);
        let x = Array2::from_shape_fn((5, 2), |(t, p)| (t * 10 + p) as f64);
        let y = x.mapv(|v| v + 0.5);
        let ds = ParticleDataset::new(x, y, times.clone(), -999.0).unwrap();

        for hours in [1e6, 1e20, f64::MAX] {
            let out = downscale(&ds, hours);
            assert_eq!(out.stride.step, 5);
            assert_eq!(out.n_times(), 1);
            assert_eq!(out.x.nrows(), 1);
            assert_eq!(out.y.nrows(), 1);
            assert_eq!(out.times, vec![times[0]]);
            assert_eq!(out.x[[0, 1]], 1.0);
            assert_eq!(out.y[[0, 0]], 0.5);
        }
    }

    #[test]
    fn test_retained_len_matches_ceil() {
        for n in 2..60 {
            for step in 1..8 {
                let kept = (0..n).step_by(step).count();
                assert_eq!(retained_len(n, step), kept);
            }
        }
    }

    #[test]
    fn test_downscale_slices_all_arrays() {
        let times = hourly(7);
        let x = Array2::from_shape_fn((7, 2), |(t, p)| (t * 10 + p) as f64);
        let y = x.mapv(|v| -v);
        let ds = ParticleDataset::new(x, y, times.clone(), -999.0).unwrap();

        let out = downscale(&ds, 3.0);
        assert_eq!(out.stride.step, 3);
        assert_eq!(out.n_times(), 3);
        assert_eq!(out.n_particles(), 2);
        assert_eq!(out.times, vec![times[0], times[3], times[6]]);
        assert_eq!(out.x[[1, 1]], 31.0);
        assert_eq!(out.y[[2, 0]], -60.0);
    }
}
