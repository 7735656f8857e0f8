#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const FILL: f64 = -999.0;

/// Hourly particle tracking fixture, `[time, particle]` layout.
pub struct Fixture {
    pub n_times: usize,
    pub n_particles: usize,
    pub step_seconds: f64,
    /// Particles whose every position is the fill value
    pub all_fill: Vec<usize>,
    /// `_FillValue` attribute on both coordinate variables; `None` omits it
    pub fill_attribute: Option<f64>,
    /// Particles whose every position is -999 regardless of the attribute
    pub default_sentinel: Vec<usize>,
}

impl Fixture {
    pub fn new(n_times: usize, n_particles: usize) -> Self {
        Self {
            n_times,
            n_particles,
            step_seconds: 3600.0,
            all_fill: Vec::new(),
            fill_attribute: Some(FILL),
            default_sentinel: Vec::new(),
        }
    }

    pub fn with_fill_attribute(mut self, fill: Option<f64>) -> Self {
        self.fill_attribute = fill;
        self
    }

    pub fn with_default_sentinel(mut self, particles: &[usize]) -> Self {
        self.default_sentinel = particles.to_vec();
        self
    }

    /// Value stored for cells of `all_fill` particles.
    pub fn sentinel(&self) -> f64 {
        self.fill_attribute.unwrap_or(FILL)
    }

    pub fn with_all_fill(mut self, particles: &[usize]) -> Self {
        self.all_fill = particles.to_vec();
        self
    }

    fn coords(&self, base: f64) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.n_times * self.n_particles);
        for t in 0..self.n_times {
            for p in 0..self.n_particles {
                if self.all_fill.contains(&p) {
                    values.push(self.sentinel());
                } else if self.default_sentinel.contains(&p) {
                    values.push(FILL);
                } else {
                    values.push(base + p as f64 * 0.25 + t as f64 * 0.01);
                }
            }
        }
        values
    }

    /// Write the fixture as `name` inside `dir` and return its path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", self.n_times).unwrap();
        file.add_dimension("trajectory", self.n_particles).unwrap();

        let times: Vec<f64> = (0..self.n_times)
            .map(|i| i as f64 * self.step_seconds)
            .collect();
        let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
        time.put_attribute("units", "seconds since 2024-04-05 00:00:00")
            .unwrap();
        time.put_values(&times, ..).unwrap();

        for (name, base) in [
            ("particles_x_coordinate", 114.0),
            ("particles_y_coordinate", 22.0),
        ] {
            let mut var = file
                .add_variable::<f64>(name, &["time", "trajectory"])
                .unwrap();
            if let Some(fill) = self.fill_attribute {
                var.put_attribute("_FillValue", fill).unwrap();
            }
            var.put_values(&self.coords(base), ..).unwrap();
        }
        path
    }
}
