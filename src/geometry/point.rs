//! Timestamped particle positions: one Point per valid (time, particle) cell.

use chrono::{DateTime, Utc};
use geo_types::Point;

use super::{Feature, FeatureCollection, Field, Geometry, GeometryType, Value};
use crate::mask::Masked;

pub const FIELDS: [Field; 2] = [Field::integer("par_id"), Field::datetime("time")];

/// Enumerate valid cells in time-major order.
///
/// Returns `None` when no cell is valid.
pub fn build_points(masked: &Masked, times: &[DateTime<Utc>]) -> Option<FeatureCollection> {
    let features: Vec<Feature> = masked
        .valid
        .indexed_iter()
        .filter(|(_, valid)| **valid)
        .map(|((t, pid), _)| Feature {
            geometry: Geometry::Point(Point::new(masked.x[[t, pid]], masked.y[[t, pid]])),
            values: vec![Value::Integer(pid as i64), Value::DateTime(times[t])],
        })
        .collect();

    tracing::info!("preparing {} valid point records", features.len());
    FeatureCollection::new(FIELDS.to_vec(), GeometryType::Point, features)
}
