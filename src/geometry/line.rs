//! Particle tracks: one LineString per particle.

use chrono::{DateTime, Utc};
use geo_types::LineString;

use super::{Feature, FeatureCollection, Field, Geometry, GeometryType, Value};
use crate::mask::Masked;

pub const FIELDS: [Field; 3] = [
    Field::integer("par_id"),
    Field::datetime("time_start"),
    Field::datetime("time_end"),
];

/// Build one track per particle from its valid samples, in time order.
///
/// Particles with fewer than two valid samples are dropped. Returns `None`
/// when no particle yields a track.
pub fn build_tracks(masked: &Masked, times: &[DateTime<Utc>]) -> Option<FeatureCollection> {
    let mut features = Vec::new();

    for (pid, (xs, ys)) in masked
        .x
        .columns()
        .into_iter()
        .zip(masked.y.columns())
        .enumerate()
    {
        if xs.iter().all(|v| v.is_nan()) || ys.iter().all(|v| v.is_nan()) {
            continue;
        }

        let mut coords = Vec::new();
        let mut first = None;
        let mut last = None;
        for ((&x, &y), &t) in xs.iter().zip(ys.iter()).zip(times) {
            if x.is_finite() && y.is_finite() {
                coords.push((x, y));
                first.get_or_insert(t);
                last = Some(t);
            }
        }

        // need at least two points to form a line
        if coords.len() > 1
            && let (Some(start), Some(end)) = (first, last)
        {
            features.push(Feature {
                geometry: Geometry::LineString(LineString::from(coords)),
                values: vec![
                    Value::Integer(pid as i64),
                    Value::DateTime(start),
                    Value::DateTime(end),
                ],
            });
        }
    }

    tracing::info!("created {} valid particle tracks", features.len());
    FeatureCollection::new(FIELDS.to_vec(), GeometryType::LineString, features)
}
