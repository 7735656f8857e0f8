//! Attributed geometry collections and the two builders that produce them.
//!
//! - [`line`]: one polyline per particle (`par_id`, `time_start`, `time_end`)
//! - [`point`]: one point per valid sample (`par_id`, `time`)
//!
//! Both builders return `None` when nothing valid remains; callers treat that
//! as a no-op export.

pub mod line;
pub mod point;

use chrono::{DateTime, Utc};
use geo_types::{LineString, Point};

use crate::time::format_plain;

/// All outputs are geographic WGS84.
pub const CRS_EPSG: i32 = 4326;

/// OGC WKT for EPSG:4326, as written next to shapefiles and into SRS tables.
pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    DateTime,
}

/// Attribute column description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::DateTime,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Text form for backends without a native timestamp type.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Integer(v) => v.to_string(),
            Value::DateTime(t) => format_plain(t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    LineString,
}

impl GeometryType {
    /// OGC simple-feature type name.
    pub fn ogc_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
        }
    }

    /// Vertices in order as `(x, y)`.
    pub fn coords(&self) -> Vec<(f64, f64)> {
        match self {
            Geometry::Point(p) => vec![(p.x(), p.y())],
            Geometry::LineString(ls) => ls.coords().map(|c| (c.x, c.y)).collect(),
        }
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn bounds(&self) -> [f64; 4] {
        envelope(self.coords().into_iter())
    }
}

fn envelope(coords: impl Iterator<Item = (f64, f64)>) -> [f64; 4] {
    coords.fold(
        [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
        |[x0, y0, x1, y1], (x, y)| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    /// One value per schema field, in schema order
    pub values: Vec<Value>,
}

/// Immutable set of features sharing a schema and geometry type.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    fields: Vec<Field>,
    geometry_type: GeometryType,
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Returns `None` for an empty feature list.
    ///
    /// Panics in debug builds if a feature does not match the schema.
    pub fn new(
        fields: Vec<Field>,
        geometry_type: GeometryType,
        features: Vec<Feature>,
    ) -> Option<Self> {
        if features.is_empty() {
            return None;
        }
        debug_assert!(features.iter().all(|f| {
            f.values.len() == fields.len() && f.geometry.geometry_type() == geometry_type
        }));
        Some(Self {
            fields,
            geometry_type,
            features,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Envelope of every feature, `[min_x, min_y, max_x, max_y]`.
    pub fn bounds(&self) -> [f64; 4] {
        envelope(self.features.iter().flat_map(|f| f.geometry.coords()))
    }

    pub fn has_datetime_fields(&self) -> bool {
        self.fields.iter().any(|f| f.kind == FieldKind::DateTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_collection_basics() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap();
        let features = vec![
            Feature {
                geometry: Geometry::Point(Point::new(114.1, 22.3)),
                values: vec![Value::Integer(0), Value::DateTime(t)],
            },
            Feature {
                geometry: Geometry::Point(Point::new(113.9, 22.5)),
                values: vec![Value::Integer(1), Value::DateTime(t)],
            },
        ];
        let fields = vec![Field::integer("par_id"), Field::datetime("time")];
        let fc = FeatureCollection::new(fields.clone(), GeometryType::Point, features).unwrap();
        assert_eq!(fc.len(), 2);
        assert!(fc.has_datetime_fields());
        assert_eq!(fc.bounds(), [113.9, 22.3, 114.1, 22.5]);
        assert_eq!(fc.features()[0].values[1].to_plain_string(), "2024-01-01 06:30:00");

        assert!(FeatureCollection::new(fields, GeometryType::Point, vec![]).is_none());
    }
}
