//! ESRI Shapefile output (.shp/.shx/.dbf plus a .prj).
//!
//! dBase has no timestamp type, so datetime columns are written as text.

use std::path::Path;

use anyhow::{Result, anyhow};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polyline};

use crate::geometry::{FeatureCollection, FieldKind, Geometry, Value};

const ESRI_WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// dBase field widths
const INTEGER_WIDTH: u8 = 10;
const DATETIME_WIDTH: u8 = 24;

pub fn write_shapefile(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let mut table = TableWriterBuilder::new();
    for field in collection.fields() {
        let name = FieldName::try_from(field.name)
            .map_err(|e| anyhow!("invalid dBase field name '{}': {:?}", field.name, e))?;
        table = match field.kind {
            FieldKind::Integer => table.add_numeric_field(name, INTEGER_WIDTH, 0),
            FieldKind::DateTime => table.add_character_field(name, DATETIME_WIDTH),
        };
    }

    {
        let mut writer = shapefile::Writer::from_path(path, table)?;
        for feature in collection.features() {
            let mut record = Record::default();
            for (field, value) in collection.fields().iter().zip(&feature.values) {
                let cell = match value {
                    Value::Integer(v) => FieldValue::Numeric(Some(*v as f64)),
                    Value::DateTime(_) => FieldValue::Character(Some(value.to_plain_string())),
                };
                record.insert(field.name.to_string(), cell);
            }

            match &feature.geometry {
                Geometry::Point(p) => {
                    writer.write_shape_and_record(&Point::new(p.x(), p.y()), &record)?
                }
                Geometry::LineString(ls) => {
                    let points: Vec<Point> = ls.coords().map(|c| Point::new(c.x, c.y)).collect();
                    writer.write_shape_and_record(&Polyline::new(points), &record)?
                }
            }
        }
        // headers are finalised when the writer is dropped
    }

    std::fs::write(path.with_extension("prj"), ESRI_WGS84_PRJ)?;
    std::fs::write(path.with_extension("cpg"), "UTF-8")?;
    Ok(())
}
