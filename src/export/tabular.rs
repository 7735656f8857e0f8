//! Attribute-only outputs (CSV, Excel). Geometry is not written.

use std::path::Path;

use anyhow::Result;
use rust_xlsxwriter::Workbook;

use crate::geometry::{FeatureCollection, Value};

pub fn write_csv(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(collection.fields().iter().map(|f| f.name))?;
    for feature in collection.features() {
        wtr.write_record(feature.values.iter().map(Value::to_plain_string))?;
    }
    wtr.flush()?;
    tracing::info!("CSV saved.");
    Ok(())
}

pub fn write_xlsx(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, field) in collection.fields().iter().enumerate() {
        sheet.write_string(0, col as u16, field.name)?;
    }
    for (row, feature) in collection.features().iter().enumerate() {
        let row = u32::try_from(row + 1)?;
        for (col, value) in feature.values.iter().enumerate() {
            match value {
                Value::Integer(v) => sheet.write_number(row, col as u16, *v as f64)?,
                Value::DateTime(_) => sheet.write_string(row, col as u16, value.to_plain_string())?,
            };
        }
    }

    workbook.save(path)?;
    tracing::info!("Excel saved.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::*;
    use tempfile::tempdir;

    #[test]
    fn test_csv_has_no_geometry_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        write_csv(&sample_tracks(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "par_id,time_start,time_end");
        assert_eq!(lines[1], "1,2024-04-05 00:00:00,2024-04-05 06:00:00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_xlsx_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.xlsx");
        write_xlsx(&sample_points(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }
}
