//! Plain SQLite output with OGC `geometry_columns` metadata and WKB geometries.

use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, params, types::Value as SqlValue};

use super::gpkg::quote_ident;
use super::{layer_name, remove_existing, wkb};
use crate::geometry::{CRS_EPSG, FeatureCollection, FieldKind, GeometryType, Value, WGS84_WKT};
use crate::time::format_iso;

const GEOM_COLUMN: &str = "GEOMETRY";

const METADATA_TABLES: &str = r#"
CREATE TABLE geometry_columns (
    f_table_name VARCHAR,
    f_geometry_column VARCHAR,
    geometry_type INTEGER,
    coord_dimension INTEGER,
    srid INTEGER,
    geometry_format VARCHAR
);
CREATE TABLE spatial_ref_sys (
    srid INTEGER UNIQUE,
    auth_name TEXT,
    auth_srid TEXT,
    srtext TEXT
);
"#;

fn ogc_type_code(kind: GeometryType) -> i64 {
    match kind {
        GeometryType::Point => 1,
        GeometryType::LineString => 2,
    }
}

pub fn write_sqlite(collection: &FeatureCollection, path: &Path) -> Result<()> {
    remove_existing(path)?;
    let mut conn = Connection::open(path)?;
    let table = layer_name(path);

    let tx = conn.transaction()?;
    tx.execute_batch(METADATA_TABLES)?;
    tx.execute(
        "INSERT INTO spatial_ref_sys VALUES (?1, 'EPSG', ?1, ?2)",
        params![CRS_EPSG, WGS84_WKT],
    )?;
    tx.execute(
        "INSERT INTO geometry_columns VALUES (?1, ?2, ?3, 2, ?4, 'WKB')",
        params![
            table.to_lowercase(),
            GEOM_COLUMN.to_lowercase(),
            ogc_type_code(collection.geometry_type()),
            CRS_EPSG
        ],
    )?;

    let mut columns = vec![
        "OGC_FID INTEGER PRIMARY KEY".to_string(),
        format!("{GEOM_COLUMN} BLOB"),
    ];
    for field in collection.fields() {
        let sql_type = match field.kind {
            FieldKind::Integer => "INTEGER",
            FieldKind::DateTime => "TIMESTAMP",
        };
        columns.push(format!("{} {sql_type}", quote_ident(field.name)));
    }
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({});",
        quote_ident(&table),
        columns.join(", ")
    ))?;

    {
        let names: Vec<String> = std::iter::once(GEOM_COLUMN.to_string())
            .chain(collection.fields().iter().map(|f| quote_ident(f.name)))
            .collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&table),
            names.join(", "),
            placeholders.join(", ")
        ))?;

        for feature in collection.features() {
            let mut row = Vec::with_capacity(feature.values.len() + 1);
            row.push(SqlValue::Blob(wkb::encode(&feature.geometry)));
            row.extend(feature.values.iter().map(|v| match v {
                Value::Integer(i) => SqlValue::Integer(*i),
                Value::DateTime(t) => SqlValue::Text(format_iso(t)),
            }));
            stmt.execute(rusqlite::params_from_iter(row))?;
        }
    }

    tx.commit()?;
    Ok(())
}
