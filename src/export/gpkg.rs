//! GeoPackage 1.2 output: one feature table named after the file stem.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, types::Value as SqlValue};

use super::{layer_name, remove_existing, wkb};
use crate::geometry::{CRS_EPSG, FeatureCollection, FieldKind, Value, WGS84_WKT};

/// "GPKG" as a big-endian integer
const APPLICATION_ID: i32 = 0x4750_4B47;
const USER_VERSION: i32 = 10200;
const GEOM_COLUMN: &str = "geom";

const CORE_TABLES: &str = r#"
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
);
INSERT INTO gpkg_spatial_ref_sys VALUES
    ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', 'undefined cartesian coordinate reference system'),
    ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', 'undefined geographic coordinate reference system');
"#;

/// GeoPackage DATETIME text form.
fn gpkg_datetime(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn write_geopackage(collection: &FeatureCollection, path: &Path) -> Result<()> {
    remove_existing(path)?;
    let mut conn = Connection::open(path)?;
    conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    conn.pragma_update(None, "user_version", USER_VERSION)?;

    let table = layer_name(path);
    let tx = conn.transaction()?;
    tx.execute_batch(CORE_TABLES)?;
    tx.execute(
        "INSERT INTO gpkg_spatial_ref_sys VALUES ('WGS 84 geodetic', ?1, 'EPSG', ?1, ?2, 'longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid')",
        params![CRS_EPSG, WGS84_WKT],
    )?;

    let mut columns = vec![
        "fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string(),
        format!("{GEOM_COLUMN} {}", collection.geometry_type().ogc_name()),
    ];
    for field in collection.fields() {
        let sql_type = match field.kind {
            FieldKind::Integer => "INTEGER",
            FieldKind::DateTime => "DATETIME",
        };
        columns.push(format!("{} {sql_type}", quote_ident(field.name)));
    }
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({});",
        quote_ident(&table),
        columns.join(", ")
    ))?;

    let [min_x, min_y, max_x, max_y] = collection.bounds();
    tx.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id) VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6)",
        params![table, min_x, min_y, max_x, max_y, CRS_EPSG],
    )?;
    tx.execute(
        "INSERT INTO gpkg_geometry_columns VALUES (?1, ?2, ?3, ?4, 0, 0)",
        params![table, GEOM_COLUMN, collection.geometry_type().ogc_name(), CRS_EPSG],
    )?;

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
            row.push(SqlValue::Blob(wkb::gpkg_blob(&feature.geometry, CRS_EPSG)));
            row.extend(feature.values.iter().map(|v| match v {
                Value::Integer(i) => SqlValue::Integer(*i),
                Value::DateTime(t) => SqlValue::Text(gpkg_datetime(t)),
            }));
            stmt.execute(rusqlite::params_from_iter(row))?;
        }
    }

    tx.commit()?;
    Ok(())
}
