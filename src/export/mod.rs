//! Export of feature collections, dispatched on the output file extension.
//!
//! The extension table is fixed at compile time ([`FORMATS`]). Tabular
//! formats drop the geometry and write attributes only; spatial formats
//! write geometry and attributes in EPSG:4326. Unrecognised extensions fall
//! back to the shapefile writer.

mod geojson;
mod gpkg;
mod shp;
mod sqlite;
mod tabular;
pub mod wkb;
mod xml;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::geometry::FeatureCollection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Driver {
    Csv,
    Xlsx,
    Shapefile,
    GeoPackage,
    GeoJson,
    GeoJsonSeq,
    Sqlite,
    Gml,
    Kml,
}

impl Driver {
    /// Conventional GIS driver name, used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Driver::Csv => "CSV",
            Driver::Xlsx => "Excel",
            Driver::Shapefile => "ESRI Shapefile",
            Driver::GeoPackage => "GPKG",
            Driver::GeoJson => "GeoJSON",
            Driver::GeoJsonSeq => "GeoJSONSeq",
            Driver::Sqlite => "SQLite",
            Driver::Gml => "GML",
            Driver::Kml => "KML",
        }
    }
}

/// How one file extension is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Lower-case extension including the dot
    pub extension: &'static str,
    pub driver: Driver,
    /// `false` for attribute-only tables
    pub spatial: bool,
    /// Timestamp columns are written as `YYYY-MM-DD HH:MM:SS` text
    pub stringify_datetimes: bool,
}

const fn format(
    extension: &'static str,
    driver: Driver,
    spatial: bool,
    stringify_datetimes: bool,
) -> FormatDescriptor {
    FormatDescriptor {
        extension,
        driver,
        spatial,
        stringify_datetimes,
    }
}

pub const FORMATS: &[FormatDescriptor] = &[
    format(".csv", Driver::Csv, false, true),
    format(".xlsx", Driver::Xlsx, false, true),
    format(".shp", Driver::Shapefile, true, true),
    format(".gpkg", Driver::GeoPackage, true, false),
    format(".json", Driver::GeoJson, true, false),
    format(".geojson", Driver::GeoJson, true, false),
    format(".geojsonl", Driver::GeoJsonSeq, true, false),
    format(".sqlite", Driver::Sqlite, true, false),
    format(".gml", Driver::Gml, true, false),
    format(".kml", Driver::Kml, true, false),
];

/// Used for any extension missing from [`FORMATS`].
pub const FALLBACK: FormatDescriptor = format("", Driver::Shapefile, true, true);

/// Lower-cased extension of `path` including the dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Look up the descriptor for `path`, if its extension is known.
pub fn lookup(path: &Path) -> Option<&'static FormatDescriptor> {
    let ext = extension_of(path);
    FORMATS.iter().find(|f| f.extension == ext)
}

/// Layer/table name derived from the file stem.
pub(crate) fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "layer".to_string())
}

/// Remove a previous output so database-backed formats start clean.
pub(crate) fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove existing output {}", path.display()))?;
    }
    Ok(())
}

/// Write `collection` to `path` in the format selected by its extension.
///
/// Creates missing parent directories. Returns the descriptor used.
pub fn export(collection: &FeatureCollection, path: &Path) -> Result<FormatDescriptor> {
    let descriptor = match lookup(path) {
        Some(d) => *d,
        None => {
            tracing::warn!(
                "unknown extension '{}', attempting default save with {}",
                extension_of(path),
                FALLBACK.driver.name()
            );
            FALLBACK
        }
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    tracing::info!("saving to {}...", path.display());
    match descriptor.driver {
        Driver::Csv => tabular::write_csv(collection, path),
        Driver::Xlsx => tabular::write_xlsx(collection, path),
        Driver::Shapefile => shp::write_shapefile(collection, path),
        Driver::GeoPackage => gpkg::write_geopackage(collection, path),
        Driver::GeoJson => geojson::write_geojson(collection, path),
        Driver::GeoJsonSeq => geojson::write_geojson_seq(collection, path),
        Driver::Sqlite => sqlite::write_sqlite(collection, path),
        Driver::Gml => xml::write_gml(collection, path),
        Driver::Kml => xml::write_kml(collection, path),
    }
    .with_context(|| {
        format!(
            "failed to write {} with driver {}",
            path.display(),
            descriptor.driver.name()
        )
    })?;
    tracing::info!("saved successfully using driver: {}", descriptor.driver.name());

    Ok(descriptor)
}
