//! GeoJSON (RFC 7946) and newline-delimited GeoJSON sequences.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use serde_json::{Map, Value as Json, json};

use super::layer_name;
use crate::geometry::{Feature, FeatureCollection, Geometry, Value};
use crate::time::format_iso;

fn geometry_json(geometry: &Geometry) -> Json {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x(), p.y()] }),
        Geometry::LineString(ls) => json!({
            "type": "LineString",
            "coordinates": ls.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>(),
        }),
    }
}

fn feature_json(collection: &FeatureCollection, feature: &Feature) -> Json {
    let properties: Map<String, Json> = collection
        .fields()
        .iter()
        .zip(&feature.values)
        .map(|(field, value)| {
            let v = match value {
                Value::Integer(i) => json!(i),
                Value::DateTime(t) => json!(format_iso(t)),
            };
            (field.name.to_string(), v)
        })
        .collect();

    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": geometry_json(&feature.geometry),
    })
}

pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let features: Vec<Json> = collection
        .features()
        .iter()
        .map(|f| feature_json(collection, f))
        .collect();
    let doc = json!({
        "type": "FeatureCollection",
        "name": layer_name(path),
        "features": features,
    });

    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, &doc)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

pub fn write_geojson_seq(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for feature in collection.features() {
        serde_json::to_writer(&mut out, &feature_json(collection, feature))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
