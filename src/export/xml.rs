//! XML outputs: GML 3.2 feature collections and KML 2.2 documents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::layer_name;
use crate::geometry::{FeatureCollection, FieldKind, Geometry, Value};
use crate::time::format_iso;

const GML_SRS: &str = "urn:ogc:def:crs:EPSG::4326";

type XmlWriter = Writer<BufWriter<File>>;

fn open(path: &Path) -> Result<XmlWriter> {
    let mut w = Writer::new_with_indent(BufWriter::new(File::create(path)?), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(w)
}

fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Start(el))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn leaf(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
    start(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Empty(el))?;
    Ok(())
}

fn finish(w: XmlWriter) -> Result<()> {
    let mut inner = w.into_inner();
    inner.write_all(b"\n")?;
    inner.flush()?;
    Ok(())
}

fn xml_value(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::DateTime(t) => format_iso(t),
    }
}

/// Layer name usable as an element local name or `gml:id`.
///
/// Characters outside the NCName set become `_`; a leading character that
/// cannot start a name gets a `_` prefix.
pub(crate) fn ncname(layer: &str) -> String {
    let mut name: String = layer
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match name.chars().next() {
        None => "layer".to_string(),
        Some(c) if c.is_alphabetic() || c == '_' => name,
        Some(_) => {
            name.insert(0, '_');
            name
        }
    }
}

/// GML with `EPSG::4326` URNs uses latitude/longitude axis order.
fn gml_pos_list(geometry: &Geometry) -> String {
    geometry
        .coords()
        .iter()
        .map(|(x, y)| format!("{y} {x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_gml(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let layer = ncname(&layer_name(path));
    let mut w = open(path)?;

    start(
        &mut w,
        "ogr:FeatureCollection",
        &[
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ("xmlns:ogr", "http://ogr.maptools.org/"),
            ("xmlns:gml", "http://www.opengis.net/gml/3.2"),
            ("gml:id", "aFeatureCollection"),
        ],
    )?;

    let [min_x, min_y, max_x, max_y] = collection.bounds();
    start(&mut w, "gml:boundedBy", &[])?;
    start(&mut w, "gml:Envelope", &[("srsName", GML_SRS)])?;
    leaf(&mut w, "gml:lowerCorner", &[], &format!("{min_y} {min_x}"))?;
    leaf(&mut w, "gml:upperCorner", &[], &format!("{max_y} {max_x}"))?;
    end(&mut w, "gml:Envelope")?;
    end(&mut w, "gml:boundedBy")?;

    let layer_tag = format!("ogr:{layer}");
    for (i, feature) in collection.features().iter().enumerate() {
        let fid = format!("{layer}.{i}");
        let geom_id = format!("{layer}.geom.{i}");

        start(&mut w, "ogr:featureMember", &[])?;
        start(&mut w, &layer_tag, &[("gml:id", fid.as_str())])?;

        start(&mut w, "ogr:geometryProperty", &[])?;
        let attrs = [("srsName", GML_SRS), ("gml:id", geom_id.as_str())];
        match &feature.geometry {
            Geometry::Point(_) => {
                start(&mut w, "gml:Point", &attrs)?;
                leaf(&mut w, "gml:pos", &[], &gml_pos_list(&feature.geometry))?;
                end(&mut w, "gml:Point")?;
            }
            Geometry::LineString(_) => {
                start(&mut w, "gml:LineString", &attrs)?;
                leaf(&mut w, "gml:posList", &[], &gml_pos_list(&feature.geometry))?;
                end(&mut w, "gml:LineString")?;
            }
        }
        end(&mut w, "ogr:geometryProperty")?;

        for (field, value) in collection.fields().iter().zip(&feature.values) {
            leaf(&mut w, &format!("ogr:{}", field.name), &[], &xml_value(value))?;
        }

        end(&mut w, &layer_tag)?;
        end(&mut w, "ogr:featureMember")?;
    }

    end(&mut w, "ogr:FeatureCollection")?;
    finish(w)
}

fn kml_coordinates(geometry: &Geometry) -> String {
    geometry
        .coords()
        .iter()
        .map(|(x, y)| format!("{x},{y}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// KML document with a typed schema; points carry a `TimeStamp` and tracks a
/// `TimeSpan` so time-aware viewers can animate them.
pub fn write_kml(collection: &FeatureCollection, path: &Path) -> Result<()> {
    let layer = layer_name(path);
    let schema_id = ncname(&layer);
    let schema_url = format!("#{schema_id}");
    let mut w = open(path)?;

    start(&mut w, "kml", &[("xmlns", "http://www.opengis.net/kml/2.2")])?;
    start(&mut w, "Document", &[("id", "root_doc")])?;

    start(&mut w, "Schema", &[("name", layer.as_str()), ("id", schema_id.as_str())])?;
    for field in collection.fields() {
        let kind = match field.kind {
            FieldKind::Integer => "int",
            FieldKind::DateTime => "string",
        };
        empty(&mut w, "SimpleField", &[("name", field.name), ("type", kind)])?;
    }
    end(&mut w, "Schema")?;

    start(&mut w, "Folder", &[])?;
    leaf(&mut w, "name", &[], &layer)?;

    for feature in collection.features() {
        start(&mut w, "Placemark", &[])?;

        let times: Vec<String> = feature
            .values
            .iter()
            .filter_map(|v| match v {
                Value::DateTime(t) => Some(format_iso(t)),
                Value::Integer(_) => None,
            })
            .collect();
        match times.as_slice() {
            [when] => {
                start(&mut w, "TimeStamp", &[])?;
                leaf(&mut w, "when", &[], when)?;
                end(&mut w, "TimeStamp")?;
            }
            [begin, end_time] => {
                start(&mut w, "TimeSpan", &[])?;
                leaf(&mut w, "begin", &[], begin)?;
                leaf(&mut w, "end", &[], end_time)?;
                end(&mut w, "TimeSpan")?;
            }
            _ => {}
        }

        start(&mut w, "ExtendedData", &[])?;
        start(&mut w, "SchemaData", &[("schemaUrl", schema_url.as_str())])?;
        for (field, value) in collection.fields().iter().zip(&feature.values) {
            leaf(&mut w, "SimpleData", &[("name", field.name)], &xml_value(value))?;
        }
        end(&mut w, "SchemaData")?;
        end(&mut w, "ExtendedData")?;

        let tag = match &feature.geometry {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
        };
        start(&mut w, tag, &[])?;
        leaf(&mut w, "coordinates", &[], &kml_coordinates(&feature.geometry))?;
        end(&mut w, tag)?;

        end(&mut w, "Placemark")?;
    }

    end(&mut w, "Folder")?;
    end(&mut w, "Document")?;
    end(&mut w, "kml")?;
    finish(w)
}
