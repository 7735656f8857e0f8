//! Little-endian 2D Well-Known Binary, plus the GeoPackage blob header.

use crate::geometry::Geometry;

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;

/// Encode `geometry` as ISO WKB (little endian, XY).
pub fn encode(geometry: &Geometry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    buf.push(1u8);
    match geometry {
        Geometry::Point(p) => {
            buf.extend_from_slice(&WKB_POINT.to_le_bytes());
            buf.extend_from_slice(&p.x().to_le_bytes());
            buf.extend_from_slice(&p.y().to_le_bytes());
        }
        Geometry::LineString(ls) => {
            buf.extend_from_slice(&WKB_LINESTRING.to_le_bytes());
            buf.extend_from_slice(&(ls.0.len() as u32).to_le_bytes());
            for c in ls.coords() {
                buf.extend_from_slice(&c.x.to_le_bytes());
                buf.extend_from_slice(&c.y.to_le_bytes());
            }
        }
    }
    buf
}

/// GeoPackage binary geometry: `GP` header with an XY envelope, then WKB.
pub fn gpkg_blob(geometry: &Geometry, srs_id: i32) -> Vec<u8> {
    // version 0; flags: envelope [minx, maxx, miny, maxy] (code 1), little endian
    const FLAGS: u8 = 0b0000_0011;
    let [min_x, min_y, max_x, max_y] = geometry.bounds();

    let mut buf = Vec::with_capacity(40 + 32);
    buf.extend_from_slice(b"GP");
    buf.push(0);
    buf.push(FLAGS);
    buf.extend_from_slice(&srs_id.to_le_bytes());
    for v in [min_x, max_x, min_y, max_y] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(&encode(geometry));
    buf
}

/// Decode WKB produced by [`encode`] back into `(type code, coordinates)`.
///
/// Only little-endian 2D points and linestrings are understood.
pub fn decode(bytes: &[u8]) -> Option<(u32, Vec<(f64, f64)>)> {
    fn u32_at(b: &[u8], at: usize) -> Option<u32> {
        Some(u32::from_le_bytes(b.get(at..at + 4)?.try_into().ok()?))
    }
    fn f64_at(b: &[u8], at: usize) -> Option<f64> {
        Some(f64::from_le_bytes(b.get(at..at + 8)?.try_into().ok()?))
    }

    if *bytes.first()? != 1 {
        return None;
    }
    let kind = u32_at(bytes, 1)?;
    match kind {
        WKB_POINT => Some((kind, vec![(f64_at(bytes, 5)?, f64_at(bytes, 13)?)])),
        WKB_LINESTRING => {
            let n = u32_at(bytes, 5)? as usize;
            let coords = (0..n)
                .map(|i| {
                    let at = 9 + i * 16;
                    Some((f64_at(bytes, at)?, f64_at(bytes, at + 8)?))
                })
                .collect::<Option<Vec<_>>>()?;
            Some((kind, coords))
        }
        _ => None,
    }
}

/// Strip a GeoPackage header, returning the WKB payload.
pub fn strip_gpkg_header(blob: &[u8]) -> Option<&[u8]> {
    if blob.get(..2)? != b"GP" {
        return None;
    }
    let flags = *blob.get(3)?;
    let envelope_len = match (flags >> 1) & 0b111 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        _ => return None,
    };
    blob.get(8 + envelope_len..)
}
