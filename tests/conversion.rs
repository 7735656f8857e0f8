mod common;

use std::collections::BTreeSet;
use std::fs;

use rusqlite::Connection;
use serde_json::Value;
use tempfile::tempdir;

use common::Fixture;
use trk2gis::error::{ConvertError, DatasetError};
use trk2gis::export::Driver;
use trk2gis::{ConvertOptions, ConvertOutcome, Mode, convert_particles, open_dataset};

fn read_geojson(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_hourly_input_downscaled_to_three_hours() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(100, 2).write(dir.path(), "hourly.nc");

    let csv_out = dir.path().join("points.csv");
    let outcome = convert_particles(
        &ConvertOptions::new(&input, &csv_out, Mode::Point).with_downscale_hours(3.0),
    )
    .unwrap();
    assert_eq!(
        outcome,
        ConvertOutcome::Written {
            features: 34 * 2,
            driver: Driver::Csv
        }
    );

    let text = fs::read_to_string(&csv_out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "par_id,time");
    assert_eq!(lines.len(), 1 + 34 * 2);
    // time-major order
    assert_eq!(lines[1], "0,2024-04-05 00:00:00");
    assert_eq!(lines[2], "1,2024-04-05 00:00:00");
    assert_eq!(lines[3], "0,2024-04-05 03:00:00");
    assert_eq!(lines.last().unwrap(), &"1,2024-04-09 03:00:00");

    let json_out = dir.path().join("tracks.geojson");
    convert_particles(&ConvertOptions::new(&input, &json_out, Mode::Line).with_downscale_hours(3.0))
        .unwrap();
    let doc = read_geojson(&json_out);
    let features = doc["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    for f in features {
        assert_eq!(f["geometry"]["coordinates"].as_array().unwrap().len(), 34);
        assert_eq!(f["properties"]["time_start"], "2024-04-05T00:00:00Z");
        assert_eq!(f["properties"]["time_end"], "2024-04-09T03:00:00Z");
    }
}

#[test]
fn test_all_fill_particle_is_dropped() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(24, 5)
        .with_all_fill(&[3])
        .write(dir.path(), "five.nc");

    let tracks = dir.path().join("tracks.json");
    convert_particles(&ConvertOptions::new(&input, &tracks, Mode::Line)).unwrap();
    let doc = read_geojson(&tracks);
    let ids: BTreeSet<i64> = doc["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["par_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, BTreeSet::from([0, 1, 2, 4]));

    let points = dir.path().join("points.csv");
    let outcome = convert_particles(&ConvertOptions::new(&input, &points, Mode::Point)).unwrap();
    assert_eq!(
        outcome,
        ConvertOutcome::Written {
            features: 24 * 4,
            driver: Driver::Csv
        }
    );
    let text = fs::read_to_string(&points).unwrap();
    assert!(text.lines().skip(1).all(|l| !l.starts_with("3,")));
}

#[test]
fn test_all_fill_dataset_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(10, 3)
        .with_all_fill(&[0, 1, 2])
        .write(dir.path(), "empty.nc");

    for (mode, name) in [(Mode::Line, "tracks.gpkg"), (Mode::Point, "points.shp")] {
        let out = dir.path().join(name);
        let outcome = convert_particles(&ConvertOptions::new(&input, &out, mode)).unwrap();
        assert_eq!(outcome, ConvertOutcome::NoOutput);
        assert!(!out.exists());
    }
}

#[test]
fn test_geopackage_tracks_round_trip() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(12, 3).write(dir.path(), "run.nc");
    let out = dir.path().join("out/tracks.gpkg");

    convert_particles(&ConvertOptions::new(&input, &out, Mode::Line).with_downscale_hours(2.0))
        .unwrap();

    let conn = Connection::open(&out).unwrap();
    let mut stmt = conn
        .prepare("SELECT par_id, time_start, time_end FROM tracks ORDER BY fid")
        .unwrap();
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].0, 2);
    assert_eq!(rows[0].1, "2024-04-05T00:00:00.000Z");
    assert_eq!(rows[0].2, "2024-04-05T10:00:00.000Z");
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(30, 4).write(dir.path(), "run.nc");

    for name in ["points.csv", "points.geojson", "points.kml"] {
        let out = dir.path().join(name);
        let options = ConvertOptions::new(&input, &out, Mode::Point).with_downscale_hours(6.0);
        convert_particles(&options).unwrap();
        let first = fs::read(&out).unwrap();
        convert_particles(&options).unwrap();
        assert_eq!(first, fs::read(&out).unwrap(), "{name}");
    }
}

#[test]
fn test_missing_variable_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bare.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", 2).unwrap();
        let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
        time.put_attribute("units", "hours since 2024-01-01").unwrap();
        time.put_values(&[0.0f64, 1.0][..], ..).unwrap();
    }

    let err = convert_particles(&ConvertOptions::new(&path, dir.path().join("x.csv"), Mode::Point))
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Dataset(DatasetError::MissingVariable { .. })
    ));
}

#[test]
fn test_dataset_fill_value_overrides_default() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(8, 3)
        .with_fill_attribute(Some(9999.0))
        .with_all_fill(&[1])
        .with_default_sentinel(&[2])
        .write(dir.path(), "custom_fill.nc");

    assert_eq!(open_dataset(&input).unwrap().fill_value, 9999.0);

    let out = dir.path().join("points.csv");
    let outcome = convert_particles(&ConvertOptions::new(&input, &out, Mode::Point)).unwrap();
    // 9999 cells are masked, -999 is an ordinary coordinate here
    assert_eq!(
        outcome,
        ConvertOutcome::Written {
            features: 8 * 2,
            driver: Driver::Csv
        }
    );
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.lines().skip(1).all(|l| !l.starts_with("1,")));
    assert_eq!(text.lines().filter(|l| l.starts_with("2,")).count(), 8);
}

#[test]
fn test_missing_fill_attribute_uses_default() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(8, 3)
        .with_fill_attribute(None)
        .with_all_fill(&[0])
        .write(dir.path(), "no_fill_attr.nc");

    assert_eq!(open_dataset(&input).unwrap().fill_value, -999.0);

    let out = dir.path().join("tracks.geojson");
    let outcome = convert_particles(&ConvertOptions::new(&input, &out, Mode::Line)).unwrap();
    assert_eq!(
        outcome,
        ConvertOutcome::Written {
            features: 2,
            driver: Driver::GeoJson
        }
    );
}

#[test]
fn test_fill_tolerance_masks_perturbed_sentinel() {
    let dir = tempdir().unwrap();
    let input = Fixture::new(6, 2)
        .with_fill_attribute(Some(-999.0001))
        .with_default_sentinel(&[1])
        .write(dir.path(), "perturbed.nc");

    let exact = dir.path().join("exact.csv");
    convert_particles(&ConvertOptions::new(&input, &exact, Mode::Point)).unwrap();
    assert_eq!(fs::read_to_string(&exact).unwrap().lines().count(), 1 + 6 * 2);

    let tolerant = dir.path().join("tolerant.csv");
    let outcome = convert_particles(
        &ConvertOptions::new(&input, &tolerant, Mode::Point).with_fill_tolerance(Some(1e-3)),
    )
    .unwrap();
    assert_eq!(
        outcome,
        ConvertOutcome::Written {
            features: 6,
            driver: Driver::Csv
        }
    );
}
