#![cfg(feature = "std")]

use std::path::Path;

use carabiner::{
    avec::Options,
    model::{Location, Skipped, Summary, TrackDocument},
    sans::archive::RecordKind,
};
use csv::ReaderBuilder;

#[test]
fn decode_file_v3_hike() {
    const PATH: &str = "fixtures/v3-hike.trk";
    let document = carabiner::avec::decode_file(PATH, &Options::default())
        .unwrap()
        .unwrap_left();
    Validator::new(PATH).validate(&document);
}

#[test]
fn decode_file_v4_ride() {
    const PATH: &str = "fixtures/v4-ride.trk";
    let document = carabiner::avec::decode_file(PATH, &Options::default())
        .unwrap()
        .unwrap_left();
    Validator::new(PATH).validate(&document);
}

#[test]
fn decode_slice_v3_hike() {
    const PATH: &str = "fixtures/v3-hike.trk";
    let data = std::fs::read(PATH).unwrap();
    let document = carabiner::avec::track::decode_slice(&data).unwrap();
    Validator::new(PATH).validate(&document);
}

#[test]
fn decode_track_from_any_position() {
    const PATH: &str = "fixtures/v4-ride.trk";
    let mut file = std::fs::File::open(PATH).unwrap();
    std::io::Seek::seek(&mut file, std::io::SeekFrom::End(0)).unwrap();
    let document = carabiner::avec::decode_track(&mut file).unwrap();
    Validator::new(PATH).validate(&document);
}

#[test]
fn decode_file_collection() {
    const PATH: &str = "fixtures/collection.ldk";
    let archive = carabiner::avec::decode_file(PATH, &Options::default())
        .unwrap()
        .unwrap_right();

    let mut rows = read_rows(PATH).into_iter();

    let row = rows.next().unwrap();
    assert_eq!(row[0], "archive");
    assert_eq!(row[1], archive.magic.to_string());
    assert_eq!(row[2], archive.version.to_string());

    let mut nodes = vec![&archive.root];
    let mut i = 0;
    while i < nodes.len() {
        let node = nodes[i];
        nodes.extend(node.children.iter());
        i += 1;
    }

    for node in nodes {
        let row = rows.next().unwrap();
        assert_eq!(row[0], "node");
        assert_eq!(row[1], node.path);
        assert_eq!(row[2], node.metadata.name().unwrap_or(""));
    }

    for track in &archive.tracks {
        let row = rows.next().unwrap();
        assert_eq!(row[0], "track");
        assert_eq!(row[1], track.path);
        assert_eq!(row[2], track.id.to_string());

        let standalone = Path::new("fixtures").join(&row[3]);
        let expected = carabiner::avec::decode_file(&standalone, &Options::default())
            .unwrap()
            .unwrap_left();
        assert_eq!(track.document, expected);
        Validator::new(&standalone).validate(&track.document);
    }

    for skipped in &archive.skipped {
        let row = rows.next().unwrap();
        assert_eq!(row[0], "skipped");
        match skipped {
            Skipped::Record { entry, kind } => {
                assert_eq!(row[1], "record");
                assert_eq!(row[2], entry.to_string());
                let expected = match row[3].as_str() {
                    "waypoint" => RecordKind::Waypoint,
                    _ => RecordKind::Unknown(0),
                };
                assert_eq!(*kind, expected);
            }
            Skipped::Empty { entry } => {
                assert_eq!(row[1], "empty");
                assert_eq!(row[2], entry.to_string());
            }
            Skipped::Entries { .. } => panic!("unexpected skip {skipped:?}"),
        }
    }

    assert!(rows.next().is_none());
}

fn read_rows(path: impl AsRef<Path>) -> Vec<Vec<String>> {
    let path = path.as_ref().with_extension("csv");

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .unwrap();

    reader
        .records()
        .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
        .collect()
}

struct Validator(Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let mut rows = read_rows(path);
        rows.reverse();

        Self(rows)
    }

    fn next(&mut self, tag: &str) -> Vec<String> {
        let mut row = self.0.pop().unwrap();
        assert_eq!(row.remove(0), tag);
        row
    }

    fn peek(&self) -> Option<&str> {
        self.0.last().map(|r| r[0].as_str())
    }

    fn validate(mut self, document: &TrackDocument) {
        let row = self.next("version");
        assert_eq!(row[0], (document.version as i32).to_string());

        let row = self.next("name");
        assert_eq!(row[0], document.name().unwrap());

        let mut entries = document.metadata.iter();
        while self.peek() == Some("meta") {
            let row = self.next("meta");
            let (key, value) = entries.next().unwrap();
            assert_eq!(row[0], key);
            assert_eq!(row[1], value.to_string());
        }
        assert!(entries.next().is_none());

        match &document.summary {
            Summary::Header(statistics) => {
                let statistics = statistics.as_ref().unwrap();
                let row = self.next("stats");
                assert_eq!(row[0], statistics.locations.to_string());
                assert_eq!(row[1], statistics.segments.to_string());
                assert_eq!(row[2], statistics.waypoints.to_string());
                assert_eq!(parse(&row[3]), Some(statistics.first_longitude));
                assert_eq!(parse(&row[4]), Some(statistics.first_latitude));
                assert_eq!(parse(&row[5]), Some(statistics.first_time));
                assert_eq!(parse(&row[6]), Some(statistics.length));
                assert_eq!(parse(&row[7]), Some(statistics.length_3d));
                assert_eq!(parse(&row[8]), Some(statistics.elevation_gain));
                assert_eq!(row[9], statistics.duration.to_string());
            }
            Summary::Metadata(_) => {
                let row = self.next("first_time");
                assert_eq!(parse(&row[0]), document.time_of_first_location());
            }
        }

        for waypoint in &document.waypoints {
            let row = self.next("wpt");
            assert_eq!(row[0], waypoint.metadata.name().unwrap());
            self.location(&waypoint.location);
        }

        for segment in &document.segments {
            let row = self.next("seg");
            assert_eq!(row[0], segment.metadata.name().unwrap_or(""));
            for location in &segment.locations {
                self.location(location);
            }
        }

        assert!(self.0.is_empty(), "{} rows left", self.0.len());
    }

    fn location(&mut self, location: &Location) {
        let row = self.next("loc");
        assert_eq!(parse(&row[0]), Some(location.latitude));
        assert_eq!(parse(&row[1]), Some(location.longitude));
        assert_eq!(parse(&row[2]), location.elevation);
        assert_eq!(parse(&row[3]), location.time);
        assert_eq!(row[4].parse().ok(), location.accuracy);
        assert_eq!(parse(&row[5]), location.pressure);
    }
}

fn parse(field: &str) -> Option<f64> {
    field.parse().ok()
}

#[test]
fn decoding_is_deterministic() {
    for path in ["fixtures/v3-hike.trk", "fixtures/v4-ride.trk", "fixtures/collection.ldk"] {
        let first = carabiner::avec::decode_file(path, &Options::default()).unwrap();
        let second = carabiner::avec::decode_file(path, &Options::default()).unwrap();
        assert_eq!(first, second);
    }
}
