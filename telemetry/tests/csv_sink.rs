use std::fs;
use std::time::Duration;

use gamebot_protocol::{Button, ButtonState, FrameSnapshot, PlayerId, Winner};
use gamebot_telemetry::{CsvFileSink, RowSink, TelemetryBuffer, TelemetryRow, HEADERS};

fn row(frame: u64) -> TelemetryRow {
    TelemetryRow::capture(
        frame,
        1_700_000_000.0 + frame as f64,
        &FrameSnapshot::default(),
        PlayerId::One,
        ButtonState::pressed([Button::Right]),
    )
}

fn read_records(path: &std::path::Path) -> Vec<csv::StringRecord> {
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn header_is_written_once_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GameData.csv");

    let mut sink = CsvFileSink::open(&path).unwrap();
    sink.append(&[row(1), row(2)]).unwrap();

    let mut reopened = CsvFileSink::open(&path).unwrap();
    reopened.append(&[row(3)]).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let header_lines = contents.lines().filter(|line| line.starts_with("session_id,")).count();
    assert_eq!(header_lines, 1);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());

    let records = read_records(&path);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.len() == HEADERS.len()));
    assert_eq!(&records[2][2], "3");
}

#[test]
fn resolved_matches_land_on_disk_with_their_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.csv");
    let sink = CsvFileSink::open(&path).unwrap();

    let mut buffer = TelemetryBuffer::new(1_700_000_000, 50, Duration::from_secs(60), Box::new(sink));

    for frame in 1..=4 {
        buffer.record(row(frame), None);
    }
    buffer.record(row(5), Some(Winner::PlayerOne));
    buffer.record(row(6), None);
    buffer.drain();

    let records = read_records(&path);
    let winner_column = HEADERS.iter().position(|h| *h == "winner").unwrap();
    let match_column = HEADERS.iter().position(|h| *h == "match_id").unwrap();

    let labels: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (&r[match_column], &r[winner_column]))
        .collect();

    assert_eq!(
        labels,
        vec![("0", "1"), ("0", "1"), ("0", "1"), ("0", "1"), ("0", "1"), ("1", "-1")]
    );
    assert!(records.iter().all(|r| &r[0] == "1700000000"));
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("GameData.csv");

    assert!(CsvFileSink::open(path).is_err());
}
