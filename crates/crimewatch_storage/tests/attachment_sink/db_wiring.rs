#![forbid(unsafe_code)]

use std::fs;

use crimewatch_kernel_contracts::report::{AttachmentRef, CrimeReportRequest};
use crimewatch_storage::{AttachmentSink, RecordStore};

#[test]
fn at_sink_db_01_stored_attachment_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let sink = AttachmentSink::new(dir.path().join("uploads"));
    sink.ensure_dir().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let stored = sink
        .store("evidence.bin", &payload)
        .unwrap()
        .expect("non-empty upload must be stored");
    let path = stored.path().unwrap();
    assert!(path.ends_with("evidence.bin"));
    assert_eq!(fs::read(path).unwrap(), payload);
}

#[test]
fn at_sink_db_02_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let sink = AttachmentSink::new(dir.path());
    let first = sink.store("same.txt", b"first").unwrap().unwrap();
    let second = sink.store("same.txt", b"second").unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(second.path().unwrap()).unwrap(), b"second");
}

#[test]
fn at_sink_db_03_report_records_the_stored_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("data"));
    let sink = AttachmentSink::new(dir.path().join("uploads"));
    let attachment = sink
        .store("photo.jpg", b"\xFF\xD8\xFF\xE0jpeg")
        .unwrap()
        .unwrap_or(AttachmentRef::Absent);

    let req = CrimeReportRequest::from_fields(
        Some("Ravi".to_string()),
        Some("555-0101".to_string()),
        Some("Station Road".to_string()),
        Some("Vandalism".to_string()),
        Some("Window broken".to_string()),
    )
    .unwrap();
    store.append(&req.into_record(attachment.clone())).unwrap();

    let reports = store.crime_reports().unwrap();
    assert_eq!(reports[0].attachment, attachment);
    let path = reports[0].attachment.path().unwrap();
    assert_eq!(fs::read(path).unwrap(), b"\xFF\xD8\xFF\xE0jpeg");
}
