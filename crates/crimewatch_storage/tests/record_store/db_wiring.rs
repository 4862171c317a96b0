#![forbid(unsafe_code)]

use std::fs;

use crimewatch_kernel_contracts::credential::{CredentialRecord, RegisterRequest};
use crimewatch_kernel_contracts::report::{AttachmentRef, CrimeReportRequest};
use crimewatch_storage::{RecordKind, RecordStore, StorageError};

fn register(store: &RecordStore, username: &str, password: &str, email: &str) {
    let req = RegisterRequest::from_fields(
        Some(username.to_string()),
        Some(password.to_string()),
        Some(email.to_string()),
    )
    .unwrap();
    store.append(&req.into_record()).unwrap();
}

fn report_request() -> CrimeReportRequest {
    CrimeReportRequest::from_fields(
        Some("Priya".to_string()),
        Some("+91 555 0100".to_string()),
        Some("MG Road, Bengaluru".to_string()),
        Some("Theft".to_string()),
        Some("Bag snatched near the bus stop.\nTwo suspects.".to_string()),
    )
    .unwrap()
}

#[test]
fn at_store_db_01_register_then_authenticate() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path());
    store.ensure_stores().unwrap();
    register(&store, "alice", "pw-1", "alice@example.com");

    let principal = store
        .authenticate("alice", "pw-1")
        .unwrap()
        .expect("matching credentials must authenticate");
    assert_eq!(principal.username(), "alice");
    assert!(store.authenticate("alice", "pw-2").unwrap().is_none());
    assert!(store.authenticate("bob", "pw-1").unwrap().is_none());
}

#[test]
fn at_store_db_02_find_credential_returns_queried_username() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path());
    let names = ["alice", "bob", "carol", "dave"];
    for name in names {
        register(&store, name, "pw", &format!("{name}@example.com"));
    }
    for name in names {
        let found = store.find_credential(name).unwrap().unwrap();
        assert_eq!(found.username, name);
        assert_eq!(found.email, format!("{name}@example.com"));
    }
    assert!(store.find_credential("mallory").unwrap().is_none());
}

#[test]
fn at_store_db_03_duplicate_usernames_persist_and_first_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path());
    register(&store, "alice", "first", "one@example.com");
    register(&store, "alice", "second", "two@example.com");

    let all = store.credentials().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        store.find_credential("alice").unwrap(),
        Some(CredentialRecord {
            username: "alice".to_string(),
            password: "first".to_string(),
            email: "one@example.com".to_string(),
        })
    );
    // The second row is still reachable by its own password.
    assert!(store.authenticate("alice", "second").unwrap().is_some());
}

#[test]
fn at_store_db_04_report_without_attachment_stores_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path());
    store.ensure_stores().unwrap();
    store
        .append(&report_request().into_record(AttachmentRef::Absent))
        .unwrap();

    let raw = fs::read_to_string(store.path_for(RecordKind::CrimeReports)).unwrap();
    assert!(raw.trim_end().ends_with(",No Attachment"));
    let reports = store.crime_reports().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].attachment.as_field(), "No Attachment");
    assert_eq!(
        reports[0].description,
        "Bag snatched near the bus stop.\nTwo suspects."
    );
}

#[test]
fn at_store_db_05_unreachable_root_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"file in the way").unwrap();
    let store = RecordStore::open(blocker.join("store"));

    let err = store.ensure_stores().expect_err("root under a file must fail");
    assert!(matches!(err, StorageError::Unavailable { .. }));
}
