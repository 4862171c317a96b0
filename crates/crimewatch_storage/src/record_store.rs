#![forbid(unsafe_code)]

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crimewatch_kernel_contracts::credential::{CredentialRecord, Principal};
use crimewatch_kernel_contracts::report::{AttachmentRef, CrimeReportRecord};
use tracing::{debug, warn};

use crate::StorageError;

pub const CREDENTIALS_FILE_NAME: &str = "user_data.csv";
pub const CRIME_REPORTS_FILE_NAME: &str = "crime_reports.csv";

const CREDENTIALS_HEADER: &[&str] = &["Username", "Password", "Email"];
const CRIME_REPORTS_HEADER: &[&str] = &[
    "Name",
    "Phone Number",
    "Location",
    "Crime Type",
    "Description",
    "Attachment",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Credentials,
    CrimeReports,
}

impl RecordKind {
    pub const fn all() -> &'static [Self] {
        &[Self::Credentials, Self::CrimeReports]
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Credentials => CREDENTIALS_FILE_NAME,
            Self::CrimeReports => CRIME_REPORTS_FILE_NAME,
        }
    }

    pub const fn header(self) -> &'static [&'static str] {
        match self {
            Self::Credentials => CREDENTIALS_HEADER,
            Self::CrimeReports => CRIME_REPORTS_HEADER,
        }
    }
}

/// A record persisted as one ordered line of its kind's flat file.
pub trait FlatRecord: Sized {
    const KIND: RecordKind;

    fn to_fields(&self) -> Vec<&str>;

    /// Returns `None` for rows too short to hold the record.
    fn from_fields(fields: &[&str]) -> Option<Self>;
}

impl FlatRecord for CredentialRecord {
    const KIND: RecordKind = RecordKind::Credentials;

    fn to_fields(&self) -> Vec<&str> {
        vec![
            self.username.as_str(),
            self.password.as_str(),
            self.email.as_str(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let username = fields.first()?;
        let password = fields.get(1)?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
            email: fields.get(2).map(|v| v.to_string()).unwrap_or_default(),
        })
    }
}

impl FlatRecord for CrimeReportRecord {
    const KIND: RecordKind = RecordKind::CrimeReports;

    fn to_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.phone_number.as_str(),
            self.location.as_str(),
            self.crime_type.as_str(),
            self.description.as_str(),
            self.attachment.as_field(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [name, phone_number, location, crime_type, description, attachment, ..] = fields else {
            return None;
        };
        Some(Self {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            location: location.to_string(),
            crime_type: crime_type.to_string(),
            description: description.to_string(),
            attachment: AttachmentRef::from_field(attachment),
        })
    }
}

/// Flat-file store rooted at one directory, one CSV file per [`RecordKind`].
///
/// Every call opens, uses and closes its file. There is no locking between writers.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: RecordKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// Creates any missing store file with its header row. Existing files are left untouched.
    pub fn ensure_stores(&self) -> Result<(), StorageError> {
        for kind in RecordKind::all() {
            if self.ensure_store(*kind)? {
                debug!(kind = ?kind, path = %self.path_for(*kind).display(), "created record store");
            }
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        RecordKind::all()
            .iter()
            .all(|kind| self.path_for(*kind).is_file())
    }

    pub fn append<R: FlatRecord>(&self, record: &R) -> Result<(), StorageError> {
        let path = self.path_for(R::KIND);
        self.ensure_store(R::KIND)?;
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|err| StorageError::io(&path, err))?;
        let mut writer = line_writer(file);
        writer
            .write_record(record.to_fields())
            .map_err(|err| StorageError::csv(&path, err))?;
        writer.flush().map_err(|err| StorageError::io(&path, err))?;
        Ok(())
    }

    pub fn find_credential(&self, username: &str) -> Result<Option<CredentialRecord>, StorageError> {
        self.find_first(|record: &CredentialRecord| record.username == username)
    }

    /// Byte-exact match on both fields. The first matching row wins.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Principal>, StorageError> {
        let found = self.find_first(|record: &CredentialRecord| {
            record.username == username && record.password == password
        })?;
        Ok(found.as_ref().map(Principal::from_credential))
    }

    pub fn credentials(&self) -> Result<Vec<CredentialRecord>, StorageError> {
        self.read_all()
    }

    pub fn crime_reports(&self) -> Result<Vec<CrimeReportRecord>, StorageError> {
        self.read_all()
    }

    fn read_all<R: FlatRecord>(&self) -> Result<Vec<R>, StorageError> {
        let mut out = Vec::new();
        self.scan(|record: R| {
            out.push(record);
            false
        })?;
        Ok(out)
    }

    fn find_first<R, F>(&self, mut matches: F) -> Result<Option<R>, StorageError>
    where
        R: FlatRecord,
        F: FnMut(&R) -> bool,
    {
        let mut found = None;
        self.scan(|record: R| {
            if matches(&record) {
                found = Some(record);
                return true;
            }
            false
        })?;
        Ok(found)
    }

    /// Visits records in file order until `visit` returns `true`. A missing file reads as empty.
    fn scan<R, F>(&self, mut visit: F) -> Result<(), StorageError>
    where
        R: FlatRecord,
        F: FnMut(R) -> bool,
    {
        let path = self.path_for(R::KIND);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(StorageError::io(&path, err)),
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        for (row_idx, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) if err.is_io_error() => return Err(StorageError::csv(&path, err)),
                Err(err) => {
                    warn!(path = %path.display(), row = row_idx + 1, error = %err, "skipping unreadable row");
                    continue;
                }
            };
            let fields: Vec<&str> = row.iter().collect();
            let Some(record) = R::from_fields(&fields) else {
                warn!(path = %path.display(), row = row_idx + 1, "skipping short row");
                continue;
            };
            if visit(record) {
                break;
            }
        }
        Ok(())
    }

    /// Returns `true` when this call created the file.
    fn ensure_store(&self, kind: RecordKind) -> Result<bool, StorageError> {
        let path = self.path_for(kind);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.root).map_err(|err| StorageError::io(&self.root, err))?;
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(StorageError::io(&path, err)),
        };
        let mut writer = line_writer(file);
        writer
            .write_record(kind.header())
            .map_err(|err| StorageError::csv(&path, err))?;
        writer.flush().map_err(|err| StorageError::io(&path, err))?;
        Ok(true)
    }
}

/// Rows end in CRLF, matching files produced by other CSV writers of the same stores.
fn line_writer(file: File) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file)
}
