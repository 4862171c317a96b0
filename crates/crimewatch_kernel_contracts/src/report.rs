#![forbid(unsafe_code)]

use crate::{require_field, ContractViolation};

/// Literal stored in the attachment column when nothing was uploaded.
pub const NO_ATTACHMENT_SENTINEL: &str = "No Attachment";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttachmentRef {
    Stored(String),
    Absent,
}

impl AttachmentRef {
    pub fn as_field(&self) -> &str {
        match self {
            AttachmentRef::Stored(path) => path,
            AttachmentRef::Absent => NO_ATTACHMENT_SENTINEL,
        }
    }

    pub fn from_field(raw: &str) -> Self {
        if raw == NO_ATTACHMENT_SENTINEL || raw.is_empty() {
            AttachmentRef::Absent
        } else {
            AttachmentRef::Stored(raw.to_string())
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            AttachmentRef::Stored(path) => Some(path),
            AttachmentRef::Absent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CrimeReportRecord {
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub crime_type: String,
    pub description: String,
    pub attachment: AttachmentRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeReportRequest {
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub crime_type: String,
    pub description: String,
}

impl CrimeReportRequest {
    pub fn from_fields(
        name: Option<String>,
        phone_number: Option<String>,
        location: Option<String>,
        crime_type: Option<String>,
        description: Option<String>,
    ) -> Result<Self, ContractViolation> {
        Ok(Self {
            name: require_field("name", name)?,
            phone_number: require_field("phone_number", phone_number)?,
            location: require_field("location", location)?,
            crime_type: require_field("crime_type", crime_type)?,
            description: require_field("description", description)?,
        })
    }

    pub fn into_record(self, attachment: AttachmentRef) -> CrimeReportRecord {
        CrimeReportRecord {
            name: self.name,
            phone_number: self.phone_number,
            location: self.location,
            crime_type: self.crime_type,
            description: self.description,
            attachment,
        }
    }
}
