#![forbid(unsafe_code)]

use crate::common::{reject_line_breaks, require_present};
use crate::{require_field, ContractViolation, Validate};

/// One row of the credential store. The password is kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl CredentialRecord {
    pub fn v1(username: String, password: String, email: String) -> Result<Self, ContractViolation> {
        let r = Self {
            username,
            password,
            email,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for CredentialRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        require_present("username", &self.username)?;
        reject_line_breaks("username", &self.username)?;
        require_present("password", &self.password)?;
        require_present("email", &self.email)?;
        reject_line_breaks("email", &self.email)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Principal {
    username: String,
}

impl Principal {
    pub fn from_credential(record: &CredentialRecord) -> Self {
        Self {
            username: record.username.clone(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// What a browser session currently carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionIdentity {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl SessionIdentity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionIdentity::Authenticated(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionIdentity::Anonymous => None,
            SessionIdentity::Authenticated(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegisterRequest {
    pub fn from_fields(
        username: Option<String>,
        password: Option<String>,
        email: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            username: require_field("username", username)?,
            password: require_field("password", password)?,
            email: require_field("email", email)?,
        };
        r.validate()?;
        Ok(r)
    }

    pub fn into_record(self) -> CredentialRecord {
        CredentialRecord {
            username: self.username,
            password: self.password,
            email: self.email,
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        reject_line_breaks("username", &self.username)?;
        reject_line_breaks("email", &self.email)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_fields(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ContractViolation> {
        Ok(Self {
            username: require_field("username", username)?,
            password: require_field("password", password)?,
        })
    }
}
