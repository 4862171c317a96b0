#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use crimewatch_kernel_contracts::SchemaVersion;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::encoder::CategoryEncoder;
use crate::estimator::{LinearEstimator, ESTIMATOR_SCHEMA_VERSION};

pub const ESTIMATOR_FILE_NAME: &str = "estimator.json";
pub const ENCODER_FILE_NAME: &str = "encoder.json";
pub const ENCODER_SCHEMA_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model artifact '{}' unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact '{}' is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact '{}' has unsupported schema_version={got}", .path.display())]
    UnsupportedSchema { path: PathBuf, got: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct EncoderDocument {
    schema_version: SchemaVersion,
    encoder: CategoryEncoder,
}

/// Location of the two persisted model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn estimator_path(&self) -> PathBuf {
        self.dir.join(ESTIMATOR_FILE_NAME)
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.dir.join(ENCODER_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.estimator_path().is_file() && self.encoder_path().is_file()
    }

    /// Reads both artifacts from disk. Nothing is cached between calls.
    pub fn load(&self) -> Result<(LinearEstimator, CategoryEncoder), ArtifactError> {
        let estimator_path = self.estimator_path();
        let estimator: LinearEstimator = read_json(&estimator_path)?;
        if estimator.schema_version != ESTIMATOR_SCHEMA_VERSION {
            return Err(ArtifactError::UnsupportedSchema {
                path: estimator_path,
                got: estimator.schema_version.0,
            });
        }
        let encoder_path = self.encoder_path();
        let doc: EncoderDocument = read_json(&encoder_path)?;
        if doc.schema_version != ENCODER_SCHEMA_VERSION {
            return Err(ArtifactError::UnsupportedSchema {
                path: encoder_path,
                got: doc.schema_version.0,
            });
        }
        Ok((estimator, doc.encoder))
    }

    pub fn persist(
        &self,
        estimator: &LinearEstimator,
        encoder: &CategoryEncoder,
    ) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Unavailable {
            path: self.dir.clone(),
            source,
        })?;
        write_json(&self.estimator_path(), estimator)?;
        let doc = EncoderDocument {
            schema_version: ENCODER_SCHEMA_VERSION,
            encoder: encoder.clone(),
        };
        write_json(&self.encoder_path(), &doc)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let serialized = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &serialized).map_err(|source| ArtifactError::Unavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(tmp, path)
}
