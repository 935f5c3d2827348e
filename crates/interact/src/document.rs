//! Field lists and defaults read from JSON or TOML files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use interact_spec::FieldSpec;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A session described in one file.
///
/// `groups` maps loader tokens to child field lists and serves as the
/// session's loader.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDocument {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<FieldSpec>>,
}

impl FieldDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let document: Self = read_document(path)?;
        debug!(
            path = %path.display(),
            fields = document.fields.len(),
            groups = document.groups.len(),
            "loaded field document"
        );
        Ok(document)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Reads a flat name → value map of configured defaults.
pub fn load_defaults(path: &Path) -> Result<Map<String, Value>, DocumentError> {
    read_document(path)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_toml(path) {
        toml::from_str(&raw).map_err(|source| DocumentError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&raw).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
