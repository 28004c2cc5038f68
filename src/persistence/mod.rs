//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Atomic replace (write tmp, then rename over the save)
//! - Typed errors so callers can fall back to defaults

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// Persistence failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Wrapper written around every persisted payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    /// Unix seconds when written
    pub saved_at: i64,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            version: FORMAT_VERSION,
            saved_at: chrono::Utc::now().timestamp(),
            payload,
        }
    }
}

/// Serialize `value` into an envelope string
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&Envelope::new(value))?)
}

/// Parse an envelope string and check its version
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, PersistError> {
    let envelope: Envelope<T> = serde_json::from_str(json)?;
    if envelope.version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: envelope.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(envelope.payload)
}

/// Write `value` to `path`, replacing any previous save atomically
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let json = to_json(value)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a value written by [`save`]
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}

/// Load, or fall back to the default when missing or unreadable
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load(path) {
        Ok(value) => value,
        Err(PersistError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No save at {}, using defaults", path.display());
            T::default()
        }
        Err(e) => {
            log::info!("Ignoring save at {}: {}", path.display(), e);
            T::default()
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: u32,
        b: String,
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tenpad-test-{}", std::process::id()));
        dir.join(name)
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch("sample.json");
        let value = Sample {
            a: 7,
            b: "seven".into(),
        };
        save(&path, &value).unwrap();
        assert_eq!(load::<Sample>(&path).unwrap(), value);
        assert!(!tmp_path(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let json = r#"{"version": 99, "saved_at": 0, "payload": {"a": 1, "b": ""}}"#;
        match from_json::<Sample>(json) {
            Err(PersistError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, FORMAT_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_or_corrupt_falls_back() {
        let missing = scratch("missing.json");
        assert_eq!(load_or_default::<Sample>(&missing), Sample::default());

        let corrupt = scratch("corrupt.json");
        fs::create_dir_all(corrupt.parent().unwrap()).unwrap();
        fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(load::<Sample>(&corrupt), Err(PersistError::Json(_))));
        assert_eq!(load_or_default::<Sample>(&corrupt), Sample::default());
        let _ = fs::remove_file(&corrupt);
    }
}
