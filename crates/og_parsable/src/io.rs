//! Synchronous filesystem access and JSON persistence.
//!
//! Two persistence flavors exist side by side:
//!
//! - the *encoded* form ([`save_to_json`] / [`load_from_json`]): the tagged
//!   map produced by [`encode`](crate::encode), a portable interchange
//!   format;
//! - the *pickled* form ([`save_pickled`] / [`load_pickled`]): a
//!   full-fidelity serde dump of the entire concrete value, including state
//!   the attribute taxonomy never declares. Reloadable only by a matching
//!   implementation/version, never an interchange format.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::encoded::EncodedMap;
use crate::errors::{ParseError, ParseResult};
use crate::parsable::{Parsable, decode, encode};

// -----------------------------------------------------------------------------
// File and directory access

/// Whether `path` points to an existing file or directory.
#[inline]
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Whether `path` points to an existing directory.
#[inline]
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Create `path` and every missing parent directory.
pub fn create_directories(path: impl AsRef<Path>) -> ParseResult<()> {
    fs::create_dir_all(path.as_ref())?;
    Ok(())
}

/// The platform temporary directory.
#[inline]
pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// A sortable local-time stamp for generated artifact paths, e.g.
/// `2026_08_06-14_03_59`.
pub fn timestamp_string() -> String {
    chrono::Local::now().format("%Y_%m_%d-%H_%M_%S").to_string()
}

// -----------------------------------------------------------------------------
// JSON R/W

/// Parse a JSON document from a string.
pub fn from_json_str(input: &str) -> ParseResult<Value> {
    Ok(serde_json::from_str(input)?)
}

/// Render a JSON value to a string.
pub fn to_json_str(value: &Value) -> ParseResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Read and parse a JSON file.
pub fn read_json_file(path: impl AsRef<Path>) -> ParseResult<Value> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a JSON value to a file as UTF-8 text.
pub fn write_json_file(path: impl AsRef<Path>, value: &Value) -> ParseResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), text)?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Pickled dumps

/// Full-fidelity dump of an entire value via its own serde implementation.
pub fn to_pickled_json<T: Serialize>(value: &T) -> ParseResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Reload a full-fidelity dump produced by [`to_pickled_json`].
pub fn from_pickled_json<T: DeserializeOwned>(input: &str) -> ParseResult<T> {
    Ok(serde_json::from_str(input)?)
}

// -----------------------------------------------------------------------------
// Object persistence

/// Force a `.json` suffix on the target filename.
fn json_path(path: &Path) -> PathBuf {
    path.with_extension("json")
}

/// Save the encoded form of `object` under `path`.
///
/// The target filename is forced to a `.json` suffix and missing parent
/// directories are created. Returns the full path of the written file.
pub fn save_to_json(object: &dyn Parsable, path: impl AsRef<Path>) -> ParseResult<PathBuf> {
    let full_path = json_path(path.as_ref());
    if let Some(parent) = full_path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_directories(parent)?;
    }
    let encoded = encode(object)?;
    write_json_file(&full_path, &Value::Object(encoded))?;
    Ok(full_path)
}

/// Save a full-fidelity pickled dump of `value` under `path`.
///
/// Same path handling as [`save_to_json`].
pub fn save_pickled<T: Serialize>(value: &T, path: impl AsRef<Path>) -> ParseResult<PathBuf> {
    let full_path = json_path(path.as_ref());
    if let Some(parent) = full_path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_directories(parent)?;
    }
    fs::write(&full_path, to_pickled_json(value)?)?;
    Ok(full_path)
}

/// Hydrate `object` from a JSON file written by [`save_to_json`].
///
/// # Errors
///
/// [`ParseError::FileNotFound`] when `path` does not exist.
pub fn load_from_json(object: &mut dyn Parsable, path: impl AsRef<Path>) -> ParseResult<()> {
    let path = path.as_ref();
    if !file_exists(path) {
        return Err(ParseError::FileNotFound {
            path: path.to_path_buf(),
        }
        .raised());
    }
    let raw = read_json_file(path)?;
    let map: EncodedMap = match raw {
        Value::Object(map) => map,
        other => {
            return Err(ParseError::TypeMismatch {
                attribute: path.display().to_string(),
                detail: format!("expected an encoded object document, got `{other}`"),
            }
            .raised());
        }
    };
    decode(object, &map)
}

/// Reload a pickled dump written by [`save_pickled`].
///
/// # Errors
///
/// [`ParseError::FileNotFound`] when `path` does not exist.
pub fn load_pickled<T: DeserializeOwned>(path: impl AsRef<Path>) -> ParseResult<T> {
    let path = path.as_ref();
    if !file_exists(path) {
        return Err(ParseError::FileNotFound {
            path: path.to_path_buf(),
        }
        .raised());
    }
    let text = fs::read_to_string(path)?;
    from_pickled_json(&text)
}
