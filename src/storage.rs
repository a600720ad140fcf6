use crate::error::FetchError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Render `value` canonically: keys sorted at every depth, 4-space indent.
///
/// The same input always yields the same bytes.
pub fn to_canonical_bytes(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    sorted(value).serialize(&mut ser)?;
    Ok(buf)
}

// Rebuild objects in key order so the output does not depend on map flavour.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), sorted(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Save a response body as `dir/name` in canonical JSON form.
pub fn save_json<P: AsRef<Path>>(dir: P, name: &str, value: &Value) -> Result<PathBuf, FetchError> {
    let path = dir.as_ref().join(name);
    let bytes = to_canonical_bytes(value)
        .map_err(|e| FetchError::fs(&path, std::io::Error::other(e)))?;
    fs::write(&path, bytes).map_err(|e| FetchError::fs(&path, e))?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Make sure `dir` exists and is empty. Anything already there is removed.
pub fn prepare_workspace<P: AsRef<Path>>(dir: P) -> Result<(), FetchError> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(|e| FetchError::fs(dir, e))?;
    } else if dir.exists() {
        fs::remove_file(dir).map_err(|e| FetchError::fs(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| FetchError::fs(dir, e))?;
    log::info!("output directory ready: {}", dir.display());
    Ok(())
}
