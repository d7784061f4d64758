// File: src/repositories/json/mod.rs
//
// Flat JSON documents rewritten wholesale on every change. Writes go to a temp
// file in the same directory and are renamed over the target, so a crash mid-write
// leaves the previous document intact.

pub mod live_state;
pub mod stream_registry;

pub use live_state::JsonLiveStateRepository;
pub use stream_registry::JsonStreamRegistry;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::Error;

pub(crate) fn read_json_or_default<T>(path: &Path) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(T::default()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
