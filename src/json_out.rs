use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExtractError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn to_json_string<T: Serialize>(value: &T) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ExtractError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
