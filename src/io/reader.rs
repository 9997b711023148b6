use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::io::format::{json, yaml};
use crate::io::{Format, IoError};

/// Reads exactly one document.
pub fn read_value<R: Read>(reader: R, format: Format) -> Result<Value, IoError> {
    match format {
        Format::Json => json::read_json(reader),
        Format::Yaml => yaml::read_yaml(reader),
    }
}

/// Reads one document from a file whose format follows its extension.
pub fn read_path(path: &Path) -> Result<Value, IoError> {
    let format = crate::io::resolve_input_format(None, Some(path))?;
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_value(file, format)
}
