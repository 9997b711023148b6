pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use error::IoError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(IoError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

pub fn resolve_input_format(
    explicit: Option<Format>,
    input: Option<&Path>,
) -> Result<Format, IoError> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    let Some(path) = input else {
        return Err(IoError::UnresolvedFormat { kind: "input" });
    };
    format_from_path(path).ok_or_else(|| IoError::UnsupportedPathExtension {
        kind: "input",
        path: path.to_string_lossy().into_owned(),
    })
}

fn format_from_path(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        _ => None,
    }
}
