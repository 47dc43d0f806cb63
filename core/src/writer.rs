//! Serialization of the unified document.
//!
//! The document is rendered completely in memory before the destination is
//! opened, so a rendering failure never leaves a file behind. Key order is
//! the insertion order of the tree.

use std::path::Path;

use serde_yaml::Value;

use crate::document::FrozenDocument;
use crate::error::WriteError;

/// Text format of the written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    /// Picks the format from the destination extension: `.json` gives JSON,
    /// anything else YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        }
    }
}

/// Renders a document tree in the requested format.
pub fn render_document(document: &Value, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut raw| {
                raw.push('\n');
                raw
            })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

/// Writes the frozen document to `path`.
///
/// # Errors
///
/// Returns [`WriteError::DestinationMissing`] when the parent directory does
/// not exist, [`WriteError::PermissionDenied`] when the file cannot be
/// created or replaced, and [`WriteError::Other`] for everything else,
/// including rendering failures.
pub fn write_document(document: &FrozenDocument, path: &Path) -> Result<(), WriteError> {
    let rendered = render_document(document.as_value(), OutputFormat::from_path(path)).map_err(
        |message| WriteError::Other {
            path: path.to_path_buf(),
            message,
        },
    )?;
    std::fs::write(path, rendered).map_err(|err| WriteError::from_io(path, err))
}
