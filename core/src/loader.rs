//! Service document discovery and parsing.
//!
//! [`load_service_documents`] reads every `*.yml`, `*.yaml`, and `*.json`
//! file directly inside the input directory. Files are sorted by service
//! identifier before parsing, so merge order, and with it first-writer-wins
//! resolution, does not depend on how the filesystem enumerates entries.
//!
//! Any unreadable, unparsable, or wrongly shaped document fails the whole
//! load; nothing is returned for partial input.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::document::{ComponentCategory, ServiceDocument, service_identifier};
use crate::error::LoadError;
use crate::observer::{MergeEvent, MergeObserver};

/// File extensions recognized as service documents.
pub const RECOGNIZED_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Loads all service documents from `dir`, ordered by service identifier.
///
/// Emits [`MergeEvent::FileLoaded`] per document and a final
/// [`MergeEvent::LoadFinished`].
///
/// # Errors
///
/// Returns [`LoadError::ReadDirectory`] if `dir` cannot be listed,
/// [`LoadError::DuplicateService`] if two files share a stem, and
/// [`LoadError::Read`], [`LoadError::Parse`], or [`LoadError::Malformed`]
/// naming the first offending file.
pub fn load_service_documents(
    dir: &Path,
    observer: &mut dyn MergeObserver,
) -> Result<Vec<ServiceDocument>, LoadError> {
    let files = discover_service_files(dir)?;

    let mut documents = Vec::with_capacity(files.len());
    for (service, path) in files {
        let document = load_service_document(&path)?;
        observer.on_event(&MergeEvent::FileLoaded {
            service: service.clone(),
            path: path.clone(),
        });
        documents.push(ServiceDocument::new(service, document).with_source(path));
    }

    observer.on_event(&MergeEvent::LoadFinished {
        count: documents.len(),
    });
    Ok(documents)
}

/// Lists recognized document files in `dir` as `(service, path)` pairs,
/// sorted by service identifier.
pub fn discover_service_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, LoadError> {
    let read_dir_err = |source| LoadError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if !path.is_file() || !has_recognized_extension(&path) {
            continue;
        }
        let service = service_identifier(&path)
            .ok_or_else(|| LoadError::Malformed {
                path: path.clone(),
                reason: "file name is not valid UTF-8".to_string(),
            })?
            .to_string();
        files.push((service, path));
    }

    files.sort();

    for pair in files.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(LoadError::DuplicateService {
                service: pair[0].0.clone(),
                first: pair[0].1.clone(),
                second: pair[1].1.clone(),
            });
        }
    }

    Ok(files)
}

/// Reads and parses a single document, checking its top-level shape.
pub fn load_service_document(path: &Path) -> Result<Value, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let document = parse_document(path, &raw)?;
    check_document_shape(&document).map_err(|reason| LoadError::Malformed {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(document)
}

fn parse_document(path: &Path, raw: &str) -> Result<Value, LoadError> {
    let parsed = if extension(path) == Some("json") {
        serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())
    } else {
        parse_yaml(raw).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses YAML and resolves `<<` merge keys into their enclosing mappings.
fn parse_yaml(raw: &str) -> Result<Value, serde_yaml::Error> {
    let mut value: Value = serde_yaml::from_str(raw)?;
    value.apply_merge()?;
    Ok(value)
}

/// Checks the sections the mergers read. Null sections count as absent.
fn check_document_shape(document: &Value) -> Result<(), String> {
    let Some(root) = document.as_mapping() else {
        return Err("document root must be a mapping".to_string());
    };

    if let Some(paths) = section(root.get("paths")) {
        let paths = paths
            .as_mapping()
            .ok_or_else(|| "'paths' must be a mapping".to_string())?;
        if let Some(key) = paths.keys().find(|key| !key.is_string()) {
            return Err(format!("'paths' contains a non-string key: {key:?}"));
        }
    }

    if let Some(components) = section(root.get("components")) {
        let components = components
            .as_mapping()
            .ok_or_else(|| "'components' must be a mapping".to_string())?;
        for category in ComponentCategory::ALL {
            let Some(entries) = section(components.get(category.as_str())) else {
                continue;
            };
            let entries = entries
                .as_mapping()
                .ok_or_else(|| format!("'components.{category}' must be a mapping"))?;
            if let Some(key) = entries.keys().find(|key| !key.is_string()) {
                return Err(format!(
                    "'components.{category}' contains a non-string key: {key:?}"
                ));
            }
        }
    }

    if section(root.get("tags")).is_some_and(|tags| !tags.is_sequence()) {
        return Err("'tags' must be a sequence".to_string());
    }

    Ok(())
}

fn section(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn has_recognized_extension(path: &Path) -> bool {
    extension(path).is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext))
}
