//! End-to-end merge run: load, merge, validate, write.

use std::path::PathBuf;

use crate::config::MergeConfig;
use crate::document::{ComponentCategory, FrozenDocument, MergeStats};
use crate::error::Result;
use crate::loader::load_service_documents;
use crate::merge::merge_services;
use crate::observer::{MergeEvent, MergeObserver};
use crate::validate::validate_document;
use crate::writer::write_document;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: MergeStats,
    /// Path count in the written document.
    pub paths: usize,
    /// Component count per category in the written document.
    pub components: Vec<(ComponentCategory, usize)>,
    pub tags: usize,
    pub validated: bool,
    pub output_file: PathBuf,
}

impl RunSummary {
    fn new(document: &FrozenDocument, config: &MergeConfig) -> Self {
        let root = document.as_value();
        let count = |value: &serde_yaml::Value| value.as_mapping().map_or(0, |m| m.len());
        Self {
            stats: *document.stats(),
            paths: count(&root["paths"]),
            components: ComponentCategory::ALL
                .into_iter()
                .map(|category| (category, count(&root["components"][category.as_str()])))
                .collect(),
            tags: root["tags"].as_sequence().map_or(0, Vec::len),
            validated: config.validate,
            output_file: config.output_file.clone(),
        }
    }
}

/// Loads and merges the configured input, without validating or writing.
pub fn build_unified_document(
    config: &MergeConfig,
    observer: &mut dyn MergeObserver,
) -> Result<FrozenDocument> {
    let services = load_service_documents(&config.input_directory, observer)?;
    Ok(merge_services(&services, observer).freeze())
}

/// Runs the whole pipeline for `config`.
///
/// Nothing is written unless loading, merging, and (when enabled)
/// validation all succeed.
///
/// # Errors
///
/// Returns the first fatal [`MergeError`](crate::MergeError): a load
/// failure, the first validation diagnostic, or a classified write failure.
pub fn run_merge(config: &MergeConfig, observer: &mut dyn MergeObserver) -> Result<RunSummary> {
    let document = build_unified_document(config, observer)?;

    if config.validate {
        observer.on_event(&MergeEvent::ValidationStarted);
        if let Some(error) = validate_document(document.as_value()).into_iter().next() {
            return Err(error.into());
        }
        observer.on_event(&MergeEvent::ValidationFinished);
    }

    observer.on_event(&MergeEvent::WriteStarted {
        path: config.output_file.clone(),
    });
    write_document(&document, &config.output_file)?;
    observer.on_event(&MergeEvent::WriteFinished {
        path: config.output_file.clone(),
    });

    Ok(RunSummary::new(&document, config))
}
