//! Merge engine for per-service OpenAPI documents.
//!
//! Each input document describes one logical service. The engine folds them
//! into a single unified document:
//!
//! - [`load_service_documents`] reads every document in a directory,
//!   ordered by service identifier (the file stem).
//! - [`merge_services`] namespaces each service's routes under
//!   `/<service>`, merges components with first-writer-wins plus
//!   `<service>_<name>` aliases for conflicting definitions, and collects
//!   structurally distinct tags.
//! - [`validate_document`] checks the result for OpenAPI structural
//!   conformance.
//! - [`write_document`] serializes it, keeping key insertion order.
//!
//! [`run_merge`] chains all four. Progress is reported as [`MergeEvent`]s to
//! a [`MergeObserver`]; the engine itself never prints.
//!
//! # Example
//!
//! ```
//! use openapi_merge_core::*;
//!
//! let users: serde_yaml::Value = serde_yaml::from_str(r#"
//! paths:
//!   /items: {get: {responses: {"200": {description: ok}}}}
//! components:
//!   schemas:
//!     Widget: {type: object}
//! "#).unwrap();
//! let orders: serde_yaml::Value = serde_yaml::from_str(r#"
//! paths:
//!   /items: {get: {responses: {"200": {description: ok}}}}
//! components:
//!   schemas:
//!     Widget: {type: string}
//! "#).unwrap();
//!
//! let services = vec![
//!     ServiceDocument::new("orders", orders),
//!     ServiceDocument::new("users", users),
//! ];
//! let mut observer = RecordingObserver::new();
//! let document = merge_services(&services, &mut observer).freeze();
//!
//! let root = document.as_value();
//! assert!(root["paths"]["/orders/items"].is_mapping());
//! assert!(root["paths"]["/users/items"].is_mapping());
//! assert!(root["components"]["schemas"]["users_Widget"].is_mapping());
//! assert!(validate_document(root).is_empty());
//! assert_eq!(observer.warnings().count(), 1);
//! ```

mod config;
mod document;
mod error;
mod loader;
mod merge;
mod observer;
mod pipeline;
mod validate;
mod writer;

pub use config::{ConfigLayer, DEFAULT_OUTPUT_FILE, MergeConfig};
pub use document::{
    ComponentCategory, FrozenDocument, MergeStats, OPENAPI_VERSION, ServiceDocument,
    UNIFIED_DESCRIPTION, UNIFIED_SERVER_URL, UNIFIED_TITLE, UNIFIED_VERSION, UnifiedDocument,
    service_identifier,
};
pub use error::{
    ConfigError, EXIT_CONFIG_INVALID, EXIT_DESTINATION_MISSING, EXIT_LOAD_FAILED,
    EXIT_PERMISSION_DENIED, EXIT_SUCCESS, EXIT_VALIDATION_FAILED, EXIT_WRITE_FAILED, LoadError,
    MergeError, Result, WriteError,
};
pub use loader::{
    RECOGNIZED_EXTENSIONS, discover_service_files, load_service_document, load_service_documents,
};
pub use merge::{
    component_alias, merge_components, merge_paths, merge_service, merge_services, merge_tags,
    prefixed_path,
};
pub use observer::{
    MergeEvent, MergeObserver, NoopObserver, PathSkipReason, RecordingObserver, TracingObserver,
};
pub use pipeline::{RunSummary, build_unified_document, run_merge};
pub use validate::{ValidationError, resolve_pointer, validate_document};
pub use writer::{OutputFormat, render_document, write_document};
