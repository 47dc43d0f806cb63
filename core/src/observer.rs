//! Progress notifications emitted by the merge pipeline.
//!
//! The engine never prints. It reports each checkpoint as a [`MergeEvent`]
//! to a caller-supplied [`MergeObserver`], so the same run can feed a
//! console logger, a test recorder, or nothing at all.

use std::fmt;
use std::path::PathBuf;

use crate::document::ComponentCategory;

/// Why a route entry was not added to the unified document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSkipReason {
    /// The unprefixed route string is already a key in the unified paths.
    UnprefixedDuplicate,
    /// The prefixed route string is already a key in the unified paths.
    PrefixedDuplicate,
}

/// A checkpoint reached during a merge run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEvent {
    FileLoaded {
        service: String,
        path: PathBuf,
    },
    LoadFinished {
        count: usize,
    },
    ServiceStarted {
        service: String,
    },
    PathAdded {
        service: String,
        path: String,
    },
    PathSkipped {
        service: String,
        path: String,
        reason: PathSkipReason,
    },
    ComponentAdded {
        service: String,
        category: ComponentCategory,
        name: String,
    },
    /// An identical definition already exists under the same name.
    ComponentIdentical {
        service: String,
        category: ComponentCategory,
        name: String,
    },
    /// A conflicting definition was stored under a namespaced alias.
    ComponentAliased {
        service: String,
        category: ComponentCategory,
        name: String,
        alias: String,
    },
    /// The namespaced alias was itself taken by a different definition.
    ComponentSkipped {
        service: String,
        category: ComponentCategory,
        name: String,
        alias: String,
    },
    /// An entry under `paths` or a component category whose key is not a
    /// string. It cannot be namespaced, so it is left out.
    KeyIgnored {
        service: String,
        section: String,
        key: String,
    },
    /// A `components` category outside the merged set.
    CategoryIgnored {
        service: String,
        category: String,
    },
    TagAdded {
        service: String,
        name: Option<String>,
    },
    ValidationStarted,
    ValidationFinished,
    WriteStarted {
        path: PathBuf,
    },
    WriteFinished {
        path: PathBuf,
    },
}

impl MergeEvent {
    /// Returns `true` for events that describe a fallback taken because of a
    /// name collision.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            MergeEvent::PathSkipped { .. }
                | MergeEvent::ComponentAliased { .. }
                | MergeEvent::ComponentSkipped { .. }
                | MergeEvent::KeyIgnored { .. }
        )
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeEvent::FileLoaded { path, .. } => {
                write!(f, "Loading file: {}", path.display())
            }
            MergeEvent::LoadFinished { count } => write!(f, "Loaded {count} OpenAPI files."),
            MergeEvent::ServiceStarted { service } => {
                write!(f, "Merging service: {service}")
            }
            MergeEvent::PathAdded { path, .. } => write!(f, "Added path: {path}"),
            MergeEvent::PathSkipped {
                path,
                reason: PathSkipReason::UnprefixedDuplicate,
                ..
            } => write!(
                f,
                "Duplicate un-prefixed path detected for {path}. Skipping."
            ),
            MergeEvent::PathSkipped {
                path,
                reason: PathSkipReason::PrefixedDuplicate,
                ..
            } => write!(f, "Duplicate path detected for {path}. Skipping."),
            MergeEvent::ComponentAdded { category, name, .. } => {
                write!(f, "Added component: {category}/{name}")
            }
            MergeEvent::ComponentIdentical { category, name, .. } => write!(
                f,
                "Identical component already exists: {category}/{name}. Skipping."
            ),
            MergeEvent::ComponentAliased {
                category, alias, ..
            } => write!(
                f,
                "Conflict detected. Added component with prefixed name: {category}/{alias}"
            ),
            MergeEvent::ComponentSkipped {
                category,
                name,
                alias,
                ..
            } => write!(
                f,
                "Conflict detected for {category}/{name}, but {category}/{alias} is already taken. Skipping."
            ),
            MergeEvent::KeyIgnored {
                service,
                section,
                key,
            } => write!(
                f,
                "Ignoring entry with non-string key {key} under {section} in {service}"
            ),
            MergeEvent::CategoryIgnored { service, category } => write!(
                f,
                "Ignoring unsupported component category '{category}' in {service}"
            ),
            MergeEvent::TagAdded { name, .. } => match name {
                Some(name) => write!(f, "Added tag: {name}"),
                None => f.write_str("Added unnamed tag"),
            },
            MergeEvent::ValidationStarted => f.write_str("Validating OpenAPI specification..."),
            MergeEvent::ValidationFinished => f.write_str("Validation successful."),
            MergeEvent::WriteStarted { path } => {
                write!(f, "Writing output to file: {}", path.display())
            }
            MergeEvent::WriteFinished { path } => {
                write!(f, "Successfully wrote output to {}", path.display())
            }
        }
    }
}

/// Receives merge events in the order they occur.
pub trait MergeObserver {
    fn on_event(&mut self, event: &MergeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MergeObserver for NoopObserver {
    fn on_event(&mut self, _event: &MergeEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Vec<MergeEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events that describe collision fallbacks.
    pub fn warnings(&self) -> impl Iterator<Item = &MergeEvent> {
        self.events.iter().filter(|event| event.is_warning())
    }
}

impl MergeObserver for RecordingObserver {
    fn on_event(&mut self, event: &MergeEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards events to `tracing`.
///
/// Collision fallbacks and ignored keys are logged at `warn`, identical-component skips at
/// `debug`, everything else at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MergeObserver for TracingObserver {
    fn on_event(&mut self, event: &MergeEvent) {
        match event {
            MergeEvent::FileLoaded { service, path } => {
                tracing::info!(service = %service, path = %path.display(), "{event}");
            }
            MergeEvent::ServiceStarted { service }
            | MergeEvent::PathAdded { service, .. }
            | MergeEvent::TagAdded { service, .. } => {
                tracing::info!(service = %service, "{event}");
            }
            MergeEvent::ComponentAdded {
                service, category, ..
            } => {
                tracing::info!(service = %service, category = %category, "{event}");
            }
            MergeEvent::ComponentIdentical {
                service, category, ..
            } => {
                tracing::debug!(service = %service, category = %category, "{event}");
            }
            MergeEvent::PathSkipped { service, path, .. } => {
                tracing::warn!(service = %service, path = %path, "{event}");
            }
            MergeEvent::ComponentAliased {
                service,
                category,
                name,
                ..
            }
            | MergeEvent::ComponentSkipped {
                service,
                category,
                name,
                ..
            } => {
                tracing::warn!(service = %service, category = %category, name = %name, "{event}");
            }
            MergeEvent::KeyIgnored {
                service, section, ..
            } => {
                tracing::warn!(service = %service, section = %section, "{event}");
            }
            MergeEvent::CategoryIgnored { service, .. } => {
                tracing::debug!(service = %service, "{event}");
            }
            MergeEvent::LoadFinished { .. }
            | MergeEvent::ValidationStarted
            | MergeEvent::ValidationFinished
            | MergeEvent::WriteStarted { .. }
            | MergeEvent::WriteFinished { .. } => {
                tracing::info!("{event}");
            }
        }
    }
}
