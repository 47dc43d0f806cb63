//! Structural validation of the unified document.
//!
//! Checks the merged tree against the OpenAPI 3.x structural rules that a
//! merge can break: required sections, field types, path and response keys,
//! parameter shape, operation ID uniqueness, component names, and local
//! `$ref` targets. Validation stops at the first problem found.
//!
//! # Examples
//!
//! ```
//! use openapi_merge_core::*;
//!
//! let document = UnifiedDocument::new().freeze();
//! assert!(validate_document(document.as_value()).is_empty());
//!
//! // A dangling reference is reported.
//! let broken: serde_yaml::Value = serde_yaml::from_str(r##"
//! openapi: 3.1.0
//! info: {title: t, version: "1"}
//! paths:
//!   /a:
//!     get:
//!       responses:
//!         "200": {$ref: "#/components/responses/Missing"}
//! "##).unwrap();
//! let errors = validate_document(&broken);
//! assert!(matches!(errors[0], ValidationError::UnresolvedReference { .. }));
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

static COMPONENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("static regex must compile"));
static RESPONSE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-5](XX|[0-9]{2})$").expect("static regex must compile"));

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];
const PATH_ITEM_FIELDS: [&str; 5] = ["$ref", "summary", "description", "servers", "parameters"];
const PARAMETER_LOCATIONS: [&str; 4] = ["query", "header", "path", "cookie"];

/// Structural problems in a merged document.
///
/// Locations are dotted paths from the document root, e.g.
/// `paths./users/items.get`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The document root is not a mapping.
    #[error("document root must be a mapping")]
    RootNotMapping,
    /// A required field is absent.
    #[error("missing required field: {0}")]
    MissingField(String),
    /// A field holds a value of the wrong type.
    #[error("'{field}' must be {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },
    /// The `openapi` field is not a 3.x version.
    #[error("unsupported openapi version: {0}")]
    UnsupportedVersion(String),
    /// A `paths` key does not start with `/`.
    #[error("path must start with '/': {0}")]
    InvalidPath(String),
    /// A path item carries a key that is neither an operation nor a known field.
    #[error("unknown field '{field}' in path item '{path}'")]
    UnknownPathItemField { path: String, field: String },
    /// A `responses` key is not a status code, range, `default`, or extension.
    #[error("invalid response code '{code}' at {at}")]
    InvalidResponseCode { at: String, code: String },
    /// A parameter's `in` is not query, header, path, or cookie.
    #[error("invalid parameter location '{location}' at {at}")]
    InvalidParameterLocation { at: String, location: String },
    /// A path parameter is not marked `required: true`.
    #[error("path parameter '{name}' at {at} must be required")]
    PathParameterNotRequired { at: String, name: String },
    /// Two operations share an `operationId`.
    #[error("duplicate operationId: {0}")]
    DuplicateOperationId(String),
    /// A component name contains characters outside `[a-zA-Z0-9._-]`.
    #[error("invalid component name '{name}' in components.{category}")]
    InvalidComponentName { category: String, name: String },
    /// A local `$ref` points at nothing in the document.
    #[error("unresolved reference '{reference}' at {at}")]
    UnresolvedReference { at: String, reference: String },
}

/// Validates a full OpenAPI document tree.
///
/// Returns an empty vector when the document is valid, otherwise a vector
/// holding the first problem found.
pub fn validate_document(document: &Value) -> Vec<ValidationError> {
    match check_document(document) {
        Ok(()) => Vec::new(),
        Err(error) => vec![error],
    }
}

type Check = Result<(), ValidationError>;

fn check_document(document: &Value) -> Check {
    let root = document
        .as_mapping()
        .ok_or(ValidationError::RootNotMapping)?;

    check_version(root)?;
    check_info(root)?;
    check_servers(root)?;
    check_tags(root)?;
    check_paths(root)?;
    check_components(root)?;

    let mut location = Vec::new();
    check_references(document, document, &mut location)
}

fn check_version(root: &Mapping) -> Check {
    let version = required(root, "openapi", "openapi")?;
    let version = expect_str(version, "openapi")?;
    if !version.starts_with("3.") {
        return Err(ValidationError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

fn check_info(root: &Mapping) -> Check {
    let info = expect_mapping(required(root, "info", "info")?, "info")?;
    expect_str(required(info, "title", "info.title")?, "info.title")?;
    expect_str(required(info, "version", "info.version")?, "info.version")?;
    Ok(())
}

fn check_servers(root: &Mapping) -> Check {
    let Some(servers) = root.get("servers") else {
        return Ok(());
    };
    let servers = expect_sequence(servers, "servers")?;
    for (idx, server) in servers.iter().enumerate() {
        let at = format!("servers.{idx}");
        let server = expect_mapping(server, &at)?;
        let url_at = format!("{at}.url");
        expect_str(required(server, "url", &url_at)?, &url_at)?;
    }
    Ok(())
}

fn check_tags(root: &Mapping) -> Check {
    let Some(tags) = root.get("tags") else {
        return Ok(());
    };
    let tags = expect_sequence(tags, "tags")?;
    for (idx, tag) in tags.iter().enumerate() {
        let at = format!("tags.{idx}");
        let tag = expect_mapping(tag, &at)?;
        let name_at = format!("{at}.name");
        expect_str(required(tag, "name", &name_at)?, &name_at)?;
    }
    Ok(())
}

fn check_paths(root: &Mapping) -> Check {
    let paths = expect_mapping(required(root, "paths", "paths")?, "paths")?;
    let mut operation_ids: HashSet<&str> = HashSet::new();

    for (key, item) in paths {
        let path = key.as_str().ok_or_else(|| ValidationError::InvalidType {
            field: format!("paths.{}", render_key(key)),
            expected: "a string key",
        })?;
        if !path.starts_with('/') {
            return Err(ValidationError::InvalidPath(path.to_string()));
        }

        let at = format!("paths.{path}");
        let item = expect_mapping(item, &at)?;
        for (field, value) in item {
            let field_name = render_key(field);
            if is_extension_key(field) || PATH_ITEM_FIELDS.contains(&field_name.as_str()) {
                continue;
            }
            if !HTTP_METHODS.contains(&field_name.as_str()) {
                return Err(ValidationError::UnknownPathItemField {
                    path: path.to_string(),
                    field: field_name,
                });
            }
            check_operation(value, &format!("{at}.{field_name}"), &mut operation_ids)?;
        }

        if let Some(parameters) = item.get("parameters") {
            check_parameters(parameters, &format!("{at}.parameters"))?;
        }
    }

    Ok(())
}

fn check_operation<'a>(
    operation: &'a Value,
    at: &str,
    operation_ids: &mut HashSet<&'a str>,
) -> Check {
    let operation = expect_mapping(operation, at)?;

    if let Some(id) = operation.get("operationId") {
        let id = expect_str(id, &format!("{at}.operationId"))?;
        if !operation_ids.insert(id) {
            return Err(ValidationError::DuplicateOperationId(id.to_string()));
        }
    }

    if let Some(responses) = operation.get("responses") {
        let responses_at = format!("{at}.responses");
        let responses = expect_mapping(responses, &responses_at)?;
        for code in responses.keys() {
            if !is_extension_key(code) && !is_response_code(code) {
                return Err(ValidationError::InvalidResponseCode {
                    at: responses_at,
                    code: render_key(code),
                });
            }
        }
    }

    if let Some(parameters) = operation.get("parameters") {
        check_parameters(parameters, &format!("{at}.parameters"))?;
    }

    Ok(())
}

/// `x-` keys are specification extensions and may appear next to codes.
fn is_extension_key(key: &Value) -> bool {
    key.as_str().is_some_and(|key| key.starts_with("x-"))
}

fn is_response_code(code: &Value) -> bool {
    match code {
        Value::String(code) => code == "default" || RESPONSE_CODE_RE.is_match(code),
        Value::Number(number) => number.as_u64().is_some_and(|n| (100..=599).contains(&n)),
        _ => false,
    }
}

fn check_parameters(parameters: &Value, at: &str) -> Check {
    let parameters = expect_sequence(parameters, at)?;
    for (idx, parameter) in parameters.iter().enumerate() {
        let at = format!("{at}.{idx}");
        let parameter = expect_mapping(parameter, &at)?;
        if parameter.contains_key("$ref") {
            continue;
        }

        let name_at = format!("{at}.name");
        let name = expect_str(required(parameter, "name", &name_at)?, &name_at)?;
        let in_at = format!("{at}.in");
        let location = expect_str(required(parameter, "in", &in_at)?, &in_at)?;
        if !PARAMETER_LOCATIONS.contains(&location) {
            return Err(ValidationError::InvalidParameterLocation {
                at,
                location: location.to_string(),
            });
        }
        if location == "path" && parameter.get("required") != Some(&Value::Bool(true)) {
            return Err(ValidationError::PathParameterNotRequired {
                at,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_components(root: &Mapping) -> Check {
    let Some(components) = root.get("components") else {
        return Ok(());
    };
    let components = expect_mapping(components, "components")?;
    for (category, entries) in components {
        let category = render_key(category);
        let entries = expect_mapping(entries, &format!("components.{category}"))?;
        for name in entries.keys() {
            let valid = name.as_str().is_some_and(|name| COMPONENT_NAME_RE.is_match(name));
            if !valid {
                return Err(ValidationError::InvalidComponentName {
                    category,
                    name: render_key(name),
                });
            }
        }
    }
    Ok(())
}

fn check_references(root: &Value, node: &Value, location: &mut Vec<String>) -> Check {
    match node {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                location.push(render_key(key));
                if key.as_str() == Some("$ref") {
                    check_reference(root, value, location)?;
                } else {
                    check_references(root, value, location)?;
                }
                location.pop();
            }
        }
        Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                location.push(idx.to_string());
                check_references(root, item, location)?;
                location.pop();
            }
        }
        Value::Tagged(tagged) => check_references(root, &tagged.value, location)?,
        _ => {}
    }
    Ok(())
}

fn check_reference(root: &Value, reference: &Value, location: &[String]) -> Check {
    let at = location.join(".");
    let Some(reference) = reference.as_str() else {
        return Err(ValidationError::InvalidType {
            field: at,
            expected: "a string",
        });
    };
    // External documents are out of reach; only local pointers are resolved.
    let Some(pointer) = reference.strip_prefix('#') else {
        return Ok(());
    };
    if resolve_pointer(root, pointer).is_none() {
        return Err(ValidationError::UnresolvedReference {
            at,
            reference: reference.to_string(),
        });
    }
    Ok(())
}

/// Resolves a JSON pointer (the part of a `$ref` after `#`) within `root`.
pub fn resolve_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    let pointer = pointer.strip_prefix('/')?;

    pointer.split('/').try_fold(root, |node, token| {
        let token = token.replace("~1", "/").replace("~0", "~");
        match node {
            Value::Mapping(mapping) => mapping.get(token.as_str()).or_else(|| {
                token
                    .parse::<u64>()
                    .ok()
                    .and_then(|number| mapping.get(Value::from(number)))
            }),
            Value::Sequence(items) => token.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        }
    })
}

fn required<'a>(mapping: &'a Mapping, key: &str, at: &str) -> Result<&'a Value, ValidationError> {
    mapping
        .get(key)
        .ok_or_else(|| ValidationError::MissingField(at.to_string()))
}

fn expect_mapping<'a>(value: &'a Value, at: &str) -> Result<&'a Mapping, ValidationError> {
    value.as_mapping().ok_or_else(|| ValidationError::InvalidType {
        field: at.to_string(),
        expected: "a mapping",
    })
}

fn expect_sequence<'a>(value: &'a Value, at: &str) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_sequence().ok_or_else(|| ValidationError::InvalidType {
        field: at.to_string(),
        expected: "a sequence",
    })
}

fn expect_str<'a>(value: &'a Value, at: &str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| ValidationError::InvalidType {
        field: at.to_string(),
        expected: "a string",
    })
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => "<complex key>".to_string(),
    }
}
