use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::document::{self, LoadError};
use crate::refs::{find_invalid_refs, schema_registry};
use crate::report::ValidationReport;

const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "options", "head"];

/// Structural checks over the OpenAPI documents stored in one directory.
#[derive(Debug, Clone)]
pub struct OpenApiValidator {
    openapi_dir: PathBuf,
}

impl OpenApiValidator {
    pub fn new(openapi_dir: impl Into<PathBuf>) -> Self {
        OpenApiValidator {
            openapi_dir: openapi_dir.into(),
        }
    }

    pub fn openapi_dir(&self) -> &Path {
        &self.openapi_dir
    }

    fn spec_path(&self, name: &str) -> PathBuf {
        self.openapi_dir.join(format!("{}.yaml", name))
    }

    pub fn load_spec(&self, name: impl AsRef<str>) -> Result<Value, LoadError> {
        document::load_yaml(self.spec_path(name.as_ref()))
    }

    pub fn validate_spec(&self, name: impl AsRef<str>) -> ValidationReport {
        let name = name.as_ref();
        self.validate_spec_at(name, &self.spec_path(name))
    }

    fn validate_spec_at(&self, name: &str, path: &Path) -> ValidationReport {
        let spec = match document::load_yaml(path) {
            Ok(spec) => spec,
            Err(LoadError::NotFound { .. }) => {
                return ValidationReport::single(format!("OpenAPI spec file not found: {}", name))
            }
            Err(LoadError::Yaml { source, .. }) => {
                return ValidationReport::single(format!("Invalid YAML: {}", source))
            }
            Err(err) => return ValidationReport::single(err.to_string()),
        };
        let report = validate_document(&spec);
        if !report.is_valid() {
            warn!(spec = name, issues = report.issues.len(), "openapi spec has issues");
        }
        report
    }

    /// Validates every `*.yaml` then every `*.yml` spec. A `.yml` file sharing
    /// a stem with a `.yaml` file replaces its report in place.
    ///
    /// Fails with [`LoadError::NotFound`] when the directory itself is missing,
    /// rather than returning an empty map.
    pub fn validate_all_specs(&self) -> Result<IndexMap<String, ValidationReport>, LoadError> {
        let mut results = IndexMap::new();
        for extension in ["yaml", "yml"] {
            for path in document::files_with_extension(&self.openapi_dir, extension)? {
                let name = document::file_stem(&path);
                let report = self.validate_spec_at(&name, &path);
                results.insert(name, report);
            }
        }
        info!(
            dir = %self.openapi_dir.display(),
            specs = results.len(),
            "validated openapi specs"
        );
        Ok(results)
    }

    pub fn check_schema_refs(&self, name: impl AsRef<str>) -> Result<ValidationReport, LoadError> {
        check_schema_refs_in(self.spec_path(name.as_ref()))
    }
}

/// Runs the reference checker over one spec file of any location.
pub fn check_schema_refs_in(path: impl AsRef<Path>) -> Result<ValidationReport, LoadError> {
    let spec = document::load_yaml(path.as_ref())?;
    let registry = schema_registry(&spec);
    debug!(schemas = registry.len(), "checking local schema references");
    Ok(ValidationReport::new(find_invalid_refs(&spec, &registry, "")))
}

/// Required-key checks on an already parsed OpenAPI document.
pub fn validate_document(spec: &Value) -> ValidationReport {
    let Some(spec) = spec.as_object() else {
        return ValidationReport::single("Document root is not a mapping");
    };
    let mut report = ValidationReport::default();

    match spec.get("openapi") {
        None => report.push("Missing 'openapi' version field"),
        Some(Value::String(version)) if version.starts_with("3.") => {}
        Some(Value::String(version)) => {
            report.push(format!("Unsupported OpenAPI version: {}", version))
        }
        Some(version) => report.push(format!("Unsupported OpenAPI version: {}", version)),
    }

    match spec.get("info") {
        None => report.push("Missing 'info' section"),
        Some(info) => {
            if info.get("title").is_none() {
                report.push("Missing 'info.title' field");
            }
            if info.get("version").is_none() {
                report.push("Missing 'info.version' field");
            }
        }
    }

    match spec.get("paths") {
        None => report.push("Missing 'paths' section"),
        Some(paths) => {
            for (path, path_item) in paths.as_object().into_iter().flatten() {
                let Some(path_item) = path_item.as_object() else {
                    continue;
                };
                for (method, operation) in OperationsIterator::new(path_item) {
                    let method = method.to_uppercase();
                    if operation.get("operationId").is_none() {
                        report.push(format!("Missing operationId for {} {}", method, path));
                    }
                    if operation.get("responses").is_none() {
                        report.push(format!("Missing responses for {} {}", method, path));
                    }
                }
            }
        }
    }

    report
}

/// Yields the HTTP operations of a path item in document order, skipping
/// `parameters`, `summary` and other non-operation keys.
struct OperationsIterator<'a> {
    entries: serde_json::map::Iter<'a>,
}

impl<'a> OperationsIterator<'a> {
    fn new(path_item: &'a Map<String, Value>) -> Self {
        OperationsIterator {
            entries: path_item.iter(),
        }
    }
}

impl<'a> Iterator for OperationsIterator<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, value) = self.entries.next()?;
            let lowered = key.to_lowercase();
            if HTTP_METHODS.contains(&lowered.as_str()) {
                return Some((key.as_str(), value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn complete_document_is_valid() {
        let spec = json!({
            "openapi": "3.0.3",
            "info": {"title": "Content API", "version": "1.0.0"},
            "paths": {"/posts": {
                "parameters": [],
                "get": {"operationId": "listPosts", "responses": {"200": {}}}
            }}
        });
        assert!(validate_document(&spec).is_valid());
    }

    #[test]
    fn reports_missing_root_fields_in_order() {
        let report = validate_document(&json!({"info": {}}));
        assert_eq!(
            report.issues,
            vec![
                "Missing 'openapi' version field",
                "Missing 'info.title' field",
                "Missing 'info.version' field",
                "Missing 'paths' section",
            ]
        );
    }

    #[test]
    fn rejects_non_3x_versions() {
        let base = |version: Value| {
            json!({"openapi": version, "info": {"title": "t", "version": "1"}, "paths": {}})
        };
        assert_eq!(
            validate_document(&base(json!("2.0"))).issues,
            vec!["Unsupported OpenAPI version: 2.0"]
        );
        assert_eq!(
            validate_document(&base(json!(3))).issues,
            vec!["Unsupported OpenAPI version: 3"]
        );
    }

    #[test]
    fn checks_each_operation() {
        let spec = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/brands": {
                    "GET": {"responses": {}},
                    "trace": {},
                    "post": {"operationId": "createBrand"}
                },
                "/broken": "not a path item"
            }
        });
        assert_eq!(
            validate_document(&spec).issues,
            vec![
                "Missing operationId for GET /brands",
                "Missing responses for POST /brands",
            ]
        );
    }

    #[test]
    fn non_mapping_root_is_reported() {
        assert_eq!(
            validate_document(&Value::Null).issues,
            vec!["Document root is not a mapping"]
        );
    }
}
