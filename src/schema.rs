use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::document::{self, LoadError};
use crate::report::ValidationReport;

#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema_dir: PathBuf,
}

impl SchemaValidator {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        SchemaValidator {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn load_schema(&self, name: impl AsRef<str>) -> Result<Value, LoadError> {
        document::load_json(self.schema_dir.join(format!("{}.json", name.as_ref())))
    }

    pub fn validate_schema(&self, name: impl AsRef<str>) -> ValidationReport {
        let name = name.as_ref();
        let schema = match self.load_schema(name) {
            Ok(schema) => schema,
            Err(LoadError::NotFound { .. }) => {
                return ValidationReport::single(format!("Schema file not found: {}", name))
            }
            Err(LoadError::Json { source, .. }) => {
                return ValidationReport::single(format!("Invalid JSON: {}", source))
            }
            Err(err) => return ValidationReport::single(err.to_string()),
        };
        let report = validate_document(&schema);
        if !report.is_valid() {
            warn!(schema = name, issues = report.issues.len(), "json schema has issues");
        }
        report
    }

    /// Validates every `*.json` schema, sorted by name. Fails with
    /// [`LoadError::NotFound`] when the directory itself is missing.
    pub fn validate_all_schemas(&self) -> Result<IndexMap<String, ValidationReport>, LoadError> {
        let results: IndexMap<_, _> = document::files_with_extension(&self.schema_dir, "json")?
            .iter()
            .map(|path| {
                let name = document::file_stem(path);
                let report = self.validate_schema(&name);
                (name, report)
            })
            .collect();
        info!(
            dir = %self.schema_dir.display(),
            schemas = results.len(),
            "validated json schemas"
        );
        Ok(results)
    }

    /// Compares the `type` and `format` of a property shared by two schemas.
    pub fn check_schema_consistency(
        &self,
        first: impl AsRef<str>,
        second: impl AsRef<str>,
        field: impl AsRef<str>,
    ) -> Result<ValidationReport, LoadError> {
        let (first, second, field) = (first.as_ref(), second.as_ref(), field.as_ref());
        let first_schema = self.load_schema(first)?;
        let second_schema = self.load_schema(second)?;

        let Some(first_field) = property(&first_schema, field) else {
            return Ok(ValidationReport::single(format!(
                "Field '{}' not in {}",
                field, first
            )));
        };
        let Some(second_field) = property(&second_schema, field) else {
            return Ok(ValidationReport::single(format!(
                "Field '{}' not in {}",
                field, second
            )));
        };

        let mut report = ValidationReport::default();
        for (label, key) in [("Type", "type"), ("Format", "format")] {
            let (left, right) = (first_field.get(key), second_field.get(key));
            if left != right {
                report.push(format!(
                    "{} mismatch: {} vs {}",
                    label,
                    render(left),
                    render(right)
                ));
            }
        }
        Ok(report)
    }
}

fn property<'a>(schema: &'a Value, field: &str) -> Option<&'a Value> {
    schema.get("properties")?.get(field)
}

fn render(value: Option<&Value>) -> String {
    match value {
        None => "None".to_owned(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Required-key checks on an already parsed JSON Schema.
pub fn validate_document(schema: &Value) -> ValidationReport {
    let Some(object) = schema.as_object() else {
        return ValidationReport::single("Document root is not a mapping");
    };
    let mut report = ValidationReport::default();

    for key in ["$schema", "title", "type"] {
        if !object.contains_key(key) {
            report.push(format!("Missing '{}' field", key));
        }
    }

    if object.get("type").and_then(Value::as_str) == Some("object") {
        let properties = object.get("properties");
        if properties.is_none() {
            report.push("Object schema missing 'properties' field");
        }
        let has_property = |name: &str| properties.and_then(|props| props.get(name)).is_some();

        let required = object.get("required").and_then(Value::as_array);
        for name in required.into_iter().flatten().filter_map(Value::as_str) {
            if !has_property(name) {
                report.push(format!(
                    "Required field '{}' not defined in properties",
                    name
                ));
            }
        }

        if !has_property("id") {
            report.push("Object schema should have an 'id' property");
        }
    }

    report
}
