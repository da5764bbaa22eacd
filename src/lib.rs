//! Structural checks for API contract files: JSON Schemas, OpenAPI documents
//! and the local `$ref` pointers between them.

pub mod document;
pub mod openapi;
pub mod refs;
pub mod report;
pub mod schema;

pub use document::LoadError;
pub use openapi::{check_schema_refs_in, OpenApiValidator};
pub use refs::{find_invalid_refs, schema_registry, InvalidRef};
pub use report::ValidationReport;
pub use schema::SchemaValidator;
