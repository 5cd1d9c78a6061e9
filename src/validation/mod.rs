//! Validation against external schemas
//!
//! [`ValidatorAdapter`] runs a [`SchemaValidator`] over an assembled object
//! and its schema resource. It never fails and never touches the document:
//! every problem, including an unreachable schema, comes back as a
//! [`Diagnostic`] in the [`ValidationReport`].

pub mod loader;

pub use loader::{cached_schema, FileSchemaLoader, SchemaLoader};
#[cfg(feature = "http")]
pub use loader::HttpSchemaLoader;

use crate::schema::object::{ObjectHandle, XmlObject};
use tracing::{debug, warn};

/// One validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Where the problem is (a document location or the schema location)
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationReport {
    pub valid: bool,
    /// Problems in the order they were found
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            valid: diagnostics.is_empty(),
            diagnostics,
        }
    }
}

/// What a validator gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    /// Schema resource text
    pub schema: &'a str,
    /// Serialized object
    pub document: &'a str,
    /// The object itself
    pub object: &'a ObjectHandle,
}

/// An external checker producing diagnostics
pub trait SchemaValidator {
    fn check(&self, input: &ValidationInput<'_>) -> Vec<Diagnostic>;
}

/// Reports every missing required field, recursively
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsValidator;

impl SchemaValidator for RequiredFieldsValidator {
    fn check(&self, input: &ValidationInput<'_>) -> Vec<Diagnostic> {
        input
            .object
            .missing_required()
            .into_iter()
            .map(|missing| {
                Diagnostic::new(
                    missing.location,
                    format!(
                        "Required field '{}' of '{}' is missing",
                        missing.field, missing.schema
                    ),
                )
            })
            .collect()
    }
}

/// Runs a validator over objects and their schema resources
#[derive(Debug, Clone, Default)]
pub struct ValidatorAdapter<L, V> {
    loader: L,
    validator: V,
}

impl<L: SchemaLoader, V: SchemaValidator> ValidatorAdapter<L, V> {
    pub fn new(loader: L, validator: V) -> Self {
        Self { loader, validator }
    }

    /// Validate against the schema location the object's schema declares
    pub fn validate<T: XmlObject>(&self, object: &T) -> ValidationReport {
        match object.handle().table().schema_location() {
            Some(location) => self.validate_at(object, location),
            None => ValidationReport::from_diagnostics(vec![Diagnostic::new(
                object.handle().table().name(),
                "Schema declares no schema location",
            )]),
        }
    }

    /// Validate against the schema resource at `location`
    pub fn validate_at<T: XmlObject>(&self, object: &T, location: &str) -> ValidationReport {
        let schema = match cached_schema(&self.loader, location) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(location, error = %e, "schema resource unavailable");
                return ValidationReport::from_diagnostics(vec![Diagnostic::new(
                    location,
                    e.to_string(),
                )]);
            }
        };
        let document = match object.serialize() {
            Ok(document) => document,
            Err(e) => {
                return ValidationReport::from_diagnostics(vec![Diagnostic::new(
                    object.handle().table().name(),
                    e.to_string(),
                )])
            }
        };
        let input = ValidationInput {
            schema: &schema,
            document: &document,
            object: object.handle(),
        };
        let report = ValidationReport::from_diagnostics(self.validator.check(&input));
        debug!(
            location,
            valid = report.valid,
            diagnostics = report.diagnostics.len(),
            "validated object"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::XmlMapResult;
    use crate::schema::field::{FieldSpec, SchemaDef};
    use crate::xml_object;

    static SHEET: SchemaDef = SchemaDef {
        name: "Sheet",
        root: Some("s:sheet"),
        namespaces: &[("s", "urn:sheets")],
        fields: &[FieldSpec::string("title", "s:title").required()],
        schema_location: Some("urn:test:sheet-schema"),
        ..SchemaDef::EMPTY
    };

    xml_object! {
        struct Sheet => SHEET;
    }

    struct StaticLoader;

    impl SchemaLoader for StaticLoader {
        fn load(&self, _location: &str) -> XmlMapResult<String> {
            Ok("<xs:schema/>".to_string())
        }
    }

    struct RejectAll;

    impl SchemaValidator for RejectAll {
        fn check(&self, input: &ValidationInput<'_>) -> Vec<Diagnostic> {
            vec![Diagnostic::new(
                "/",
                format!("{} bytes checked against {}", input.document.len(), input.schema),
            )]
        }
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let sheet = Sheet::new().unwrap();
        let adapter = ValidatorAdapter::new(StaticLoader, RequiredFieldsValidator);
        let report = adapter.validate(&sheet);
        assert!(!report.valid);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].location, "/s:sheet[1]");
        assert!(report.diagnostics[0].message.contains("title"));
    }

    #[test]
    fn test_complete_object_passes() {
        let mut sheet = Sheet::new().unwrap();
        sheet.handle_mut().set("title", "Ledger").unwrap();
        let adapter = ValidatorAdapter::new(StaticLoader, RequiredFieldsValidator);
        assert_eq!(
            adapter.validate(&sheet),
            ValidationReport {
                valid: true,
                diagnostics: Vec::new()
            }
        );
    }

    #[test]
    fn test_external_validator_sees_schema_and_document() {
        let sheet = Sheet::new().unwrap();
        let report = ValidatorAdapter::new(StaticLoader, RejectAll).validate(&sheet);
        assert!(!report.valid);
        assert!(report.diagnostics[0].message.ends_with("<xs:schema/>"));
    }

    #[test]
    fn test_unreachable_schema_is_a_diagnostic() {
        let sheet = Sheet::new().unwrap();
        let adapter = ValidatorAdapter::new(FileSchemaLoader, RequiredFieldsValidator);
        let report = adapter.validate_at(&sheet, "https://example.org/sheet.xsd");
        assert!(!report.valid);
        assert_eq!(report.diagnostics[0].location, "https://example.org/sheet.xsd");
        assert!(report.diagnostics[0].message.contains("file://"));
    }
}
