//! Field descriptors and schema definitions
//!
//! A schema is a `static` [`SchemaDef`] value: the schemas it extends, the
//! namespace prefixes its paths use, an optional root binding and an ordered
//! list of [`FieldSpec`]s. Definitions are plain data; the registry turns
//! them into resolved tables on first use.
//!
//! ```
//! use xmlmapkit::schema::{FieldSpec, SchemaDef};
//!
//! static TITLE_INFO: SchemaDef = SchemaDef {
//!     name: "TitleInfo",
//!     root: Some("t:titleInfo"),
//!     namespaces: &[("t", "urn:example:titles")],
//!     fields: &[
//!         FieldSpec::string("sub_title", "t:subTitle"),
//!         FieldSpec::string("title", "t:title").required(),
//!     ],
//!     ..SchemaDef::EMPTY
//! };
//! # assert_eq!(TITLE_INFO.fields.len(), 2);
//! ```

use crate::types::value::ScalarType;
use std::fmt;

/// Value kind of a field
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// One decoded text, attribute or computed value
    Scalar(ScalarType),
    /// Every match, decoded
    ScalarList(ScalarType),
    /// First matching element wrapped as a nested object
    Object(&'static SchemaDef),
    /// Every matching element wrapped as a nested object
    ObjectList(&'static SchemaDef),
}

impl FieldKind {
    /// Short kind name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Scalar(_) => "scalar",
            FieldKind::ScalarList(_) => "scalar-list",
            FieldKind::Object(_) => "object",
            FieldKind::ObjectList(_) => "object-list",
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(ty) => write!(f, "Scalar({})", ty),
            FieldKind::ScalarList(ty) => write!(f, "ScalarList({})", ty),
            FieldKind::Object(def) => write!(f, "Object({})", def.name),
            FieldKind::ObjectList(def) => write!(f, "ObjectList({})", def.name),
        }
    }
}

/// Typed binding of a name to a path expression
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name, unique within the flattened schema
    pub name: &'static str,
    /// Path expression relative to the object's element
    pub path: &'static str,
    pub kind: FieldKind,
    /// Checked only by explicit validation
    pub required: bool,
    /// Allowed literals; empty means unconstrained
    pub choices: &'static [&'static str],
}

impl FieldSpec {
    const fn with_kind(name: &'static str, path: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            path,
            kind,
            required: false,
            choices: &[],
        }
    }

    pub const fn string(name: &'static str, path: &'static str) -> Self {
        Self::with_kind(name, path, FieldKind::Scalar(ScalarType::String))
    }

    pub const fn integer(name: &'static str, path: &'static str) -> Self {
        Self::with_kind(name, path, FieldKind::Scalar(ScalarType::Integer))
    }

    pub const fn float(name: &'static str, path: &'static str) -> Self {
        Self::with_kind(name, path, FieldKind::Scalar(ScalarType::Float))
    }

    pub const fn boolean(name: &'static str, path: &'static str) -> Self {
        Self::with_kind(name, path, FieldKind::Scalar(ScalarType::Boolean))
    }

    /// Repeated string values
    pub const fn string_list(name: &'static str, path: &'static str) -> Self {
        Self::with_kind(name, path, FieldKind::ScalarList(ScalarType::String))
    }

    /// Repeated values of any scalar type
    pub const fn scalar_list(name: &'static str, path: &'static str, ty: ScalarType) -> Self {
        Self::with_kind(name, path, FieldKind::ScalarList(ty))
    }

    /// Single nested object
    pub const fn node(name: &'static str, path: &'static str, def: &'static SchemaDef) -> Self {
        Self::with_kind(name, path, FieldKind::Object(def))
    }

    /// Repeated nested objects
    pub const fn node_list(name: &'static str, path: &'static str, def: &'static SchemaDef) -> Self {
        Self::with_kind(name, path, FieldKind::ObjectList(def))
    }

    /// Mark the field required
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Restrict assigned literals to `choices`
    pub const fn choices(self, choices: &'static [&'static str]) -> Self {
        Self { choices, ..self }
    }

    /// Scalar type of scalar and scalar-list fields
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.kind {
            FieldKind::Scalar(ty) | FieldKind::ScalarList(ty) => Some(ty),
            _ => None,
        }
    }

    /// Declared schema of object and object-list fields
    pub fn element_schema(&self) -> Option<&'static SchemaDef> {
        match self.kind {
            FieldKind::Object(def) | FieldKind::ObjectList(def) => Some(def),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::ScalarList(_) | FieldKind::ObjectList(_))
    }
}

/// Static schema definition
pub struct SchemaDef {
    /// Schema name used in messages
    pub name: &'static str,
    /// Root element as `prefix:local`; inherited when `None`
    pub root: Option<&'static str>,
    /// Prefix to URI declarations, shadowing inherited prefixes
    pub namespaces: &'static [(&'static str, &'static str)],
    /// Schemas whose fields and namespaces this one inherits
    pub extends: &'static [&'static SchemaDef],
    /// Fields declared by this schema, in order
    pub fields: &'static [FieldSpec],
    /// URL or path of an external schema document; inherited when `None`
    pub schema_location: Option<&'static str>,
}

impl SchemaDef {
    /// Definition with no fields, used as the base of struct updates
    pub const EMPTY: SchemaDef = SchemaDef {
        name: "",
        root: None,
        namespaces: &[],
        extends: &[],
        fields: &[],
        schema_location: None,
    };
}

impl fmt::Debug for SchemaDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDef")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("fields", &self.fields.iter().map(|s| s.name).collect::<Vec<_>>())
            .finish()
    }
}
