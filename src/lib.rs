//! # xmlmapkit
//!
//! Declarative XML-object mapping in pure Rust.
//!
//! Schema types are declared as static [`SchemaDef`]s whose fields are path
//! expressions into a document. Reading a field evaluates its path; writing
//! one creates the elements and attributes the path names, in declaration
//! order. The [`mods`] module ships a catalogue for MODS bibliographic
//! records built on this layer.
//!
//! ```
//! use xmlmapkit::mods::Mods;
//! use xmlmapkit::XmlObject;
//!
//! let mut record = Mods::new().unwrap();
//! record.create_title_info().unwrap().set_title("A Title").unwrap();
//! assert_eq!(
//!     record.title_info().and_then(|t| t.title()).as_deref(),
//!     Some("A Title")
//! );
//! ```

#[macro_use]
pub mod core;
pub mod mods;
pub mod schema;
pub mod types;
pub mod validation;

pub use crate::core::{XmlDocument, XmlMapError, XmlMapResult, SerializeOptions};
pub use schema::{
    FieldKind, FieldSpec, NodeList, ObjectHandle, ObjectState, SchemaDef, ValueList, XmlObject,
};
pub use types::{ScalarType, XmlValue};
pub use validation::{Diagnostic, ValidationReport, ValidatorAdapter};
