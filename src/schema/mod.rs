//! Declarative schema layer
//!
//! Static [`SchemaDef`]s describe how fields map onto a document through
//! path expressions. The registry resolves each definition once into a
//! [`SchemaTable`]; [`ObjectHandle`] and the [`XmlObject`] types built on it
//! dispatch every field access through that table.

mod macros;

pub mod field;
pub mod list;
pub mod object;
pub mod registry;
pub(crate) mod resolver;

pub use field::{FieldKind, FieldSpec, SchemaDef};
pub use list::{NodeList, ValueList};
pub use object::{AnyElement, MissingField, ObjectHandle, ObjectState, XmlObject};
pub use registry::{table_for, ResolvedField, SchemaTable};
