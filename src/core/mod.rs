//! Core module
//!
//! This module contains the document model and the machinery underneath the
//! schema layer: parsing, path evaluation, namespace handling and
//! serialization.

#[macro_use]
pub mod document;
pub mod error;
pub mod namespace;
pub mod node;
pub mod parser;
pub mod serializer;
pub mod xpath;

pub use document::XmlDocument;
pub use error::{XmlMapError, XmlMapResult};
pub use namespace::{
    get_global_namespace_prefix, get_global_namespace_uri, register_namespace, NamespaceContext,
    NamespaceMap,
};
pub use node::{Document, NodeId, QName};
pub use parser::XmlParser;
pub use serializer::{SerializeOptions, XmlSerializer};
pub use xpath::{compile, CompiledPath, PathMatch};
