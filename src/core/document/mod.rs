//! XML documents
//!
//! This module provides the [`XmlDocument`] struct: a shared, parsed or
//! freshly built document that schema objects bind into.

#[macro_use]
mod macros;
pub mod handle;

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::node::{Document, NodeId};
use crate::core::parser::XmlParser;
use crate::core::serializer::{SerializeOptions, XmlSerializer};
use crate::schema::object::{ObjectHandle, Splice, XmlObject};
use crate::schema::registry::table_for;
use handle::{doc_read_with, new_doc_ref, DocRef};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A document shared by every object bound into it
#[derive(Clone)]
pub struct XmlDocument {
    doc: DocRef,
}

impl fmt::Debug for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = doc_read_with(&self.doc, |doc| doc.node_count());
        f.debug_struct("XmlDocument").field("nodes", &nodes).finish()
    }
}

impl XmlDocument {
    /// Create an empty document (no root element)
    pub fn new() -> Self {
        Self {
            doc: new_doc_ref(Document::new()),
        }
    }

    /// Parse a document from XML text
    pub fn parse(s: &str) -> XmlMapResult<Self> {
        let mut parser = XmlParser::new();
        let doc = parser.parse(s)?;
        Ok(Self {
            doc: new_doc_ref(doc),
        })
    }

    /// Shared handle to the underlying tree
    pub fn handle(&self) -> &DocRef {
        &self.doc
    }

    /// Root element, if any
    pub fn root(&self) -> Option<NodeId> {
        doc_read_with(&self.doc, |doc| doc.root())
    }

    /// Serialize with the default options (declaration, compact)
    pub fn serialize(&self) -> XmlMapResult<String> {
        self.serialize_with(&SerializeOptions::default())
    }

    pub fn serialize_with(&self, options: &SerializeOptions) -> XmlMapResult<String> {
        let serializer = XmlSerializer::new(options.clone());
        let doc = doc_read!(self.doc);
        serializer.serialize_document(&doc)
    }

    /// Bind the object matching `T`'s root binding
    ///
    /// The document element is used when it matches (or when `T` has no
    /// root binding); otherwise the first matching descendant in document
    /// order.
    pub fn root_object<T: XmlObject>(&self) -> XmlMapResult<T> {
        let table = table_for(T::schema())?;
        let found = {
            let doc = doc_read!(self.doc);
            let root = doc
                .root()
                .ok_or_else(|| XmlMapError::NotFound("Document has no root element".to_string()))?;
            match table.root() {
                None => Some(root),
                Some(name) => find_element(&doc, root, |candidate| {
                    doc.name(candidate)
                        .is_some_and(|n| n.matches(name.namespace.as_deref(), &name.local))
                }),
            }
        };
        let node = found.ok_or_else(|| {
            XmlMapError::NotFound(format!(
                "No element for '{}' in document",
                table.name()
            ))
        })?;
        Ok(T::from_handle(ObjectHandle::new(self.doc.clone(), node, table)))
    }

    /// Make a detached object the root element of this empty document
    pub fn set_root<T: XmlObject>(&self, object: T) -> XmlMapResult<T> {
        if self.root().is_some() {
            return Err(XmlMapError::BadParam(
                "Document already has a root element".to_string(),
            ));
        }
        let object = object.into_handle();
        let splice = Splice::prepare(&self.doc, &object)?;
        let node = {
            let mut doc = doc_write!(self.doc);
            let node = splice.take(&self.doc, &mut doc)?;
            doc.push_top_level(node)?;
            node
        };
        debug!(schema = object.table().name(), "set document root");
        Ok(T::from_handle(ObjectHandle::new(
            self.doc.clone(),
            node,
            object.table().clone(),
        )))
    }
}

/// First element in document order under (and including) `start` accepted by `accept`
fn find_element(doc: &Document, start: NodeId, accept: impl Fn(NodeId) -> bool) -> Option<NodeId> {
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if accept(node) {
            return Some(node);
        }
        stack.extend(doc.element_children(node).collect::<Vec<_>>().into_iter().rev());
    }
    None
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for XmlDocument {
    type Err = XmlMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::object::ObjectState;
    use crate::schema::field::{FieldSpec, SchemaDef};
    use crate::xml_object;

    static ITEM: SchemaDef = SchemaDef {
        name: "Item",
        root: Some("i:item"),
        namespaces: &[("i", "urn:items")],
        fields: &[FieldSpec::string("label", "i:label")],
        ..SchemaDef::EMPTY
    };

    xml_object! {
        struct Item => ITEM;
    }

    #[test]
    fn test_parse_and_from_str() {
        let xml = r#"<i:item xmlns:i="urn:items"><i:label>x</i:label></i:item>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert!(doc.root().is_some());
        assert!(xml.parse::<XmlDocument>().is_ok());
        assert!("<unclosed>".parse::<XmlDocument>().is_err());
    }

    #[test]
    fn test_root_object_finds_nested_binding() {
        let xml = r#"<wrapper><i:item xmlns:i="urn:items"><i:label>inner</i:label></i:item></wrapper>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let item = doc.root_object::<Item>().unwrap();
        assert_eq!(item.handle().get_string("label").as_deref(), Some("inner"));

        let other = XmlDocument::parse("<wrapper/>").unwrap();
        assert!(matches!(
            other.root_object::<Item>(),
            Err(XmlMapError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_root_on_empty_document() {
        let doc = XmlDocument::new();
        assert!(doc.serialize().is_err());

        let mut item = Item::new().unwrap();
        item.handle_mut().set("label", "built").unwrap();
        let earlier = item.clone();
        let item = doc.set_root(item).unwrap();
        assert_eq!(item.state(), ObjectState::Attached);
        assert_eq!(earlier.state(), ObjectState::Attached);
        assert_eq!(earlier.handle().node(), item.handle().node());
        assert_eq!(
            doc.serialize().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<i:item xmlns:i=\"urn:items\"><i:label>built</i:label></i:item>"
        );
        assert!(matches!(
            doc.set_root(Item::new().unwrap()),
            Err(XmlMapError::BadParam(_))
        ));
    }
}
