//! Live list views
//!
//! Lists hold no items of their own. Every call re-evaluates the field's
//! path against the current document, so changes made through any other
//! handle are seen immediately.

use crate::core::document::handle::{doc_read_with, DocRef};
use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::node::NodeId;
use crate::core::xpath::PathMatch;
use crate::schema::field::FieldKind;
use crate::schema::object::{bind, ObjectHandle, Splice, XmlObject};
use crate::schema::registry::ResolvedField;
use crate::schema::resolver;
use crate::types::value::XmlValue;
use std::marker::PhantomData;

/// Ordered view of the elements matched by an object-list field
#[derive(Debug, Clone)]
pub struct NodeList<T> {
    owner: ObjectHandle,
    field: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: XmlObject> NodeList<T> {
    pub(crate) fn new(owner: ObjectHandle, field: &str) -> Self {
        Self {
            owner,
            field: field.to_string(),
            _marker: PhantomData,
        }
    }

    fn resolve(&self) -> XmlMapResult<&ResolvedField> {
        let field = self.owner.field(&self.field)?;
        match field.spec.kind {
            FieldKind::ObjectList(def) if std::ptr::eq(def, T::schema()) => Ok(field),
            FieldKind::ObjectList(def) => Err(XmlMapError::BadParam(format!(
                "Field '{}' holds '{}' objects, not '{}'",
                self.field,
                def.name,
                T::schema().name
            ))),
            kind => Err(XmlMapError::BadParam(format!(
                "Field '{}' is a {} field",
                self.field,
                kind.name()
            ))),
        }
    }

    /// Current items with the document holding them
    fn nodes(&self) -> Option<(DocRef, Vec<NodeId>)> {
        let field = self.resolve().ok()?;
        let (doc, context) = self.owner.locate()?;
        let nodes = doc_read_with(&doc, |d| field.path.select_elements(d, context));
        Some((doc, nodes))
    }

    pub fn len(&self) -> usize {
        self.nodes().map_or(0, |(_, nodes)| nodes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index` in document order
    pub fn get(&self, index: usize) -> Option<T> {
        let (doc, nodes) = self.nodes()?;
        let node = nodes.get(index).copied()?;
        bind(&doc, node).ok()
    }

    /// Snapshot of the current items
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        let Some((doc, nodes)) = self.nodes() else {
            return Vec::new().into_iter();
        };
        nodes
            .into_iter()
            .filter_map(|node| bind(&doc, node).ok())
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Append a detached object after the last item
    ///
    /// The item's subtree moves into the owner's document and existing
    /// handles to it follow.
    pub fn append(&mut self, item: T) -> XmlMapResult<T> {
        let field = self.resolve()?;
        let (doc_ref, context) = self.owner.located()?;
        let item = item.into_handle();
        let splice = Splice::prepare(&doc_ref, &item)?;
        let node = {
            let mut doc = doc_write!(doc_ref);
            resolver::append_element(&mut doc, context, self.owner.table(), field, |target| {
                splice.take(&doc_ref, target).map(Some)
            })?
        };
        bind(&doc_ref, node)
    }

    /// Append a new empty item and return it
    pub fn append_new(&mut self) -> XmlMapResult<T> {
        let field = self.resolve()?;
        let (doc_ref, context) = self.owner.located()?;
        let node = {
            let mut doc = doc_write!(doc_ref);
            resolver::append_element(&mut doc, context, self.owner.table(), field, |_| Ok(None))?
        };
        bind(&doc_ref, node)
    }
}

/// Ordered view of the values matched by a scalar-list field
#[derive(Debug, Clone)]
pub struct ValueList {
    owner: ObjectHandle,
    field: String,
}

impl ValueList {
    pub(crate) fn new(owner: ObjectHandle, field: &str) -> Self {
        Self {
            owner,
            field: field.to_string(),
        }
    }

    fn resolve(&self) -> XmlMapResult<&ResolvedField> {
        let field = self.owner.field(&self.field)?;
        match field.spec.kind {
            FieldKind::ScalarList(_) => Ok(field),
            kind => Err(XmlMapError::BadParam(format!(
                "Field '{}' is a {} field",
                self.field,
                kind.name()
            ))),
        }
    }

    /// Current matches with the document holding them
    fn matches(&self) -> Option<(DocRef, Vec<PathMatch>)> {
        let field = self.resolve().ok()?;
        let (doc, context) = self.owner.locate()?;
        let found = doc_read_with(&doc, |d| field.path.evaluate(d, context));
        Some((doc, found))
    }

    pub fn len(&self) -> usize {
        self.matches().map_or(0, |(_, found)| found.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`; `None` past the end or when the text does not decode
    pub fn get(&self, index: usize) -> Option<XmlValue> {
        let field = self.resolve().ok()?;
        let (doc_ref, found) = self.matches()?;
        let found = found.into_iter().nth(index)?;
        let doc = doc_read_opt!(doc_ref);
        resolver::decode_match(&doc, field, &found)
    }

    /// Decodable values in document order
    pub fn to_vec(&self) -> Vec<XmlValue> {
        let Ok(field) = self.resolve() else {
            return Vec::new();
        };
        let Some((doc, found)) = self.matches() else {
            return Vec::new();
        };
        doc_read_with(&doc, |doc| {
            found
                .iter()
                .filter_map(|m| resolver::decode_match(doc, field, m))
                .collect()
        })
    }

    /// Values rendered as text
    pub fn to_strings(&self) -> Vec<String> {
        self.to_vec().iter().map(|v| v.to_string()).collect()
    }

    /// Append a value after the last item
    pub fn push(&mut self, value: impl Into<XmlValue>) -> XmlMapResult<()> {
        let field = self.resolve()?;
        let literal = resolver::encode_value(field, &value.into())?;
        let (doc_ref, context) = self.owner.located()?;
        let mut doc = doc_write!(doc_ref);
        let node = resolver::append_element(&mut doc, context, self.owner.table(), field, |_| Ok(None))?;
        doc.set_text(node, &literal)
    }

    /// Overwrite the value at `index`
    pub fn set(&mut self, index: usize, value: impl Into<XmlValue>) -> XmlMapResult<()> {
        let field = self.resolve()?;
        let literal = resolver::encode_value(field, &value.into())?;
        let (doc_ref, found) = self.nth(index)?;
        let mut doc = doc_write!(doc_ref);
        match found {
            PathMatch::Element(node) => doc.set_text(node, &literal),
            PathMatch::Attribute { owner, name } => doc.set_attribute(owner, name, literal),
            PathMatch::Value(_) => Err(XmlMapError::NotSupported(format!(
                "Field '{}' is computed and cannot be written",
                self.field
            ))),
        }
    }

    /// Remove the item at `index` from the document
    pub fn remove(&mut self, index: usize) -> XmlMapResult<()> {
        let (doc_ref, found) = self.nth(index)?;
        let mut doc = doc_write!(doc_ref);
        match found {
            PathMatch::Element(node) => {
                doc.remove(node);
                Ok(())
            }
            PathMatch::Attribute { owner, name } => {
                doc.remove_attribute(owner, name.namespace.as_deref(), &name.local);
                Ok(())
            }
            PathMatch::Value(_) => Err(XmlMapError::NotSupported(format!(
                "Field '{}' is computed and cannot be written",
                self.field
            ))),
        }
    }

    fn nth(&self, index: usize) -> XmlMapResult<(DocRef, PathMatch)> {
        let field = self.resolve()?;
        let (doc, context) = self.owner.located()?;
        let found = doc_read_with(&doc, |d| field.path.evaluate(d, context));
        let len = found.len();
        let found = found.into_iter().nth(index).ok_or_else(|| {
            XmlMapError::NotFound(format!(
                "Index {} out of range for '{}' ({} items)",
                index, self.field, len
            ))
        })?;
        Ok((doc, found))
    }
}
