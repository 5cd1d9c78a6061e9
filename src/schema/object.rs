//! Object instances
//!
//! An [`ObjectHandle`] binds one element of a shared document to the
//! resolved table of its schema; every field access is dispatched through
//! the table to the resolver. Typed schema objects implement [`XmlObject`]
//! (usually through [`xml_object!`](crate::xml_object)) and wrap a handle.

use crate::core::document::handle::{doc_read_with, locate, new_doc_ref, same_doc, DocRef};
use crate::core::document::XmlDocument;
use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::node::{Document, NodeId, QName, Relocation};
use crate::core::serializer::{SerializeOptions, XmlSerializer};
use crate::schema::field::{FieldKind, SchemaDef};
use crate::schema::list::{NodeList, ValueList};
use crate::schema::registry::{table_for, ResolvedField, SchemaTable};
use crate::schema::resolver;
use crate::types::value::XmlValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Whether an object's element is reachable from its document root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectState {
    /// Freshly built subtree with no parent
    #[default]
    Detached,
    /// Part of a document tree
    Attached,
}

/// A child element seen through the wildcard query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyElement {
    pub name: QName,
    /// String value of the element
    pub value: String,
}

impl AnyElement {
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }
}

/// A required field found missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub schema: &'static str,
    pub field: &'static str,
    /// Location of the object that lacks the field
    pub location: String,
}

/// Element of a shared document bound to a schema table
#[derive(Clone)]
pub struct ObjectHandle {
    doc: DocRef,
    node: NodeId,
    table: Arc<SchemaTable>,
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("schema", &self.table.name())
            .field("node", &self.node)
            .finish()
    }
}

/// Check that an object or object-list field declares `T`'s schema
fn check_declared<T: XmlObject>(field: &ResolvedField, list: bool) -> XmlMapResult<()> {
    let declared = match (field.spec.kind, list) {
        (FieldKind::Object(def), false) | (FieldKind::ObjectList(def), true) => def,
        (kind, _) => {
            return Err(XmlMapError::BadParam(format!(
                "Field '{}' is a {} field",
                field.name(),
                kind.name()
            )))
        }
    };
    if !std::ptr::eq(declared, T::schema()) {
        return Err(XmlMapError::BadParam(format!(
            "Field '{}' holds '{}' objects, not '{}'",
            field.name(),
            declared.name,
            T::schema().name
        )));
    }
    Ok(())
}

impl ObjectHandle {
    /// Bind `node` of `doc` to `table`
    pub fn new(doc: DocRef, node: NodeId, table: Arc<SchemaTable>) -> Self {
        Self { doc, node, table }
    }

    /// Current document and element, or `None` once the element is removed
    pub fn locate(&self) -> Option<(DocRef, NodeId)> {
        locate(&self.doc, self.node)
    }

    pub(crate) fn located(&self) -> XmlMapResult<(DocRef, NodeId)> {
        self.locate().ok_or_else(|| {
            XmlMapError::NotFound(format!(
                "'{}' element has been removed",
                self.table.name()
            ))
        })
    }

    /// Follow relocations and keep the result
    fn refresh(&mut self) -> XmlMapResult<()> {
        let (doc, node) = self.located()?;
        self.doc = doc;
        self.node = node;
        Ok(())
    }

    /// Document currently holding the element
    pub fn document(&self) -> DocRef {
        self.locate().map_or_else(|| self.doc.clone(), |(doc, _)| doc)
    }

    /// Id of the element in [`document`](Self::document)
    pub fn node(&self) -> NodeId {
        self.locate().map_or(self.node, |(_, node)| node)
    }

    pub fn table(&self) -> &Arc<SchemaTable> {
        &self.table
    }

    pub fn state(&self) -> ObjectState {
        let Some((doc, node)) = self.locate() else {
            return ObjectState::Detached;
        };
        doc_read_with(&doc, |d| {
            if d.is_reachable(node) {
                ObjectState::Attached
            } else {
                ObjectState::Detached
            }
        })
    }

    /// Local name of the bound element
    pub fn local_name(&self) -> Option<String> {
        let (doc, node) = self.locate()?;
        let doc = doc_read_opt!(doc);
        doc.name(node).map(|name| name.local.clone())
    }

    /// Namespace URI of the bound element
    pub fn namespace(&self) -> Option<String> {
        let (doc, node) = self.locate()?;
        let doc = doc_read_opt!(doc);
        doc.name(node)?.namespace.clone()
    }

    /// Field names in table order
    pub fn field_names(&self) -> Vec<&'static str> {
        self.table.field_names()
    }

    pub(crate) fn field(&self, name: &str) -> XmlMapResult<&ResolvedField> {
        self.table.field(name).ok_or_else(|| {
            XmlMapError::BadParam(format!(
                "Unknown field '{}' for '{}'",
                name,
                self.table.name()
            ))
        })
    }

    /// Read a scalar field
    ///
    /// Returns `None` when nothing matches, when the stored text does not
    /// decode as the field type, or when `field` is not a scalar field.
    pub fn get(&self, field: &str) -> Option<XmlValue> {
        let field = self.table.field(field)?;
        if !matches!(field.spec.kind, FieldKind::Scalar(_)) {
            return None;
        }
        let (doc, node) = self.locate()?;
        let doc = doc_read_opt!(doc);
        resolver::read_scalar(&doc, node, field)
    }

    /// Read a scalar field as text
    pub fn get_string(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| value.to_string())
    }

    /// Assign a scalar field, creating its node if needed
    pub fn set(&mut self, field: &str, value: impl Into<XmlValue>) -> XmlMapResult<()> {
        self.refresh()?;
        let field = self.field(field)?;
        if !matches!(field.spec.kind, FieldKind::Scalar(_)) {
            return Err(XmlMapError::BadParam(format!(
                "Field '{}' is a {} field",
                field.name(),
                field.spec.kind.name()
            )));
        }
        let literal = resolver::encode_value(field, &value.into())?;
        let mut doc = doc_write!(self.doc);
        resolver::write_scalar(&mut doc, self.node, &self.table, field, &literal)
    }

    /// Remove a scalar field's node (or text, for `.`)
    pub fn clear(&mut self, field: &str) -> XmlMapResult<()> {
        self.refresh()?;
        let field = self.field(field)?;
        if !matches!(field.spec.kind, FieldKind::Scalar(_)) {
            return Err(XmlMapError::NotSupported(format!(
                "Field '{}' is a {} field; bound objects are never removed",
                field.name(),
                field.spec.kind.name()
            )));
        }
        let mut doc = doc_write!(self.doc);
        resolver::clear_scalar(&mut doc, self.node, field)?;
        Ok(())
    }

    /// Read an object field
    pub fn object<T: XmlObject>(&self, field: &str) -> Option<T> {
        let field = self.table.field(field)?;
        check_declared::<T>(field, false).ok()?;
        let (doc_ref, context) = self.locate()?;
        let node = {
            let doc = doc_read_opt!(doc_ref);
            field.path.select_elements(&doc, context).first().copied()?
        };
        bind(&doc_ref, node).ok()
    }

    /// Read an object field, creating an empty element when it is missing
    pub fn object_or_create<T: XmlObject>(&mut self, field: &str) -> XmlMapResult<T> {
        self.refresh()?;
        let field = self.field(field)?;
        check_declared::<T>(field, false)?;
        let node = {
            let mut doc = doc_write!(self.doc);
            resolver::locate_or_create(&mut doc, self.node, &self.table, field)?
        };
        bind(&self.doc, node)
    }

    /// Assign a detached object to an object field
    ///
    /// The object's subtree moves into this document. An existing match
    /// keeps its identity and takes over the object's attributes and
    /// children; otherwise the object's element is inserted and renamed to
    /// what the path gives. Handles to the assigned object, and to anything
    /// below it, follow it to its new place. Returns the attached object.
    pub fn set_object<T: XmlObject>(&mut self, field: &str, value: T) -> XmlMapResult<T> {
        self.refresh()?;
        let field = self.field(field)?;
        check_declared::<T>(field, false)?;
        let value = value.into_handle();
        let splice = Splice::prepare(&self.doc, &value)?;
        let node = {
            let mut doc = doc_write!(self.doc);
            resolver::place_object(&mut doc, self.node, &self.table, field, |target| {
                splice.take(&self.doc, target)
            })?
        };
        Ok(T::from_handle(ObjectHandle::new(
            self.doc.clone(),
            node,
            value.table,
        )))
    }

    /// Live view of an object-list field
    pub fn list<T: XmlObject>(&self, field: &str) -> NodeList<T> {
        NodeList::new(self.clone(), field)
    }

    /// Live view of a scalar-list field
    pub fn values(&self, field: &str) -> ValueList {
        ValueList::new(self.clone(), field)
    }

    /// Every direct child element, whether or not a field declares it
    pub fn child_elements(&self) -> Vec<AnyElement> {
        let Some((doc, node)) = self.locate() else {
            return Vec::new();
        };
        doc_read_with(&doc, |doc| {
            doc.element_children(node)
                .filter_map(|child| {
                    Some(AnyElement {
                        name: doc.name(child)?.clone(),
                        value: doc.text_content(child),
                    })
                })
                .collect()
        })
    }

    /// Serialize the bound element (the whole document when it is the root)
    pub fn serialize_with(&self, options: &SerializeOptions) -> XmlMapResult<String> {
        let (doc_ref, node) = self.located()?;
        let doc = doc_read!(doc_ref);
        let serializer = XmlSerializer::new(options.clone());
        if doc.root() == Some(node) {
            serializer.serialize_document(&doc)
        } else {
            serializer.serialize_node(&doc, node)
        }
    }

    /// Every missing required field of this object and of the objects below it
    pub fn missing_required(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if let Some((doc, node)) = self.locate() {
            doc_read_with(&doc, |doc| {
                collect_missing(doc, node, &self.table, &mut missing)
            });
        }
        missing
    }
}

/// Wrap an element of `doc` as `T`
pub(crate) fn bind<T: XmlObject>(doc: &DocRef, node: NodeId) -> XmlMapResult<T> {
    let table = table_for(T::schema())?;
    Ok(T::from_handle(ObjectHandle::new(doc.clone(), node, table)))
}

/// A detached object about to be moved under a new parent
///
/// [`prepare`](Self::prepare) refuses objects that already have a parent
/// and touches nothing. [`take`](Self::take) runs under the target's write
/// lock once the placement has been checked, and moves the subtree when it
/// lives in another document.
pub(crate) struct Splice {
    source: DocRef,
    node: NodeId,
    same_doc: bool,
    schema: &'static str,
}

impl Splice {
    pub(crate) fn prepare(target: &DocRef, value: &ObjectHandle) -> XmlMapResult<Self> {
        let (source, node) = value.located()?;
        let attached = {
            let doc = doc_read!(source);
            doc.is_attached(node)
        };
        if attached {
            return Err(XmlMapError::NotSupported(format!(
                "'{}' object already has a parent; re-parenting is not supported",
                value.table.name()
            )));
        }
        Ok(Self {
            same_doc: same_doc(target, &source),
            source,
            node,
            schema: value.table.name(),
        })
    }

    /// Element id of the object inside `target`
    pub(crate) fn take(self, target_ref: &DocRef, target: &mut Document) -> XmlMapResult<NodeId> {
        if self.same_doc {
            return Ok(self.node);
        }
        let mut source = doc_write!(self.source);
        let (node, moved) = target.adopt_subtree(&mut source, self.node)?;
        for (from, to) in moved {
            source.relocate(
                from,
                Relocation {
                    document: Some(target_ref.clone()),
                    node: to,
                },
            );
        }
        debug!(
            schema = self.schema,
            nodes = target.node_count(),
            "moved detached subtree"
        );
        Ok(node)
    }
}

fn collect_missing(doc: &Document, node: NodeId, table: &SchemaTable, out: &mut Vec<MissingField>) {
    for field in table.fields() {
        let matches = field.path.evaluate(doc, node);
        if field.spec.required && matches.is_empty() {
            out.push(MissingField {
                schema: table.name(),
                field: field.name(),
                location: doc.location(node),
            });
        }
        let Some(def) = field.spec.element_schema() else {
            continue;
        };
        let Ok(nested) = table_for(def) else {
            continue;
        };
        let mut elements = field.path.select_elements(doc, node);
        if !field.spec.is_list() {
            elements.truncate(1);
        }
        for element in elements.into_iter().filter(|e| *e != node) {
            collect_missing(doc, element, &nested, out);
        }
    }
}

/// A typed view of an element bound to a static schema
pub trait XmlObject: Sized {
    /// Schema definition of this type
    fn schema() -> &'static SchemaDef;

    fn from_handle(handle: ObjectHandle) -> Self;

    fn handle(&self) -> &ObjectHandle;

    fn handle_mut(&mut self) -> &mut ObjectHandle;

    fn into_handle(self) -> ObjectHandle;

    /// Create a bare, detached object from the schema's root binding
    fn new() -> XmlMapResult<Self> {
        let table = table_for(Self::schema())?;
        let root = table.root().cloned().ok_or_else(|| {
            XmlMapError::NotSupported(format!(
                "'{}' has no root element binding",
                table.name()
            ))
        })?;
        let mut doc = Document::new();
        let node = doc.create_element(root);
        Ok(Self::from_handle(ObjectHandle::new(
            new_doc_ref(doc),
            node,
            table,
        )))
    }

    /// Wrap an existing element
    fn from_node(doc: &DocRef, node: NodeId) -> XmlMapResult<Self> {
        let table = table_for(Self::schema())?;
        let is_element = doc_read_with(doc, |d| d.contains(node) && d.is_element(node));
        if !is_element {
            return Err(XmlMapError::BadParam(format!(
                "Node {} is not an element",
                node.index()
            )));
        }
        Ok(Self::from_handle(ObjectHandle::new(doc.clone(), node, table)))
    }

    /// Parse a document and bind the element matching the root binding
    fn parse(xml: &str) -> XmlMapResult<Self> {
        XmlDocument::parse(xml)?.root_object()
    }

    /// Serialize with default options
    fn serialize(&self) -> XmlMapResult<String> {
        self.handle().serialize_with(&SerializeOptions::default())
    }

    fn serialize_with(&self, options: &SerializeOptions) -> XmlMapResult<String> {
        self.handle().serialize_with(options)
    }

    /// Fail on the first missing required field
    fn check_required(&self) -> XmlMapResult<()> {
        match self.handle().missing_required().into_iter().next() {
            Some(missing) => Err(XmlMapError::MissingRequiredField {
                schema: missing.schema.to_string(),
                field: missing.field.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn state(&self) -> ObjectState {
        self.handle().state()
    }
}
