//! Document node model
//!
//! This module defines the arena-backed tree the mapping engine reads and
//! mutates:
//! - Document: owns every node, detached or not
//! - NodeKind: element, text, CDATA, comment or processing instruction
//! - QName / Attribute: namespace-resolved names
//!
//! Nodes are addressed by [`NodeId`]. A node created through the document
//! starts detached (no parent) and becomes part of the tree once it is
//! inserted under another node or installed as the document root.
//!
//! Removed nodes go back to a free list and their slots are reused. Ids carry
//! the generation of their slot, so an id kept across a removal never
//! resolves to the node that later reuses the slot.

use crate::core::document::handle::DocRef;
use crate::core::error::{XmlMapError, XmlMapResult};
use std::collections::HashMap;

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.index
    }
}

/// Namespace-resolved name of an element or attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Prefix used when the name is written out
    pub prefix: Option<String>,
    /// Local part of the name
    pub local: String,
    /// Namespace URI the name belongs to
    pub namespace: Option<String>,
}

impl QName {
    /// Create a new qualified name
    pub fn new(prefix: Option<&str>, local: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.into(),
            namespace: namespace.map(str::to_string),
        }
    }

    /// Create a name without namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// The name as written in markup (`prefix:local` or `local`)
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Check namespace URI and local name
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

/// An attribute on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// An `xmlns` / `xmlns:prefix` declaration carried by an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` for the default namespace
    pub prefix: Option<String>,
    pub uri: String,
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub namespace_decls: Vec<NamespaceDecl>,
}

impl Element {
    /// Create an element without attributes
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespace_decls: Vec::new(),
        }
    }
}

/// Kind and payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// `<?xml ...?>` declaration of a parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: None,
        }
    }
}

/// Where an element went when it left its slot
///
/// `document` is `None` when the element was merged into another element of
/// the same document.
#[derive(Debug, Clone)]
pub struct Relocation {
    pub document: Option<DocRef>,
    pub node: NodeId,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    generation: u32,
    free: bool,
}

/// Arena holding a document tree plus any detached nodes built for it
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Reusable slots
    free: Vec<usize>,
    /// Children of the document node: the root element plus comments/PIs
    top_level: Vec<NodeId>,
    declaration: Option<XmlDeclaration>,
    relocations: HashMap<NodeId, Relocation>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index]
    }

    /// Create a detached node, reusing a freed slot when there is one
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.kind = kind;
            slot.free = false;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.nodes.len();
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            generation: 0,
            free: false,
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.create_node(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text(text.into()))
    }

    /// Number of live nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Whether `id` names a live node of this document
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index)
            .is_some_and(|slot| !slot.free && slot.generation == id.generation)
    }

    /// Where a removed element went, if it was moved rather than dropped
    pub fn relocation(&self, id: NodeId) -> Option<&Relocation> {
        self.relocations.get(&id)
    }

    /// Record that the element once at `from` now lives at `to`
    pub fn relocate(&mut self, from: NodeId, to: Relocation) {
        self.relocations.insert(from, to);
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Element payload, if the node is an element
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.data(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.data_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Element name, if the node is an element
    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.element(id).map(|e| &e.name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Element children in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.is_element(*child))
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Whether the node hangs under a parent or is a top-level document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.parent(id).is_some() || self.top_level.contains(&id)
    }

    /// Whether `id` is `ancestor` or lies below it
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether the node is reachable from the document node
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        self.top_level.contains(&current)
    }

    /// Location of an element as `/prefix:name[n]/...` steps from its topmost ancestor
    pub fn location(&self, id: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(name) = self.name(node) {
                let parent = self.parent(node);
                let position = match parent {
                    Some(parent) => {
                        self.element_children(parent)
                            .take_while(|c| *c != node)
                            .filter(|c| self.name(*c) == Some(name))
                            .count()
                            + 1
                    }
                    None => 1,
                };
                steps.push(format!("/{}[{}]", name.qualified(), position));
                current = parent;
            } else {
                current = self.parent(node);
            }
        }
        steps.reverse();
        steps.concat()
    }

    /// Root element of the document
    pub fn root(&self) -> Option<NodeId> {
        self.top_level.iter().copied().find(|id| self.is_element(*id))
    }

    /// Top-level nodes (root element, comments, processing instructions)
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    /// Append a detached node to the document node
    pub fn push_top_level(&mut self, id: NodeId) -> XmlMapResult<()> {
        self.ensure_detached(id)?;
        if self.is_element(id) && self.root().is_some() {
            return Err(XmlMapError::BadParam(
                "Document already has a root element".to_string(),
            ));
        }
        self.top_level.push(id);
        Ok(())
    }

    pub fn declaration(&self) -> Option<&XmlDeclaration> {
        self.declaration.as_ref()
    }

    pub fn set_declaration(&mut self, declaration: Option<XmlDeclaration>) {
        self.declaration = declaration;
    }

    /// Fail unless `id` has no parent and is not a top-level node
    pub fn ensure_detached(&self, id: NodeId) -> XmlMapResult<()> {
        if self.is_attached(id) {
            return Err(XmlMapError::BadParam(format!(
                "Node {} is already attached",
                id.index
            )));
        }
        Ok(())
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> XmlMapResult<()> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Insert a detached node at `index` among `parent`'s children
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> XmlMapResult<()> {
        self.ensure_detached(child)?;
        if !self.is_element(parent) {
            return Err(XmlMapError::BadParam(
                "Only elements can have children".to_string(),
            ));
        }
        if self.is_within(parent, child) {
            return Err(XmlMapError::BadParam(
                "Cannot insert a node below itself".to_string(),
            ));
        }
        let len = self.children(parent).len();
        if index > len {
            return Err(XmlMapError::BadParam(format!(
                "Index {} out of bounds for {} children",
                index, len
            )));
        }
        self.data_mut(parent).children.insert(index, child);
        self.data_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent; returns false if it had none
    pub fn detach(&mut self, id: NodeId) -> bool {
        if let Some(parent) = self.parent(id) {
            self.data_mut(parent).children.retain(|c| *c != id);
            self.data_mut(id).parent = None;
            return true;
        }
        let before = self.top_level.len();
        self.top_level.retain(|c| *c != id);
        before != self.top_level.len()
    }

    /// Detach a node and free it along with its descendants
    ///
    /// Returns false when `id` is not a live node.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.detach(id);
        self.free_subtree(id);
        true
    }

    fn free_subtree(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.data_mut(id).children) {
            self.free_subtree(child);
        }
        self.release(id);
    }

    fn release(&mut self, id: NodeId) {
        let slot = &mut self.nodes[id.index];
        slot.kind = NodeKind::Text(String::new());
        slot.parent = None;
        slot.children.clear();
        slot.free = true;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Give `target` the attributes and children of detached element `source`
    ///
    /// `target` keeps its id, name, position and namespace declarations. Its
    /// previous children are freed, `source` is freed and relocated to
    /// `target`.
    pub fn overwrite(&mut self, target: NodeId, source: NodeId) -> XmlMapResult<()> {
        self.ensure_detached(source)?;
        if self.is_within(target, source) {
            return Err(XmlMapError::BadParam(
                "Cannot overwrite a node with one of its ancestors".to_string(),
            ));
        }
        let (attributes, decls) = match (self.element(source), self.element(target)) {
            (Some(incoming), Some(_)) => (
                incoming.attributes.clone(),
                incoming.namespace_decls.clone(),
            ),
            _ => {
                return Err(XmlMapError::BadParam(
                    "Only elements can be overwritten".to_string(),
                ))
            }
        };

        for child in std::mem::take(&mut self.data_mut(target).children) {
            self.free_subtree(child);
        }
        let incoming = std::mem::take(&mut self.data_mut(source).children);
        for child in &incoming {
            self.data_mut(*child).parent = Some(target);
        }
        self.data_mut(target).children = incoming;

        if let Some(element) = self.element_mut(target) {
            element.attributes = attributes;
            for decl in decls {
                if !element.namespace_decls.iter().any(|d| d.prefix == decl.prefix) {
                    element.namespace_decls.push(decl);
                }
            }
        }

        self.release(source);
        self.relocate(
            source,
            Relocation {
                document: None,
                node: target,
            },
        );
        Ok(())
    }

    /// Attribute value by namespace URI and local name
    pub fn attribute(&self, id: NodeId, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name.matches(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the value of an existing one with the same name
    pub fn set_attribute(&mut self, id: NodeId, name: QName, value: impl Into<String>) -> XmlMapResult<()> {
        let value = value.into();
        let element = self
            .element_mut(id)
            .ok_or_else(|| XmlMapError::BadParam("Attributes live on elements".to_string()))?;
        match element
            .attributes
            .iter()
            .position(|a| a.name.matches(name.namespace.as_deref(), &name.local))
        {
            Some(index) => element.attributes[index].value = value,
            None => element.attributes.push(Attribute { name, value }),
        }
        Ok(())
    }

    /// Remove an attribute; returns whether it existed
    pub fn remove_attribute(&mut self, id: NodeId, namespace: Option<&str>, local: &str) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        let before = element.attributes.len();
        element.attributes.retain(|a| !a.name.matches(namespace, local));
        before != element.attributes.len()
    }

    /// Record a namespace declaration on an element
    pub fn declare_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: &str) -> XmlMapResult<()> {
        let element = self
            .element_mut(id)
            .ok_or_else(|| XmlMapError::BadParam("Namespaces are declared on elements".to_string()))?;
        element.namespace_decls.retain(|d| d.prefix.as_deref() != prefix);
        element.namespace_decls.push(NamespaceDecl {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        });
        Ok(())
    }

    /// Rename an element
    pub fn rename(&mut self, id: NodeId, name: QName) -> XmlMapResult<()> {
        let element = self
            .element_mut(id)
            .ok_or_else(|| XmlMapError::BadParam("Only elements can be renamed".to_string()))?;
        element.name = name;
        Ok(())
    }

    /// String value: the concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            _ => {}
        }
    }

    /// Replace the direct text children of an element, keeping child elements
    ///
    /// The text ends up as the first child. An existing text node is reused.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> XmlMapResult<()> {
        if !self.is_element(id) {
            return Err(XmlMapError::BadParam(
                "Text can only be set on elements".to_string(),
            ));
        }
        let mut text_children = self
            .children(id)
            .iter()
            .copied()
            .filter(|c| matches!(self.kind(*c), NodeKind::Text(_) | NodeKind::CData(_)));
        let reused = if text.is_empty() { None } else { text_children.next() };
        let stale: Vec<NodeId> = text_children.collect();
        for child in stale {
            self.remove(child);
        }

        match reused {
            Some(node) => {
                self.data_mut(node).kind = NodeKind::Text(text.to_string());
                if self.children(id).first() != Some(&node) {
                    self.detach(node);
                    self.insert_child(id, 0, node)?;
                }
            }
            None if !text.is_empty() => {
                let node = self.create_text(text);
                self.insert_child(id, 0, node)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Append text under `parent`, merging with a trailing text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> XmlMapResult<()> {
        if let Some(last) = self.children(parent).last().copied() {
            if let NodeKind::Text(existing) = &mut self.data_mut(last).kind {
                existing.push_str(text);
                return Ok(());
            }
        }
        let node = self.create_text(text);
        self.append_child(parent, node)
    }

    /// Move a detached subtree of `source` into this document
    ///
    /// The subtree stays detached here and its slots in `source` are freed.
    /// Returns the new root plus the old and new id of every moved element.
    pub fn adopt_subtree(
        &mut self,
        source: &mut Document,
        id: NodeId,
    ) -> XmlMapResult<(NodeId, Vec<(NodeId, NodeId)>)> {
        if !source.contains(id) {
            return Err(XmlMapError::NotFound(format!(
                "Node {} is not in the source document",
                id.index
            )));
        }
        source.ensure_detached(id)?;
        let mut moved = Vec::new();
        let root = self.adopt_node(source, id, &mut moved);
        Ok((root, moved))
    }

    fn adopt_node(&mut self, source: &mut Document, id: NodeId, moved: &mut Vec<(NodeId, NodeId)>) -> NodeId {
        let kind = std::mem::replace(&mut source.data_mut(id).kind, NodeKind::Text(String::new()));
        let children = std::mem::take(&mut source.data_mut(id).children);
        source.release(id);

        let is_element = matches!(kind, NodeKind::Element(_));
        let node = self.create_node(kind);
        if is_element {
            moved.push((id, node));
        }
        for child in children {
            let adopted = self.adopt_node(source, child, moved);
            self.data_mut(adopted).parent = Some(node);
            self.data_mut(node).children.push(adopted);
        }
        node
    }

    /// Namespace URI bound to `prefix` at `id`, following ancestor declarations
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(element) = self.element(node) {
                if let Some(decl) = element
                    .namespace_decls
                    .iter()
                    .find(|d| d.prefix.as_deref() == prefix)
                {
                    return Some(decl.uri.as_str());
                }
            }
            current = self.parent(node);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(local: &str) -> QName {
        QName::new(Some("mods"), local, Some("urn:mods"))
    }

    #[test]
    fn test_created_nodes_start_detached() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("mods"));
        assert!(!doc.is_attached(root));
        doc.push_top_level(root).unwrap();
        assert!(doc.is_attached(root));
        assert_eq!(doc.root(), Some(root));
    }

    #[test]
    fn test_insert_and_detach_children() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("name"));
        let a = doc.create_element(mods("namePart"));
        let b = doc.create_element(mods("role"));
        doc.append_child(root, b).unwrap();
        doc.insert_child(root, 0, a).unwrap();
        assert_eq!(doc.children(root), &[a, b]);
        assert_eq!(doc.index_in_parent(b), Some(1));

        assert!(doc.append_child(root, a).is_err());

        assert!(doc.detach(a));
        assert_eq!(doc.children(root), &[b]);
        assert!(!doc.is_attached(a));
    }

    #[test]
    fn test_attributes() {
        let mut doc = Document::new();
        let name = doc.create_element(mods("name"));
        doc.set_attribute(name, QName::local("type"), "personal").unwrap();
        doc.set_attribute(name, QName::local("type"), "corporate").unwrap();
        assert_eq!(doc.attribute(name, None, "type"), Some("corporate"));
        assert_eq!(doc.element(name).unwrap().attributes.len(), 1);
        assert!(doc.remove_attribute(name, None, "type"));
        assert_eq!(doc.attribute(name, None, "type"), None);
    }

    #[test]
    fn test_set_text_keeps_child_elements() {
        let mut doc = Document::new();
        let place = doc.create_element(mods("place"));
        let term = doc.create_element(mods("placeTerm"));
        doc.append_child(place, term).unwrap();
        let inner = doc.create_text("Colorado Springs");
        doc.append_child(term, inner).unwrap();

        doc.set_text(place, "Somewhere").unwrap();
        assert_eq!(doc.children(place).len(), 2);
        assert_eq!(doc.text_content(place), "SomewhereColorado Springs");

        doc.set_text(place, "").unwrap();
        assert_eq!(doc.children(place), &[term]);
    }

    #[test]
    fn test_set_text_reuses_the_text_node() {
        let mut doc = Document::new();
        let title = doc.create_element(mods("title"));
        for i in 0..1000 {
            doc.set_text(title, &format!("Title {}", i)).unwrap();
        }
        assert_eq!(doc.node_count(), 2);
        assert_eq!(doc.text_content(title), "Title 999");
    }

    #[test]
    fn test_removed_slots_are_reused_with_new_generation() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("mods"));
        let note = doc.create_element(mods("note"));
        doc.append_child(root, note).unwrap();
        let text = doc.create_text("gone");
        doc.append_child(note, text).unwrap();

        assert!(doc.remove(note));
        assert!(!doc.contains(note));
        assert!(!doc.contains(text));
        assert!(!doc.remove(note));
        assert_eq!(doc.node_count(), 1);

        let reused = doc.create_element(mods("genre"));
        assert_eq!(reused.index(), note.index());
        assert_ne!(reused, note);
        assert!(!doc.contains(note));
        assert!(doc.contains(reused));
    }

    #[test]
    fn test_adopt_subtree_moves_nodes() {
        let mut source = Document::new();
        let part = source.create_element(mods("namePart"));
        let text = source.create_text("Doe, Jane");
        source.append_child(part, text).unwrap();

        let mut target = Document::new();
        let (moved, elements) = target.adopt_subtree(&mut source, part).unwrap();
        assert!(!target.is_attached(moved));
        assert_eq!(target.text_content(moved), "Doe, Jane");
        assert_eq!(target.name(moved), Some(&mods("namePart")));
        assert_eq!(elements, vec![(part, moved)]);
        assert_eq!(source.node_count(), 0);
        assert!(target.adopt_subtree(&mut source, part).is_err());
    }

    #[test]
    fn test_overwrite_keeps_target_identity() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("mods"));
        let old = doc.create_element(mods("titleInfo"));
        let b = doc.create_element(mods("genre"));
        doc.append_child(root, old).unwrap();
        doc.append_child(root, b).unwrap();
        let stale = doc.create_text("old");
        doc.append_child(old, stale).unwrap();

        let fresh = doc.create_element(mods("titleInfo"));
        doc.set_attribute(fresh, QName::local("type"), "alternative").unwrap();
        let text = doc.create_text("new");
        doc.append_child(fresh, text).unwrap();

        doc.overwrite(old, fresh).unwrap();
        assert_eq!(doc.children(root), &[old, b]);
        assert_eq!(doc.text_content(old), "new");
        assert_eq!(doc.attribute(old, None, "type"), Some("alternative"));
        assert!(!doc.contains(fresh));
        assert!(!doc.contains(stale));
        assert_eq!(doc.relocation(fresh).map(|r| r.node), Some(old));

        assert!(doc.overwrite(old, root).is_err());
    }

    #[test]
    fn test_insert_below_itself_is_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element(mods("relatedItem"));
        let inner = doc.create_element(mods("relatedItem"));
        doc.append_child(outer, inner).unwrap();
        assert!(doc.append_child(inner, outer).is_err());
        assert!(doc.is_within(inner, outer));
        assert!(!doc.is_within(outer, inner));
    }

    #[test]
    fn test_reachability_and_location() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("mods"));
        let first = doc.create_element(mods("name"));
        let second = doc.create_element(mods("name"));
        let part = doc.create_element(mods("namePart"));
        doc.append_child(root, first).unwrap();
        doc.append_child(root, second).unwrap();
        doc.append_child(second, part).unwrap();
        assert!(!doc.is_reachable(part));

        doc.push_top_level(root).unwrap();
        assert!(doc.is_reachable(part));
        assert_eq!(
            doc.location(part),
            "/mods:mods[1]/mods:name[2]/mods:namePart[1]"
        );
    }

    #[test]
    fn test_lookup_namespace_walks_ancestors() {
        let mut doc = Document::new();
        let root = doc.create_element(mods("mods"));
        doc.declare_namespace(root, Some("mods"), "urn:mods").unwrap();
        let child = doc.create_element(mods("name"));
        doc.append_child(root, child).unwrap();
        assert_eq!(doc.lookup_namespace(child, Some("mods")), Some("urn:mods"));
        assert_eq!(doc.lookup_namespace(child, None), None);
    }
}
