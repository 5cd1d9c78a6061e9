//! XML serializer
//!
//! This module writes a [`Document`] (or one subtree of it) back to XML text.
//! Namespace declarations recorded on elements are written as-is; any
//! namespace an element or attribute needs that is not in scope at that
//! point is declared on the element, which is how synthesized nodes end up
//! carrying `xmlns:mods`.

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::namespace::{get_global_namespace_prefix, ns};
use crate::core::node::{Document, NodeId, NodeKind, XmlDeclaration};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Options controlling serialization output
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializeOptions {
    /// Write the `<?xml ...?>` declaration
    pub xml_declaration: bool,
    /// Indent nested elements by this many spaces
    pub indent: Option<usize>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            indent: None,
        }
    }
}

impl SerializeOptions {
    /// Omit the XML declaration
    pub fn without_declaration(mut self) -> Self {
        self.xml_declaration = false;
        self
    }

    /// Pretty-print with `width` spaces per level
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }
}

/// Prefix bindings visible while writing, innermost last
type Bindings = Vec<(Option<String>, String)>;

/// Serializer for XML documents
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    options: SerializeOptions,
}

impl XmlSerializer {
    /// Create a serializer with the given options
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    /// Serialize a whole document, including top-level comments and PIs
    pub fn serialize_document(&self, doc: &Document) -> XmlMapResult<String> {
        if doc.root().is_none() {
            return Err(XmlMapError::SerializationError(
                "Document has no root element".to_string(),
            ));
        }
        let mut writer = self.writer();
        self.write_declaration(&mut writer, doc.declaration())?;
        for id in doc.top_level() {
            let mut bindings = Bindings::new();
            self.write_node(&mut writer, doc, *id, &mut bindings)?;
        }
        Self::finish(writer)
    }

    /// Serialize the subtree rooted at `id`
    ///
    /// Namespaces declared on ancestors outside the subtree are re-declared
    /// on the subtree root as needed.
    pub fn serialize_node(&self, doc: &Document, id: NodeId) -> XmlMapResult<String> {
        let mut writer = self.writer();
        self.write_declaration(&mut writer, doc.declaration())?;
        let mut bindings = Bindings::new();
        self.write_node(&mut writer, doc, id, &mut bindings)?;
        Self::finish(writer)
    }

    fn writer(&self) -> Writer<Cursor<Vec<u8>>> {
        match self.options.indent {
            Some(width) => Writer::new_with_indent(Cursor::new(Vec::new()), b' ', width),
            None => Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn finish(writer: Writer<Cursor<Vec<u8>>>) -> XmlMapResult<String> {
        let result = writer.into_inner().into_inner();
        String::from_utf8(result)
            .map_err(|e| XmlMapError::SerializationError(format!("UTF-8 encoding error: {}", e)))
    }

    fn write_declaration(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        declaration: Option<&XmlDeclaration>,
    ) -> XmlMapResult<()> {
        if !self.options.xml_declaration {
            return Ok(());
        }
        let default = XmlDeclaration::default();
        let decl = declaration.unwrap_or(&default);
        writer.write_event(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )))?;
        if self.options.indent.is_none() {
            writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        }
        Ok(())
    }

    fn write_node(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        doc: &Document,
        id: NodeId,
        bindings: &mut Bindings,
    ) -> XmlMapResult<()> {
        match doc.kind(id) {
            NodeKind::Element(_) => self.write_element(writer, doc, id, bindings)?,
            NodeKind::Text(text) => {
                if self.options.indent.is_some() && text.trim().is_empty() {
                    return Ok(());
                }
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            NodeKind::CData(text) => {
                writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
            }
            NodeKind::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            }
            NodeKind::ProcessingInstruction(text) => {
                writer.write_event(Event::PI(BytesPI::new(text.as_str())))?;
            }
        }
        Ok(())
    }

    fn write_element(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        doc: &Document,
        id: NodeId,
        bindings: &mut Bindings,
    ) -> XmlMapResult<()> {
        let Some(element) = doc.element(id) else {
            return Ok(());
        };
        let scope_start = bindings.len();
        let mut declarations: Vec<(Option<String>, String)> = Vec::new();

        for decl in &element.namespace_decls {
            declarations.push((decl.prefix.clone(), decl.uri.clone()));
            bindings.push((decl.prefix.clone(), decl.uri.clone()));
        }

        // Element name
        let name = &element.name;
        let element_prefix = match (&name.prefix, &name.namespace) {
            (Some(prefix), Some(uri)) if prefix != ns::XML_PREFIX => {
                Self::ensure_bound(bindings, &mut declarations, Some(prefix.as_str()), uri);
                Some(prefix.clone())
            }
            (None, Some(uri)) => {
                Self::ensure_bound(bindings, &mut declarations, None, uri);
                None
            }
            (None, None) => {
                if Self::lookup(bindings, None).is_some_and(|uri| !uri.is_empty()) {
                    declarations.push((None, String::new()));
                    bindings.push((None, String::new()));
                }
                None
            }
            (prefix, None) => prefix.clone(),
            (Some(prefix), Some(_)) => Some(prefix.clone()),
        };
        let element_name = match &element_prefix {
            Some(prefix) => format!("{}:{}", prefix, name.local),
            None => name.local.clone(),
        };

        // Attribute names
        let mut attributes: Vec<(String, &str)> = Vec::new();
        for attr in &element.attributes {
            let qualified = match (&attr.name.prefix, &attr.name.namespace) {
                (_, None) => attr.name.local.clone(),
                (_, Some(uri)) if uri == ns::XML => format!("{}:{}", ns::XML_PREFIX, attr.name.local),
                (Some(prefix), Some(uri)) => {
                    Self::ensure_bound(bindings, &mut declarations, Some(prefix.as_str()), uri);
                    format!("{}:{}", prefix, attr.name.local)
                }
                (None, Some(uri)) => {
                    let prefix = Self::prefix_for(bindings, uri);
                    Self::ensure_bound(bindings, &mut declarations, Some(prefix.as_str()), uri);
                    format!("{}:{}", prefix, attr.name.local)
                }
            };
            attributes.push((qualified, attr.value.as_str()));
        }

        let mut start = BytesStart::new(element_name.as_str());
        for (prefix, uri) in &declarations {
            let key = match prefix {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for (key, value) in &attributes {
            start.push_attribute((key.as_str(), *value));
        }

        let children = doc.children(id);
        let has_content = children.iter().any(|child| match doc.kind(*child) {
            NodeKind::Text(text) => self.options.indent.is_none() || !text.trim().is_empty(),
            _ => true,
        });
        if !has_content {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for child in children {
                self.write_node(writer, doc, *child, bindings)?;
            }
            writer.write_event(Event::End(BytesEnd::new(element_name.as_str())))?;
        }

        bindings.truncate(scope_start);
        Ok(())
    }

    fn lookup<'a>(bindings: &'a Bindings, prefix: Option<&str>) -> Option<&'a str> {
        bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Declare `prefix` -> `uri` on the current element unless already in scope
    fn ensure_bound(
        bindings: &mut Bindings,
        declarations: &mut Vec<(Option<String>, String)>,
        prefix: Option<&str>,
        uri: &str,
    ) {
        if Self::lookup(bindings, prefix) == Some(uri) {
            return;
        }
        let prefix = prefix.map(str::to_string);
        declarations.retain(|(p, _)| *p != prefix);
        declarations.push((prefix.clone(), uri.to_string()));
        bindings.push((prefix, uri.to_string()));
    }

    /// Pick a prefix for an unprefixed namespaced attribute
    fn prefix_for(bindings: &Bindings, uri: &str) -> String {
        if let Some(prefix) = bindings
            .iter()
            .rev()
            .find_map(|(p, u)| (u == uri).then_some(p.clone()).flatten())
        {
            return prefix;
        }
        if let Some(prefix) = get_global_namespace_prefix(uri) {
            if Self::lookup(bindings, Some(prefix.as_str())).is_none() {
                return prefix;
            }
        }
        let mut n = 0;
        loop {
            let candidate = format!("ns{}", n);
            if Self::lookup(bindings, Some(candidate.as_str())).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
