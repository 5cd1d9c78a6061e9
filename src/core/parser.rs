//! XML parser
//!
//! This module turns XML text into a [`Document`] using `quick-xml` events.
//! Element and attribute names are resolved against the namespace
//! declarations in scope; text is kept verbatim so unmodified documents
//! serialize back to the same field values.

use crate::core::error::{XmlMapError, XmlMapResult};
use crate::core::namespace::ns;
use crate::core::node::{Document, NodeId, NodeKind, QName, XmlDeclaration};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

type Scope = Vec<(Option<String>, String)>;

/// Parser for XML documents
#[derive(Debug, Default)]
pub struct XmlParser {
    /// Namespace declarations of the open elements, innermost last
    scopes: Vec<Scope>,
}

impl XmlParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document
    pub fn parse(&mut self, xml: &str) -> XmlMapResult<Document> {
        self.scopes.clear();

        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut doc = Document::new();
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Decl(e)) => {
                    let version = e
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).to_string())
                        .unwrap_or_else(|_| "1.0".to_string());
                    let encoding = e
                        .encoding()
                        .and_then(Result::ok)
                        .map(|v| String::from_utf8_lossy(&v).to_string());
                    let standalone = e
                        .standalone()
                        .and_then(Result::ok)
                        .map(|v| String::from_utf8_lossy(&v).to_string());
                    doc.set_declaration(Some(XmlDeclaration {
                        version,
                        encoding,
                        standalone,
                    }));
                }
                Ok(Event::Start(e)) => {
                    let id = self.open_element(&mut doc, &e)?;
                    Self::attach(&mut doc, stack.last().copied(), id)?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    let id = self.open_element(&mut doc, &e)?;
                    self.scopes.pop();
                    Self::attach(&mut doc, stack.last().copied(), id)?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                    self.scopes.pop();
                }
                Ok(Event::Text(e)) => {
                    let Some(parent) = stack.last().copied() else {
                        // whitespace between top-level nodes
                        continue;
                    };
                    let raw_text = String::from_utf8_lossy(&e);
                    let text = match unescape(&raw_text) {
                        Ok(unescaped) => unescaped.to_string(),
                        Err(_) => raw_text.to_string(),
                    };
                    doc.append_text(parent, &text)?;
                }
                Ok(Event::GeneralRef(e)) => {
                    let Some(parent) = stack.last().copied() else {
                        continue;
                    };
                    let name = e
                        .decode()
                        .map_err(|err| XmlMapError::ParseError(err.to_string()))?;
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|err| XmlMapError::ParseError(err.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => match resolve_predefined_entity(&name) {
                            Some(value) => value.to_string(),
                            None => {
                                return Err(XmlMapError::ParseError(format!(
                                    "Unknown entity reference '&{};'",
                                    name
                                )))
                            }
                        },
                    };
                    doc.append_text(parent, &resolved)?;
                }
                Ok(Event::CData(e)) => {
                    let Some(parent) = stack.last().copied() else {
                        continue;
                    };
                    let text = String::from_utf8_lossy(&e).to_string();
                    let id = doc.create_node(NodeKind::CData(text));
                    doc.append_child(parent, id)?;
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    let id = doc.create_node(NodeKind::Comment(text));
                    Self::attach(&mut doc, stack.last().copied(), id)?;
                }
                Ok(Event::PI(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    let id = doc.create_node(NodeKind::ProcessingInstruction(text));
                    Self::attach(&mut doc, stack.last().copied(), id)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(XmlMapError::ParseError(format!("XML parsing error: {}", e)));
                }
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(XmlMapError::ParseError(
                "Unexpected end of input inside an element".to_string(),
            ));
        }
        if doc.root().is_none() {
            return Err(XmlMapError::ParseError("Document has no root element".to_string()));
        }
        Ok(doc)
    }

    fn attach(doc: &mut Document, parent: Option<NodeId>, id: NodeId) -> XmlMapResult<()> {
        match parent {
            Some(parent) => doc.append_child(parent, id),
            None => doc.push_top_level(id),
        }
    }

    /// Create the element for a start tag and push its namespace scope
    fn open_element(&mut self, doc: &mut Document, e: &BytesStart<'_>) -> XmlMapResult<NodeId> {
        let raw_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut scope: Scope = Vec::new();
        let mut raw_attrs: Vec<(String, String)> = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| XmlMapError::ParseError(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            // Decode XML entities in attribute values (e.g., &quot; -> ")
            let raw_value = String::from_utf8_lossy(attr.value.as_ref());
            let value = match unescape(&raw_value) {
                Ok(unescaped) => unescaped.to_string(),
                Err(_) => raw_value.to_string(),
            };
            if key == "xmlns" {
                scope.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.push((Some(prefix.to_string()), value));
            } else {
                raw_attrs.push((key, value));
            }
        }
        self.scopes.push(scope.clone());

        let name = self.resolve(&raw_name, true)?;
        let id = doc.create_element(name);
        for (prefix, uri) in &scope {
            doc.declare_namespace(id, prefix.as_deref(), uri)?;
        }
        for (key, value) in raw_attrs {
            let name = self.resolve(&key, false)?;
            doc.set_attribute(id, name, value)?;
        }
        Ok(id)
    }

    /// Resolve a raw `prefix:local` name against the current scopes
    ///
    /// Unprefixed attributes never take the default namespace.
    fn resolve(&self, raw: &str, is_element: bool) -> XmlMapResult<QName> {
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, raw),
        };
        let namespace = match prefix {
            Some(ns::XML_PREFIX) => Some(ns::XML.to_string()),
            Some(prefix) => Some(self.lookup(Some(prefix)).ok_or_else(|| {
                XmlMapError::ParseError(format!("Unbound namespace prefix '{}'", prefix))
            })?),
            None if is_element => self.lookup(None),
            None => None,
        };
        Ok(QName::new(prefix, local, namespace.as_deref()))
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p.as_deref() == prefix)
            .and_then(|(_, uri)| (!uri.is_empty()).then(|| uri.clone()))
    }
}
