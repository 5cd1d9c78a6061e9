//! Namespace management
//!
//! This module handles prefix to URI mappings. Schema definitions declare a
//! [`NamespaceContext`] which is merged along the `extends` chain; a global
//! registry supplies fallback prefixes when the serializer has to declare a
//! namespace that no element in scope names.

use crate::core::error::{XmlMapError, XmlMapResult};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

// Global namespace registry for thread safety
static GLOBAL_NAMESPACE_MAP: OnceLock<RwLock<NamespaceMap>> = OnceLock::new();

/// Well-known namespaces
pub mod ns {
    /// MODS v3 namespace
    pub const MODS: &str = "http://www.loc.gov/standards/mods/v3/";
    /// XLink namespace
    pub const XLINK: &str = "http://www.w3.org/1999/xlink";
    /// XML Schema instance namespace
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    /// XML namespace (for xml:lang, etc.)
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Namespace of `xmlns` declarations themselves
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
    /// MODS prefix
    pub const MODS_PREFIX: &str = "mods";
    /// XLink prefix
    pub const XLINK_PREFIX: &str = "xlink";
    /// XML Schema instance prefix
    pub const XSI_PREFIX: &str = "xsi";
    /// XML prefix
    pub const XML_PREFIX: &str = "xml";
}

/// Ordered prefix to URI mapping used to qualify path expressions
///
/// Later entries with an existing prefix replace the earlier URI in place, so
/// iteration order is the order in which prefixes were first declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    entries: Vec<(String, String)>,
}

impl NamespaceContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, prefix: &str, uri: &str) -> Self {
        self.insert(prefix, uri);
        self
    }

    /// Declare `prefix`, shadowing any previous URI bound to it
    pub fn insert(&mut self, prefix: &str, uri: &str) {
        match self.entries.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.to_string(),
            None => self.entries.push((prefix.to_string(), uri.to_string())),
        }
    }

    /// Get the URI bound to a prefix
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        if prefix == ns::XML_PREFIX {
            return Some(ns::XML);
        }
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Get the first prefix bound to a URI
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Iterate `(prefix, uri)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a parent and a child context; the child wins on prefix collision
    pub fn merge(parent: &NamespaceContext, child: &NamespaceContext) -> NamespaceContext {
        let mut merged = parent.clone();
        for (prefix, uri) in child.iter() {
            merged.insert(prefix, uri);
        }
        merged
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for NamespaceContext {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut context = NamespaceContext::new();
        for (prefix, uri) in iter {
            context.insert(prefix, uri);
        }
        context
    }
}

/// Map of namespace URI to prefix
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    uri_to_prefix: HashMap<String, String>,
    prefix_to_uri: HashMap<String, String>,
}

impl NamespaceMap {
    /// Create a new namespace map with well-known namespaces registered
    pub fn new() -> Self {
        let mut map = Self::default();
        map.register_builtin_namespaces();
        map
    }

    /// Register a namespace URI with a prefix
    ///
    /// Returns an error if the prefix is already registered to a different URI
    pub fn register(&mut self, uri: &str, prefix: &str) -> XmlMapResult<()> {
        if let Some(existing_uri) = self.prefix_to_uri.get(prefix) {
            if existing_uri != uri {
                return Err(XmlMapError::BadParam(format!(
                    "Prefix '{}' is already registered to '{}'",
                    prefix, existing_uri
                )));
            }
            return Ok(());
        }

        self.uri_to_prefix
            .insert(uri.to_string(), prefix.to_string());
        self.prefix_to_uri
            .insert(prefix.to_string(), uri.to_string());
        Ok(())
    }

    /// Get the prefix for a namespace URI
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefix.get(uri).map(|s| s.as_str())
    }

    /// Get the URI for a namespace prefix
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(|s| s.as_str())
    }

    /// Check if a namespace URI is registered
    pub fn has_uri(&self, uri: &str) -> bool {
        self.uri_to_prefix.contains_key(uri)
    }

    fn register_builtin_namespaces(&mut self) {
        // These should never fail, so we use unwrap
        self.register(ns::MODS, ns::MODS_PREFIX).unwrap();
        self.register(ns::XLINK, ns::XLINK_PREFIX).unwrap();
        self.register(ns::XSI, ns::XSI_PREFIX).unwrap();
        self.register(ns::XML, ns::XML_PREFIX).unwrap();
    }
}

fn get_global_namespace_map() -> &'static RwLock<NamespaceMap> {
    GLOBAL_NAMESPACE_MAP.get_or_init(|| RwLock::new(NamespaceMap::new()))
}

/// Register a namespace URI with a prefix in the global registry
pub fn register_namespace(uri: &str, prefix: &str) -> XmlMapResult<()> {
    if uri.is_empty() {
        return Err(XmlMapError::BadParam("URI cannot be empty".to_string()));
    }
    if prefix.is_empty() {
        return Err(XmlMapError::BadParam("Prefix cannot be empty".to_string()));
    }

    let map = get_global_namespace_map();
    let mut guard = map
        .write()
        .map_err(|_| XmlMapError::InternalError("Namespace registry lock poisoned".to_string()))?;
    guard.register(uri, prefix)
}

/// Get the prefix for a namespace URI from the global registry
pub fn get_global_namespace_prefix(uri: &str) -> Option<String> {
    let guard = get_global_namespace_map().read().ok()?;
    guard.get_prefix(uri).map(|s| s.to_string())
}

/// Get the URI for a namespace prefix from the global registry
pub fn get_global_namespace_uri(prefix: &str) -> Option<String> {
    let guard = get_global_namespace_map().read().ok()?;
    guard.get_uri(prefix).map(|s| s.to_string())
}
