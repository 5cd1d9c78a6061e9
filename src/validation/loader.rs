//! Schema resource loading
//!
//! A schema resource is identified by the location string a schema
//! definition carries. Loaded text is cached process-wide per location;
//! resources are assumed immutable for the life of the process.

use crate::core::error::{XmlMapError, XmlMapResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// Fetches schema text by location
pub trait SchemaLoader {
    fn load(&self, location: &str) -> XmlMapResult<String>;
}

/// Loads schemas from the local filesystem
///
/// Accepts plain paths and `file://` URLs; any other scheme is
/// [`XmlMapError::NotSupported`]. Enable the `http` feature for
/// `HttpSchemaLoader`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSchemaLoader;

impl SchemaLoader for FileSchemaLoader {
    fn load(&self, location: &str) -> XmlMapResult<String> {
        let path = match location.strip_prefix("file://") {
            Some(path) => path,
            None if location.contains("://") => {
                return Err(XmlMapError::NotSupported(format!(
                    "Cannot fetch schema '{}': only local paths and file:// URLs are supported",
                    location
                )))
            }
            None => location,
        };
        Ok(std::fs::read_to_string(Path::new(path))?)
    }
}

/// Loads `http://` and `https://` schema locations over the network
///
/// Every other location goes to [`FileSchemaLoader`]. Non-success responses
/// are [`XmlMapError::FetchError`].
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSchemaLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpSchemaLoader {
    pub fn new() -> XmlMapResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("xmlmapkit/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| XmlMapError::FetchError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl SchemaLoader for HttpSchemaLoader {
    fn load(&self, location: &str) -> XmlMapResult<String> {
        if !(location.starts_with("http://") || location.starts_with("https://")) {
            return FileSchemaLoader.load(location);
        }
        debug!(location, "fetching schema resource");
        let response = self
            .client
            .get(location)
            .send()
            .map_err(|e| XmlMapError::FetchError(format!("{}: {}", location, e)))?;
        if !response.status().is_success() {
            return Err(XmlMapError::FetchError(format!(
                "{}: HTTP {}",
                location,
                response.status().as_u16()
            )));
        }
        response
            .text()
            .map_err(|e| XmlMapError::FetchError(format!("{}: {}", location, e)))
    }
}

fn schema_cache() -> &'static RwLock<HashMap<String, Arc<str>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Arc<str>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Schema text for `location`, loading it on first use
///
/// Failed loads are not cached.
pub fn cached_schema<L: SchemaLoader + ?Sized>(loader: &L, location: &str) -> XmlMapResult<Arc<str>> {
    {
        let guard = schema_cache()
            .read()
            .map_err(|_| XmlMapError::InternalError("Schema cache lock poisoned".to_string()))?;
        if let Some(text) = guard.get(location) {
            return Ok(text.clone());
        }
    }
    let text: Arc<str> = loader.load(location)?.into();
    debug!(location, bytes = text.len(), "loaded schema resource");
    let mut guard = schema_cache()
        .write()
        .map_err(|_| XmlMapError::InternalError("Schema cache lock poisoned".to_string()))?;
    Ok(guard
        .entry(location.to_string())
        .or_insert(text)
        .clone())
}
