//! Value types
//!
//! This module defines the value types stored in scalar fields.

pub mod value;

pub use value::{ScalarType, XmlValue};
