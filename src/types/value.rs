//! Field value types
//!
//! This module defines the typed values scalar fields read and write, and
//! the conversions between those values and the text stored in a document.

use crate::core::error::{XmlMapError, XmlMapResult};
use std::fmt;

/// Scalar field value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum XmlValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
}

impl XmlValue {
    /// Get the value as a string, if it is a string type
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is an integer type
    pub fn as_int(&self) -> Option<i64> {
        match self {
            XmlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            XmlValue::Float(f) => Some(*f),
            XmlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is a boolean type
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            XmlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for XmlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlValue::String(s) => write!(f, "{}", s),
            XmlValue::Integer(i) => write!(f, "{}", i),
            XmlValue::Float(v) => write!(f, "{}", v),
            XmlValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for XmlValue {
    fn from(s: String) -> Self {
        XmlValue::String(s)
    }
}

impl From<&str> for XmlValue {
    fn from(s: &str) -> Self {
        XmlValue::String(s.to_string())
    }
}

impl From<&String> for XmlValue {
    fn from(s: &String) -> Self {
        XmlValue::String(s.clone())
    }
}

impl From<i64> for XmlValue {
    fn from(i: i64) -> Self {
        XmlValue::Integer(i)
    }
}

impl From<i32> for XmlValue {
    fn from(i: i32) -> Self {
        XmlValue::Integer(i64::from(i))
    }
}

impl From<f64> for XmlValue {
    fn from(f: f64) -> Self {
        XmlValue::Float(f)
    }
}

impl From<bool> for XmlValue {
    fn from(b: bool) -> Self {
        XmlValue::Boolean(b)
    }
}

/// Declared type of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ScalarType {
    /// Type name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Boolean => "boolean",
        }
    }

    /// Decode document text; `None` if the text is not a value of this type
    pub fn decode(self, text: &str) -> Option<XmlValue> {
        match self {
            ScalarType::String => Some(XmlValue::String(text.to_string())),
            ScalarType::Integer => text.trim().parse().ok().map(XmlValue::Integer),
            ScalarType::Float => text.trim().parse().ok().map(XmlValue::Float),
            ScalarType::Boolean => match text.trim() {
                "true" | "1" => Some(XmlValue::Boolean(true)),
                "false" | "0" => Some(XmlValue::Boolean(false)),
                _ => None,
            },
        }
    }

    /// Encode a value as document text for field `field`
    ///
    /// Fails with [`XmlMapError::TypeCoercion`] when the value has no
    /// representation in this type.
    pub fn encode(self, field: &str, value: &XmlValue) -> XmlMapResult<String> {
        let encoded = match (self, value) {
            (ScalarType::String, value) => Some(value.to_string()),
            (ScalarType::Integer, XmlValue::Integer(i)) => Some(i.to_string()),
            (ScalarType::Integer, XmlValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(|i| i.to_string())
            }
            (ScalarType::Float, XmlValue::Float(f)) => Some(f.to_string()),
            (ScalarType::Float, XmlValue::Integer(i)) => Some((*i as f64).to_string()),
            (ScalarType::Float, XmlValue::String(s)) => {
                s.trim().parse::<f64>().ok().map(|f| f.to_string())
            }
            (ScalarType::Boolean, XmlValue::Boolean(b)) => Some(b.to_string()),
            (ScalarType::Boolean, XmlValue::String(s)) => match s.trim() {
                "true" | "1" => Some("true".to_string()),
                "false" | "0" => Some("false".to_string()),
                _ => None,
            },
            _ => None,
        };
        encoded.ok_or_else(|| XmlMapError::TypeCoercion {
            field: field.to_string(),
            expected: self.name(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_value_accessors() {
        let value = XmlValue::String("test".to_string());
        assert_eq!(value.as_str(), Some("test"));
        assert_eq!(value.to_string(), "test");

        let value = XmlValue::Integer(42);
        assert_eq!(value.as_int(), Some(42));
        assert_eq!(value.as_float(), Some(42.0));
        assert_eq!(value.to_string(), "42");

        let value = XmlValue::Boolean(true);
        assert_eq!(value.as_bool(), Some(true));
        assert_eq!(value.to_string(), "true");
    }

    #[test]
    fn test_xml_value_from() {
        let value: XmlValue = "test".into();
        assert_eq!(value.as_str(), Some("test"));

        let value: XmlValue = 42.into();
        assert_eq!(value.as_int(), Some(42));

        let value: XmlValue = 2.5.into();
        assert_eq!(value, XmlValue::Float(2.5));

        let value: XmlValue = true.into();
        assert_eq!(value.as_bool(), Some(true));
    }

    #[test]
    fn test_decode() {
        assert_eq!(ScalarType::Integer.decode(" 1979 "), Some(XmlValue::Integer(1979)));
        assert_eq!(ScalarType::Integer.decode("circa 1979"), None);
        assert_eq!(ScalarType::Float.decode("1.5"), Some(XmlValue::Float(1.5)));
        assert_eq!(ScalarType::Boolean.decode("1"), Some(XmlValue::Boolean(true)));
        assert_eq!(ScalarType::Boolean.decode("yes"), None);
        assert_eq!(
            ScalarType::String.decode("  kept  "),
            Some(XmlValue::String("  kept  ".to_string()))
        );
    }

    #[test]
    fn test_encode() {
        assert_eq!(ScalarType::String.encode("f", &XmlValue::Integer(3)).unwrap(), "3");
        assert_eq!(ScalarType::Integer.encode("f", &"12".into()).unwrap(), "12");
        assert_eq!(ScalarType::Float.encode("f", &XmlValue::Integer(2)).unwrap(), "2");
        assert_eq!(ScalarType::Boolean.encode("f", &"0".into()).unwrap(), "false");

        let err = ScalarType::Integer.encode("year", &"soon".into()).unwrap_err();
        assert!(matches!(
            err,
            XmlMapError::TypeCoercion { ref field, expected: "integer", .. } if field == "year"
        ));
        assert!(ScalarType::Boolean.encode("f", &XmlValue::Integer(1)).is_err());
        assert!(ScalarType::Integer.encode("f", &XmlValue::Float(1.5)).is_err());
    }
}
