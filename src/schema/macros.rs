//! Macros for declaring schema object types
//!
//! [`xml_object!`](crate::xml_object) declares a handle-wrapping struct and
//! its [`XmlObject`](crate::schema::XmlObject) impl. The field macros expand
//! to typed accessor methods inside an `impl` block of such a struct.

/// Declare a struct bound to a static schema definition
///
/// ```
/// use xmlmapkit::schema::{FieldSpec, SchemaDef, XmlObject};
/// use xmlmapkit::xml_object;
///
/// static NOTE: SchemaDef = SchemaDef {
///     name: "Note",
///     root: Some("n:note"),
///     namespaces: &[("n", "urn:notes")],
///     fields: &[FieldSpec::string("text", ".")],
///     ..SchemaDef::EMPTY
/// };
///
/// xml_object! {
///     /// A free-text note
///     pub struct Note => NOTE;
/// }
///
/// let mut note = Note::new().unwrap();
/// note.handle_mut().set("text", "hello").unwrap();
/// assert_eq!(note.handle().get_string("text").as_deref(), Some("hello"));
/// ```
#[macro_export]
macro_rules! xml_object {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $schema:path;) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            handle: $crate::schema::ObjectHandle,
        }

        impl $crate::schema::XmlObject for $name {
            fn schema() -> &'static $crate::schema::SchemaDef {
                &$schema
            }

            fn from_handle(handle: $crate::schema::ObjectHandle) -> Self {
                Self { handle }
            }

            fn handle(&self) -> &$crate::schema::ObjectHandle {
                &self.handle
            }

            fn handle_mut(&mut self) -> &mut $crate::schema::ObjectHandle {
                &mut self.handle
            }

            fn into_handle(self) -> $crate::schema::ObjectHandle {
                self.handle
            }
        }
    };
}

/// Getter and setter for a string-typed scalar field
#[macro_export]
macro_rules! string_field {
    ($(#[$meta:meta])* $get:ident, $set:ident, $field:literal) => {
        $(#[$meta])*
        pub fn $get(&self) -> Option<String> {
            $crate::schema::XmlObject::handle(self).get_string($field)
        }

        pub fn $set(
            &mut self,
            value: impl Into<$crate::types::XmlValue>,
        ) -> $crate::core::error::XmlMapResult<()> {
            $crate::schema::XmlObject::handle_mut(self).set($field, value)
        }
    };
}

/// Getter, get-or-create and setter for an object field
#[macro_export]
macro_rules! node_field {
    ($(#[$meta:meta])* $get:ident, $create:ident, $set:ident, $ty:ty, $field:literal) => {
        $(#[$meta])*
        pub fn $get(&self) -> Option<$ty> {
            $crate::schema::XmlObject::handle(self).object::<$ty>($field)
        }

        pub fn $create(&mut self) -> $crate::core::error::XmlMapResult<$ty> {
            $crate::schema::XmlObject::handle_mut(self).object_or_create::<$ty>($field)
        }

        pub fn $set(&mut self, value: $ty) -> $crate::core::error::XmlMapResult<$ty> {
            $crate::schema::XmlObject::handle_mut(self).set_object($field, value)
        }
    };
}

/// Live list accessor for an object-list field
#[macro_export]
macro_rules! node_list_field {
    ($(#[$meta:meta])* $get:ident, $ty:ty, $field:literal) => {
        $(#[$meta])*
        pub fn $get(&self) -> $crate::schema::NodeList<$ty> {
            $crate::schema::XmlObject::handle(self).list::<$ty>($field)
        }
    };
}

/// Live list accessor for a scalar-list field
#[macro_export]
macro_rules! value_list_field {
    ($(#[$meta:meta])* $get:ident, $field:literal) => {
        $(#[$meta])*
        pub fn $get(&self) -> $crate::schema::ValueList {
            $crate::schema::XmlObject::handle(self).values($field)
        }
    };
}
