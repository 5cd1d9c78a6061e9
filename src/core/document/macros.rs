//! Lock macros for a shared [`DocRef`](super::handle::DocRef)
//!
//! `doc_read!` and `doc_write!` borrow the document inside functions that
//! return `XmlMapResult`. Under `multi-thread` a poisoned lock becomes
//! `InternalError` through `?`. `doc_read_opt!` is the same for functions
//! returning `Option`, where a poisoned lock reads as absent.
//!
//! The macros take the handle as given. Callers resolve relocated objects
//! with [`locate`](super::handle::locate) first and lock the handle it
//! returns.

#[cfg(not(feature = "multi-thread"))]
#[doc(hidden)]
macro_rules! doc_read {
    ($doc:expr) => {
        $crate::core::document::handle::doc_read(&$doc)
    };
}

#[cfg(feature = "multi-thread")]
#[doc(hidden)]
macro_rules! doc_read {
    ($doc:expr) => {
        $crate::core::document::handle::doc_read(&$doc).map_err(|_| {
            $crate::core::error::XmlMapError::InternalError("Document lock poisoned".to_string())
        })?
    };
}

#[cfg(not(feature = "multi-thread"))]
#[doc(hidden)]
macro_rules! doc_write {
    ($doc:expr) => {
        $crate::core::document::handle::doc_write(&$doc)
    };
}

#[cfg(feature = "multi-thread")]
#[doc(hidden)]
macro_rules! doc_write {
    ($doc:expr) => {
        $crate::core::document::handle::doc_write(&$doc).map_err(|_| {
            $crate::core::error::XmlMapError::InternalError("Document lock poisoned".to_string())
        })?
    };
}

#[cfg(not(feature = "multi-thread"))]
#[doc(hidden)]
macro_rules! doc_read_opt {
    ($doc:expr) => {
        $crate::core::document::handle::doc_read(&$doc)
    };
}

#[cfg(feature = "multi-thread")]
#[doc(hidden)]
macro_rules! doc_read_opt {
    ($doc:expr) => {
        $crate::core::document::handle::doc_read(&$doc).ok()?
    };
}
