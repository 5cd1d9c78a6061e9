//! Shared document handle
//!
//! Every object bound into a document holds a clone of the same handle.
//! This module abstracts over the single-threaded (`Rc<RefCell<>>`) and
//! multi-threaded (`Arc<RwLock<>>`) representations.
//!
//! A `(DocRef, NodeId)` pair is not stable on its own: splicing a detached
//! object moves its nodes into another document, and assigning over an
//! existing object field merges the new element into the old one. Both
//! leave a relocation record behind. [`locate`] follows those records so
//! that handles taken before a splice keep addressing the same element.

use crate::core::node::{Document, NodeId};

#[cfg(not(feature = "multi-thread"))]
mod impl_ {
    use super::Document;
    use std::cell::{Ref, RefCell, RefMut};
    use std::rc::Rc;

    /// Single-threaded document handle
    pub type DocRef = Rc<RefCell<Document>>;

    /// Wrap a document in a new handle
    pub fn new_doc_ref(doc: Document) -> DocRef {
        Rc::new(RefCell::new(doc))
    }

    /// Read guard for a document
    pub type DocReadGuard<'a> = Ref<'a, Document>;

    /// Write guard for a document
    pub type DocWriteGuard<'a> = RefMut<'a, Document>;

    /// Read access to the document (shared borrow)
    pub fn doc_read(doc: &DocRef) -> DocReadGuard<'_> {
        doc.borrow()
    }

    /// Write access to the document (mutable borrow)
    pub fn doc_write(doc: &DocRef) -> DocWriteGuard<'_> {
        doc.borrow_mut()
    }

    /// Execute a closure with read access to the document
    /// Always succeeds in single-threaded mode
    pub fn doc_read_with<F, R>(doc: &DocRef, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let guard = doc_read(doc);
        f(&guard)
    }

    /// Whether two handles refer to the same document
    pub fn same_doc(a: &DocRef, b: &DocRef) -> bool {
        Rc::ptr_eq(a, b)
    }
}

#[cfg(feature = "multi-thread")]
mod impl_ {
    use super::Document;
    use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    /// Multi-threaded document handle
    pub type DocRef = Arc<RwLock<Document>>;

    /// Wrap a document in a new handle
    pub fn new_doc_ref(doc: Document) -> DocRef {
        Arc::new(RwLock::new(doc))
    }

    /// Read guard for a document
    pub type DocReadGuard<'a> = RwLockReadGuard<'a, Document>;

    /// Write guard for a document
    pub type DocWriteGuard<'a> = RwLockWriteGuard<'a, Document>;

    /// Read access to the document (shared lock)
    pub fn doc_read(
        doc: &DocRef,
    ) -> Result<DocReadGuard<'_>, PoisonError<DocReadGuard<'_>>> {
        doc.read()
    }

    /// Write access to the document (exclusive lock)
    pub fn doc_write(
        doc: &DocRef,
    ) -> Result<DocWriteGuard<'_>, PoisonError<DocWriteGuard<'_>>> {
        doc.write()
    }

    /// Execute a closure with read access to the document
    /// Returns default value if lock acquisition fails
    pub fn doc_read_with<F, R>(doc: &DocRef, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
        R: Default,
    {
        match doc_read(doc) {
            Ok(guard) => f(&guard),
            Err(_) => R::default(),
        }
    }

    /// Whether two handles refer to the same document
    pub fn same_doc(a: &DocRef, b: &DocRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

pub use impl_::{doc_read, doc_read_with, doc_write, new_doc_ref, same_doc, DocRef};

#[derive(Default)]
enum Hop {
    #[default]
    Gone,
    Here,
    Within(NodeId),
    Moved(DocRef, NodeId),
}

/// Current home of `node`, following relocation records
///
/// Returns `None` when the element was removed.
pub fn locate(doc: &DocRef, node: NodeId) -> Option<(DocRef, NodeId)> {
    let mut doc = doc.clone();
    let mut node = node;
    loop {
        let hop = doc_read_with(&doc, |d| {
            if d.contains(node) {
                return Hop::Here;
            }
            match d.relocation(node) {
                Some(relocation) => match &relocation.document {
                    Some(target) => Hop::Moved(target.clone(), relocation.node),
                    None => Hop::Within(relocation.node),
                },
                None => Hop::Gone,
            }
        });
        match hop {
            Hop::Here => return Some((doc, node)),
            Hop::Gone => return None,
            Hop::Within(next) => node = next,
            Hop::Moved(target, next) => {
                doc = target;
                node = next;
            }
        }
    }
}
