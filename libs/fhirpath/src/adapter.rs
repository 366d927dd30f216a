//! Resource adapter trait
//!
//! The engine navigates host resource trees exclusively through this
//! capability interface: ordered child lookup, declared type names and
//! polymorphic (`choice[x]`) type tests. No concrete tree shape is assumed;
//! [`crate::json::JsonAdapter`] is the bundled reference implementation.

use crate::value::{Collection, ElementHandle};

pub trait ResourceAdapter: Send + Sync {
    /// Ordered children of `element` named `name`.
    ///
    /// Primitive children arrive already converted to [`crate::Value`]s;
    /// complex children are [`crate::Value::Element`] handles. A name with
    /// no children yields the empty collection.
    fn children(&self, element: &ElementHandle, name: &str) -> Collection;

    /// The declared type name of `element` (e.g. `Patient`, `HumanName`).
    fn type_name<'a>(&self, element: &'a ElementHandle) -> &'a str {
        &element.type_name
    }

    /// Whether `element` is (or specialises) the named type, resolving
    /// `choice[x]` polymorphism where the tree records it.
    fn is_type(&self, element: &ElementHandle, type_name: &str) -> bool {
        self.type_name(element) == type_name
    }
}

/// Adapter for evaluations that never touch a resource: every element query
/// yields empty.
pub struct EmptyAdapter;

impl ResourceAdapter for EmptyAdapter {
    fn children(&self, _element: &ElementHandle, _name: &str) -> Collection {
        Collection::empty()
    }
}
