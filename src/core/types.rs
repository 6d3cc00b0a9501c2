/*!
 * Core Types
 * Common types shared by the table and its collaborators
 */

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque collaborator context passed back to hooks and native callbacks
///
/// The registering binding keeps its own reference; the table only holds a
/// clone and never frees the underlying state.
#[derive(Clone, Default)]
pub struct Context(Option<Rc<dyn Any>>);

impl Context {
    /// Context with no payload
    pub fn empty() -> Self {
        Context(None)
    }

    /// Wrap fresh binding state
    pub fn new<T: Any>(state: T) -> Self {
        Context(Some(Rc::new(state)))
    }

    /// Share state the binding already holds
    pub fn shared<T: Any>(state: Rc<T>) -> Self {
        Context(Some(state))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|state| state.downcast_ref::<T>())
    }

    /// Get a shared pointer to the payload as `T`
    pub fn downcast_rc<T: Any>(&self) -> Option<Rc<T>> {
        self.0.clone().and_then(|state| state.downcast::<T>().ok())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Context(..)"),
            None => write!(f, "Context(empty)"),
        }
    }
}
