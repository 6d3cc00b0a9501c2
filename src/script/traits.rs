/*!
 * Script Engine Traits
 * Boundary between the callback table and the scripting engine that owns handlers
 */

use std::fmt;
use std::rc::Rc;

/// Scripting engine interface consumed by the callback table
///
/// Engines are single-threaded and not reentrant from arbitrary contexts;
/// the table only calls into them from `service()` and registration paths.
pub trait ScriptEngine {
    /// Engine value handle
    type Value: Clone + fmt::Debug;

    /// Error raised by a script call
    type Error: fmt::Display;

    /// The `undefined` value, used as the call receiver
    fn undefined(&self) -> Self::Value;

    /// Whether `value` can be called
    fn is_function(&self, value: &Self::Value) -> bool;

    /// Call `function` with `this` as receiver
    fn call(
        &self,
        function: &Self::Value,
        this: &Self::Value,
        args: &[Self::Value],
    ) -> Result<Self::Value, Self::Error>;

    /// Take a new strong reference to `value`
    fn acquire(&self, value: &Self::Value) -> Self::Value {
        value.clone()
    }

    /// Give back a reference obtained from `acquire`
    fn release(&self, value: Self::Value) {
        drop(value);
    }
}

impl<E: ScriptEngine + ?Sized> ScriptEngine for Rc<E> {
    type Value = E::Value;
    type Error = E::Error;

    fn undefined(&self) -> Self::Value {
        (**self).undefined()
    }

    fn is_function(&self, value: &Self::Value) -> bool {
        (**self).is_function(value)
    }

    fn call(
        &self,
        function: &Self::Value,
        this: &Self::Value,
        args: &[Self::Value],
    ) -> Result<Self::Value, Self::Error> {
        (**self).call(function, this, args)
    }

    fn acquire(&self, value: &Self::Value) -> Self::Value {
        (**self).acquire(value)
    }

    fn release(&self, value: Self::Value) {
        (**self).release(value)
    }
}

/// A script reference the table owns
///
/// Only created through `ScriptEngine::acquire` and only disposed through
/// `ScriptEngine::release`. Not `Clone`: a second owner needs a second acquire.
#[derive(Debug)]
pub struct Retained<V>(V);

impl<V> Retained<V> {
    pub fn acquire<E>(engine: &E, value: &V) -> Self
    where
        E: ScriptEngine<Value = V> + ?Sized,
    {
        Retained(engine.acquire(value))
    }

    pub fn release<E>(self, engine: &E)
    where
        E: ScriptEngine<Value = V> + ?Sized,
    {
        engine.release(self.0)
    }

    #[inline]
    pub fn get(&self) -> &V {
        &self.0
    }
}
