/*!
 * Local Script Engine
 * Minimal in-process engine whose functions are Rust closures
 *
 * Implements the engine boundary with reference accounting so hosts and tests
 * can check that every acquired reference is released.
 */

use super::traits::ScriptEngine;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised by local script functions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Value is not callable: {0}")]
    NotCallable(String),

    #[error("Uncaught exception: {0}")]
    Thrown(String),
}

type FunctionBody = dyn Fn(&LocalValue, &[LocalValue]) -> Result<LocalValue, ScriptError>;

/// Callable value backed by a Rust closure
#[derive(Clone)]
pub struct LocalFunction {
    name: Rc<str>,
    body: Rc<FunctionBody>,
}

impl LocalFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strong references to this function, including the caller's
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.body)
    }
}

impl fmt::Debug for LocalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// Value model of the local engine
#[derive(Clone, Debug, Default)]
pub enum LocalValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(LocalFunction),
}

impl LocalValue {
    /// Function ignoring its receiver
    pub fn function<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[LocalValue]) -> Result<LocalValue, ScriptError> + 'static,
    {
        Self::method(name, move |_this, args| body(args))
    }

    /// Function that sees its receiver
    pub fn method<F>(name: &str, body: F) -> Self
    where
        F: Fn(&LocalValue, &[LocalValue]) -> Result<LocalValue, ScriptError> + 'static,
    {
        LocalValue::Function(LocalFunction {
            name: Rc::from(name),
            body: Rc::new(body),
        })
    }

    pub fn string(s: &str) -> Self {
        LocalValue::String(Rc::from(s))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LocalValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&LocalFunction> {
        match self {
            LocalValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, LocalValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LocalValue::Null)
    }
}

impl PartialEq for LocalValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LocalValue::Undefined, LocalValue::Undefined) => true,
            (LocalValue::Null, LocalValue::Null) => true,
            (LocalValue::Bool(a), LocalValue::Bool(b)) => a == b,
            (LocalValue::Number(a), LocalValue::Number(b)) => a == b,
            (LocalValue::String(a), LocalValue::String(b)) => a == b,
            (LocalValue::Function(a), LocalValue::Function(b)) => Rc::ptr_eq(&a.body, &b.body),
            _ => false,
        }
    }
}

impl From<f64> for LocalValue {
    fn from(n: f64) -> Self {
        LocalValue::Number(n)
    }
}

impl From<bool> for LocalValue {
    fn from(b: bool) -> Self {
        LocalValue::Bool(b)
    }
}

/// Single-threaded engine with reference and call accounting
#[derive(Debug, Default)]
pub struct LocalEngine {
    acquired: Cell<u64>,
    released: Cell<u64>,
    calls: Cell<u64>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// References acquired and not yet released
    pub fn live_references(&self) -> i64 {
        self.acquired.get() as i64 - self.released.get() as i64
    }

    /// Total references ever acquired
    pub fn acquisitions(&self) -> u64 {
        self.acquired.get()
    }

    /// Number of successful and failed calls made so far
    pub fn calls(&self) -> u64 {
        self.calls.get()
    }
}

impl ScriptEngine for LocalEngine {
    type Value = LocalValue;
    type Error = ScriptError;

    fn undefined(&self) -> LocalValue {
        LocalValue::Undefined
    }

    fn is_function(&self, value: &LocalValue) -> bool {
        matches!(value, LocalValue::Function(_))
    }

    fn call(
        &self,
        function: &LocalValue,
        this: &LocalValue,
        args: &[LocalValue],
    ) -> Result<LocalValue, ScriptError> {
        match function {
            LocalValue::Function(f) => {
                self.calls.set(self.calls.get() + 1);
                (f.body)(this, args)
            }
            other => Err(ScriptError::NotCallable(format!("{:?}", other))),
        }
    }

    fn acquire(&self, value: &LocalValue) -> LocalValue {
        self.acquired.set(self.acquired.get() + 1);
        value.clone()
    }

    fn release(&self, value: LocalValue) {
        self.released.set(self.released.get() + 1);
        drop(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_function() {
        let engine = LocalEngine::new();
        let add = LocalValue::function("add", |args| {
            let sum = args.iter().filter_map(LocalValue::as_number).sum::<f64>();
            Ok(LocalValue::Number(sum))
        });

        let result = engine
            .call(&add, &engine.undefined(), &[1.0.into(), 2.5.into()])
            .unwrap();
        assert_eq!(result, LocalValue::Number(3.5));
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn test_call_non_function() {
        let engine = LocalEngine::new();
        let err = engine
            .call(&LocalValue::Null, &LocalValue::Undefined, &[])
            .unwrap_err();
        assert!(matches!(err, ScriptError::NotCallable(_)));
        assert!(!engine.is_function(&LocalValue::Null));
    }

    #[test]
    fn test_reference_accounting() {
        let engine = LocalEngine::new();
        let f = LocalValue::function("noop", |_| Ok(LocalValue::Undefined));

        let held = engine.acquire(&f);
        assert_eq!(engine.live_references(), 1);
        assert_eq!(f.as_function().unwrap().ref_count(), 2);

        engine.release(held);
        assert_eq!(engine.live_references(), 0);
        assert_eq!(f.as_function().unwrap().ref_count(), 1);
    }

    #[test]
    fn test_function_identity() {
        let f = LocalValue::function("f", |_| Ok(LocalValue::Undefined));
        let g = LocalValue::function("f", |_| Ok(LocalValue::Undefined));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }
}
