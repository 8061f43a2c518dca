//! Host callables used as accessor getters and setters.

use std::fmt;
use std::rc::Rc;

use core_types::JsResult;

use crate::value::Value;

type CallFn = dyn Fn(&Value, &[Value]) -> JsResult<Value>;

/// A callable with a `this` receiver.
///
/// Language-level closures are produced by the evaluator and handed to the
/// property subsystem in this form. Cloning shares the underlying callable.
#[derive(Clone)]
pub struct JsFunction {
    name: Rc<str>,
    arity: u32,
    call: Rc<CallFn>,
}

impl JsFunction {
    /// Wraps a closure as a named function of the given arity.
    pub fn new<F>(name: &str, arity: u32, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JsResult<Value> + 'static,
    {
        JsFunction {
            name: Rc::from(name),
            arity,
            call: Rc::new(f),
        }
    }

    /// Invokes the function with `this` bound to `this`.
    #[inline]
    pub fn call(&self, this: &Value, args: &[Value]) -> JsResult<Value> {
        (self.call)(this, args)
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter count.
    pub fn arity(&self) -> u32 {
        self.arity
    }

    /// True if both handles share the same callable.
    pub fn ptr_eq(&self, other: &JsFunction) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {}() {{ [native code] }}", self.name)
    }
}
