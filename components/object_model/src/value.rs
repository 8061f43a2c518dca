//! JavaScript value representation.
//!
//! Primitive values are stored inline, objects are shared references into the
//! single-threaded object graph.

use std::fmt;
use std::rc::Rc;

use core_types::{number_to_key_string, JsError, JsResult, PropertyKey};

use crate::object::ObjectRef;

/// Represents any JavaScript value seen by the property subsystem.
///
/// # Examples
///
/// ```
/// use object_model::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(number.type_of(), "number");
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(Rc<str>),
    /// Reference to an object
    Object(ObjectRef),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Smi(a), Value::Double(b)) | (Value::Double(b), Value::Smi(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Returns whether this value is truthy in JavaScript semantics.
    ///
    /// ```
    /// use object_model::Value;
    ///
    /// assert!(!Value::Null.is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(!Value::string("").is_truthy());
    /// assert!(Value::Smi(42).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Returns the JavaScript typeof result for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    /// Numeric view of the value, if it is a number.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// The referenced object, if this is an object value.
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// True for `undefined` and `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Converts a value used in `obj[value]` position into a property key.
    ///
    /// ```
    /// use core_types::PropertyKey;
    /// use object_model::Value;
    ///
    /// assert_eq!(Value::Double(3.0).to_property_key(), PropertyKey::Index(3));
    /// assert_eq!(Value::Smi(-1).to_property_key(), PropertyKey::from_name("-1"));
    /// assert_eq!(Value::string("3").to_property_key(), PropertyKey::Index(3));
    /// ```
    pub fn to_property_key(&self) -> PropertyKey {
        match self {
            Value::Smi(n) => PropertyKey::from_number(*n as f64),
            Value::Double(n) => PropertyKey::from_number(*n),
            Value::String(s) => PropertyKey::from_name(s),
            other => PropertyKey::from_name(&other.to_string()),
        }
    }

    /// Reads a property through the general path.
    ///
    /// Objects walk their prototype chain. `undefined` and `null` raise a
    /// `TypeError`; other primitives have no own properties in this model.
    pub fn get_property(&self, key: &PropertyKey) -> JsResult<Value> {
        match self {
            Value::Object(obj) => obj.get(key),
            Value::Undefined | Value::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                self, key
            ))),
            _ => Ok(Value::Undefined),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// JavaScript string conversion.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => f.write_str(&number_to_key_string(*n)),
            Value::String(s) => f.write_str(s),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}
