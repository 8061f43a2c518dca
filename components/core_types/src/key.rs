//! Property keys.
//!
//! A key is either a canonical array index or a string name. Every path that
//! produces a key goes through the same canonicalisation, so `"3"`, `3` and
//! `3.0` all name the same property while `"03"`, `3.5` and `-1` are plain
//! string names.

use std::fmt;
use std::sync::Arc;

/// Largest valid array index (`2^32 - 2`).
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Name of an own property.
///
/// Keys are cheap to clone and `Send + Sync`, since shapes holding them are
/// shared with the background flattening worker.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// Canonical array index
    Index(u32),
    /// Any other name
    String(Arc<str>),
}

impl PropertyKey {
    /// Builds a key from a property name, canonicalising array indices.
    ///
    /// ```
    /// use core_types::PropertyKey;
    ///
    /// assert_eq!(PropertyKey::from_name("3"), PropertyKey::Index(3));
    /// assert!(PropertyKey::from_name("03").as_index().is_none());
    /// ```
    pub fn from_name(name: &str) -> Self {
        match parse_array_index(name) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::String(Arc::from(name)),
        }
    }

    /// Builds a key from a numeric property access (`obj[n]`).
    ///
    /// ```
    /// use core_types::PropertyKey;
    ///
    /// assert_eq!(PropertyKey::from_number(3.0), PropertyKey::Index(3));
    /// assert_eq!(PropertyKey::from_number(3.5), PropertyKey::from_name("3.5"));
    /// assert_eq!(PropertyKey::from_number(-1.0), PropertyKey::from_name("-1"));
    /// ```
    pub fn from_number(n: f64) -> Self {
        match index_from_f64(n) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::String(Arc::from(number_to_key_string(n))),
        }
    }

    /// Returns the array index if this key is one.
    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            PropertyKey::String(_) => None,
        }
    }

    /// Returns the string name if this key is not an index.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::Index(_) => None,
            PropertyKey::String(s) => Some(s),
        }
    }

    /// True for array index keys.
    pub fn is_index(&self) -> bool {
        matches!(self, PropertyKey::Index(_))
    }
}

/// Normalises a floating-point index with the cast-and-compare-back test.
///
/// Returns `Some` only for integral values in `0 ..= MAX_ARRAY_INDEX`.
/// Fractional, negative, NaN and out-of-range values yield `None` and must be
/// treated as ordinary named properties.
#[inline]
pub fn index_from_f64(n: f64) -> Option<u32> {
    if !(0.0..=MAX_ARRAY_INDEX as f64).contains(&n) {
        return None;
    }
    let index = n as u32;
    if index as f64 == n {
        Some(index)
    } else {
        None
    }
}

fn parse_array_index(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value: u64 = name.parse().ok()?;
    if value <= MAX_ARRAY_INDEX as u64 {
        Some(value as u32)
    } else {
        None
    }
}

/// String form of a number used as a property name.
pub fn number_to_key_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::String(s) => f.write_str(s),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(i) => write!(f, "#{}", i),
            PropertyKey::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::from_name(name)
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::from_name(&name)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        if index <= MAX_ARRAY_INDEX {
            PropertyKey::Index(index)
        } else {
            PropertyKey::String(Arc::from(index.to_string()))
        }
    }
}
