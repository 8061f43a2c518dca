//! Property attributes and strictness.

use crate::error::{JsError, JsResult};

bitflags::bitflags! {
    /// Property attribute flags.
    ///
    /// The default is a plain assignment-created property: writable,
    /// enumerable and configurable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        /// Value can be changed by assignment.
        const WRITABLE = 1 << 0;
        /// Property shows up in key enumeration.
        const ENUMERABLE = 1 << 1;
        /// Property can be deleted or redefined.
        const CONFIGURABLE = 1 << 2;
    }
}

impl Default for Attributes {
    #[inline]
    fn default() -> Self {
        Self::all()
    }
}

impl Attributes {
    /// Writable and configurable, but hidden from enumeration.
    #[inline]
    pub const fn hidden() -> Self {
        Self::WRITABLE.union(Self::CONFIGURABLE)
    }

    /// Neither writable nor enumerable, still configurable.
    #[inline]
    pub const fn read_only_hidden() -> Self {
        Self::CONFIGURABLE
    }

    /// Check if property is writable.
    #[inline]
    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    /// Check if property is enumerable.
    #[inline]
    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    /// Check if property is configurable.
    #[inline]
    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }
}

/// Whether a rejected operation raises or silently fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Rejections return `false`.
    #[default]
    Sloppy,
    /// Rejections raise a `TypeError`.
    Strict,
}

impl Strictness {
    /// Turns a rejected operation into the caller-selected outcome.
    ///
    /// ```
    /// use core_types::Strictness;
    ///
    /// assert_eq!(Strictness::Sloppy.reject("nope"), Ok(false));
    /// assert!(Strictness::Strict.reject("nope").is_err());
    /// ```
    pub fn reject(self, message: impl Into<String>) -> JsResult<bool> {
        match self {
            Strictness::Sloppy => Ok(false),
            Strictness::Strict => Err(JsError::type_error(message)),
        }
    }

    /// True in strict mode.
    #[inline]
    pub fn is_strict(self) -> bool {
        self == Strictness::Strict
    }
}
