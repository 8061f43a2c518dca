//! Internal contract violations and configuration errors.
//!
//! These are not script-visible: they are rejected at construction time and
//! never surface as a [`core_types::JsError`].

use core_types::PropertyKey;

/// A collaborator required to build an object-model value was missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// A native property needs at least one host callback.
    #[error("native property requires a getter or a setter")]
    MissingNativeCallbacks,
    /// A linked descriptor must point at an existing property.
    #[error("cannot link to missing property '{0}'")]
    MissingLinkSource(PropertyKey),
}

/// Invalid object-model configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds an out-of-range value.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
