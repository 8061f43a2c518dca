//! Object-model configuration.
//!
//! Policies are plain data copied into each object and store at creation.
//! [`ObjectModelConfig::install`] sets the process-wide store policy that
//! object constructors copy, and configures the process-wide flattener.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flatten::{FlattenConfig, ShapeFlattener};

/// Storage-strategy thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePolicy {
    /// Non-append shape mutations (deletes, attribute changes) after which a
    /// dictionary store permanently drops shape-based storage.
    pub deletion_threshold: u32,
    /// Minimum occupied/length ratio of a dense array store.
    pub array_min_fill_ratio: f64,
    /// Array stores no longer than this are never considered sparse.
    pub array_sparse_min_len: u32,
}

impl Default for StorePolicy {
    fn default() -> Self {
        StorePolicy {
            deletion_threshold: 8,
            array_min_fill_ratio: 0.25,
            array_sparse_min_len: 64,
        }
    }
}

static INSTALLED_POLICY: Lazy<RwLock<StorePolicy>> = Lazy::new(|| RwLock::new(StorePolicy::default()));

impl StorePolicy {
    /// Policy copied into objects created from now on.
    pub fn installed() -> StorePolicy {
        *INSTALLED_POLICY.read()
    }

    /// Makes `self` the policy of objects created from now on. Existing
    /// objects keep the policy they were created with.
    pub fn install(self) {
        *INSTALLED_POLICY.write() = self;
    }

    /// True if an array of `len` slots with `occupied` elements is too sparse
    /// to stay dense.
    pub fn is_sparse(&self, len: usize, occupied: usize) -> bool {
        len > self.array_sparse_min_len as usize
            && (occupied as f64) < self.array_min_fill_ratio * len as f64
    }
}

/// Complete object-model configuration.
///
/// # Example
///
/// ```
/// use object_model::ObjectModelConfig;
///
/// let config = ObjectModelConfig::from_json(r#"{ "store": { "deletion_threshold": 4 } }"#).unwrap();
/// assert_eq!(config.store.deletion_threshold, 4);
/// assert_eq!(config.store.array_sparse_min_len, 64);
/// assert!(config.flatten.use_worker_thread);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectModelConfig {
    /// Store thresholds
    pub store: StorePolicy,
    /// Shape flattening
    pub flatten: FlattenConfig,
}

impl ObjectModelConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ObjectModelConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.store.array_min_fill_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "store.array_min_fill_ratio",
                reason: format!("{} is not in (0, 1]", ratio),
            });
        }
        if self.store.deletion_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "store.deletion_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Installs the store policy for new objects and applies the flatten
    /// section to the global flattener.
    pub fn install(&self) {
        self.store.install();
        ShapeFlattener::global().set_config(self.flatten.clone());
        tracing::debug!(config = ?self, "installed object model configuration");
    }
}
