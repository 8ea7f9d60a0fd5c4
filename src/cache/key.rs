//! Cache Key Module
//!
//! Deterministic derivation of cache keys from call arguments. Positional
//! and named arguments are serialized canonically (object keys sorted) and
//! digested with SHA-256, so identical arguments always produce the same
//! key regardless of named-argument order or process.
//!
//! # Example
//! ```
//! use devhub_core::cache::CacheKey;
//!
//! let a = CacheKey::new()
//!     .arg("issues")
//!     .named("project", "DEV")
//!     .named("limit", 50)
//!     .finish()
//!     .unwrap();
//! let b = CacheKey::new()
//!     .arg("issues")
//!     .named("limit", 50)
//!     .named("project", "DEV")
//!     .finish()
//!     .unwrap();
//! assert_eq!(a, b);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::error::{CacheError, CacheResult};

// == Digest Input ==
/// Canonical shape fed to the digest. `named` is a BTreeMap so serialization
/// order is the sorted name order.
#[derive(Serialize)]
struct KeyParts {
    args: Vec<Value>,
    named: BTreeMap<String, Value>,
}

// == Cache Key Builder ==
/// Builder assembling arguments into a 64-character lowercase hex digest.
///
/// Any `Serialize` value can participate. A value that fails to serialize
/// surfaces as [`CacheError::Key`] from [`CacheKey::finish`]; the first such
/// failure wins.
#[derive(Default)]
pub struct CacheKey {
    args: Vec<Value>,
    named: BTreeMap<String, Value>,
    error: Option<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Creates an empty key builder.
    pub fn new() -> Self {
        Self::default()
    }

    // == Positional Argument ==
    /// Appends a positional argument. Order matters.
    pub fn arg<V: Serialize>(mut self, value: V) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => self.args.push(v),
            Err(e) => self.record_error(e),
        }
        self
    }

    // == Named Argument ==
    /// Adds a named argument. Names are sorted before digesting, so the
    /// order of `named` calls never changes the key.
    pub fn named<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.named.insert(name.into(), v);
            }
            Err(e) => self.record_error(e),
        }
        self
    }

    // == Finish ==
    /// Serializes the collected arguments and returns the hex digest.
    ///
    /// # Returns
    /// - `Ok(key)` - a 64-character lowercase hex SHA-256 digest
    /// - `Err(CacheError::Key)` - an argument could not be serialized
    pub fn finish(self) -> CacheResult<String> {
        if let Some(message) = self.error {
            return Err(CacheError::Key(message));
        }

        let parts = KeyParts {
            args: self.args,
            named: self.named,
        };
        let bytes = serde_json::to_vec(&parts).map_err(|e| CacheError::Key(e.to_string()))?;

        Ok(hex::encode(Sha256::digest(bytes)))
    }

    fn record_error(&mut self, error: serde_json::Error) {
        if self.error.is_none() {
            self.error = Some(error.to_string());
        }
    }
}
