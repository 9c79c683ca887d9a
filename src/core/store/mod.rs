//! Secrets store access.
//!
//! The resolver only needs two read operations from a store, captured by
//! the [`SecretsClient`] trait. Two implementations ship with the crate:
//!
//! - [`KvdnClient`]: the KVDN REST API over HTTP
//! - [`FileStore`]: a static YAML/JSON document, for offline compiles and tests
//!
//! ## Adding a New Store
//!
//! 1. Implement the `SecretsClient` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use crate::error::StoreError;

mod fs;
mod kvdn;

pub use fs::FileStore;
pub use kvdn::KvdnClient;

/// Read access to a key-value secrets store.
pub trait SecretsClient {
    /// Read the raw value stored under `key` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is stored there, or another
    /// `StoreError` if the store can't be reached or answers garbage.
    fn get(&self, path: &str, key: &str) -> Result<String, StoreError>;

    /// List the keys stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PathNotFound` if the path doesn't exist, or
    /// another `StoreError` on transport and decode failures.
    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Store name for diagnostics.
    fn name(&self) -> &'static str;
}

impl<T: SecretsClient + ?Sized> SecretsClient for &T {
    fn get(&self, path: &str, key: &str) -> Result<String, StoreError> {
        (**self).get(path, key)
    }

    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_keys(path)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: SecretsClient + ?Sized> SecretsClient for Box<T> {
    fn get(&self, path: &str, key: &str) -> Result<String, StoreError> {
        (**self).get(path, key)
    }

    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_keys(path)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
