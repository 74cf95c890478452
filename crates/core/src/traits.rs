//! ObjectStore trait definition
//!
//! The storage adapter talks to a backend exclusively through this trait, so
//! it can be exercised against a mock in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::path::ObjectKey;

/// Object operations required by the storage adapter
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the full content of an object
    async fn get_object(&self, key: &ObjectKey) -> Result<Vec<u8>>;

    /// Upload content as a single object, replacing any existing one
    async fn put_object(&self, key: &ObjectKey, content: Vec<u8>) -> Result<bool>;

    /// Delete an object; with `force` a missing object is not an error
    async fn delete_object(&self, key: &ObjectKey, force: bool) -> Result<()>;

    /// Check whether an object exists
    async fn object_exists(&self, key: &ObjectKey) -> Result<bool>;

    /// Stored size of an object in bytes
    async fn object_size(&self, key: &ObjectKey) -> Result<u64>;

    /// Absolute URL of an object
    async fn object_url(&self, key: &ObjectKey) -> Result<String>;
}
