//! sc-core: Core library for the scdn Swift storage client
//!
//! This crate provides the backend-independent pieces of scdn:
//! - Configuration management and documented defaults
//! - Object keys and URL composition
//! - Bounded retry policy
//! - ObjectStore trait consumed by the storage adapter
//! - Storage adapter (gzip, custom domains, naming) and lazy file handles
//!
//! The HTTP client itself lives in `sc-swift`.

pub mod config;
pub mod error;
pub mod file;
pub mod operation;
pub mod path;
pub mod retry;
pub mod storage;
pub mod traits;

pub use config::{ClientConfig, Config, ConfigManager, Credentials, OperationConfig, StorageSettings};
pub use error::{Error, Result};
pub use file::StoredFile;
pub use operation::Operation;
pub use path::ObjectKey;
pub use retry::{RetryPolicy, is_retryable_error, retry_with_delay};
pub use storage::Storage;
pub use traits::ObjectStore;
