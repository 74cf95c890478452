//! sc-swift: Swift object storage client for scdn
//!
//! Implements the `ObjectStore` trait from sc-core on top of `reqwest`,
//! handling the auth handshake, token refresh and retries.

pub mod auth;
pub mod client;
pub mod session;
pub mod stream;

pub use auth::{Authenticator, Grant};
pub use client::{SwiftClient, content_md5};
pub use session::{Session, TokenStore};
pub use stream::{DEFAULT_CHUNK_SIZE, ObjectStream};
