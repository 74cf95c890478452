//! Session state shared by every request
//!
//! A [`Session`] is immutable once created; re-authentication installs a new
//! one in the [`TokenStore`]. Requests hold an `Arc<Session>` snapshot, so a
//! refresh never changes the headers of a request already in flight.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use reqwest::header::{HeaderMap, HeaderValue};
use sc_core::{Error, ObjectKey, Result};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::auth::Grant;

/// Header carrying the bearer token on object requests
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

const USER_AGENT: &str = concat!("scdn/", env!("CARGO_PKG_VERSION"));

/// An authenticated connection context
pub struct Session {
    storage_url: String,
    expires_at: Timestamp,
    generation: u64,
    http: reqwest::Client,
}

impl Session {
    /// Open a connection context that sends the bearer token on every request
    pub(crate) fn open(grant: Grant, generation: u64, connect_timeout: Duration) -> Result<Self> {
        let mut token = HeaderValue::from_str(&grant.token).map_err(|_| Error::Auth {
            status: 204,
            message: format!("{AUTH_TOKEN_HEADER} is not a valid header value"),
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            storage_url: grant.storage_url,
            expires_at: grant.expires_at,
            generation,
            http,
        })
    }

    /// Storage base URL without a trailing separator
    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Incremented every time a new session is installed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Request URL for an object
    pub fn object_url(&self, key: &ObjectKey) -> String {
        key.request_url(&self.storage_url)
    }

    /// Whether fewer than `threshold` remain before the token expires
    pub fn is_expired(&self, threshold: Duration) -> bool {
        self.is_expired_at(Timestamp::now(), threshold)
    }

    fn is_expired_at(&self, now: Timestamp, threshold: Duration) -> bool {
        let remaining_ms = i128::from(self.expires_at.as_millisecond()) - i128::from(now.as_millisecond());
        remaining_ms < threshold.as_millis() as i128
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("storage_url", &self.storage_url)
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Holds the current session and serialises re-authentication
#[derive(Debug)]
pub struct TokenStore {
    current: RwLock<Option<Arc<Session>>>,
    refresh: Mutex<()>,
    threshold: Duration,
}

impl TokenStore {
    pub fn new(threshold: Duration) -> Self {
        Self {
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            threshold,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Current session, expired or not
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }

    /// True when no session exists or it expires within the threshold
    pub async fn is_expired(&self) -> bool {
        self.valid().await.is_none()
    }

    /// Current session if it is still outside the safety threshold
    pub async fn valid(&self) -> Option<Arc<Session>> {
        self.current()
            .await
            .filter(|session| !session.is_expired(self.threshold))
    }

    /// Guard held for the duration of one authentication handshake
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }

    /// Replace the session wholesale
    pub(crate) async fn install(
        &self,
        grant: Grant,
        connect_timeout: Duration,
    ) -> Result<Arc<Session>> {
        let mut current = self.current.write().await;
        let generation = current.as_ref().map_or(1, |s| s.generation + 1);
        let session = Arc::new(Session::open(grant, generation, connect_timeout)?);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }
}
