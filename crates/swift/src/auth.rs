//! Credential exchange against the auth endpoint
//!
//! `GET {auth_url}` with `X-Auth-User` / `X-Auth-Key`. A successful handshake
//! answers 204 with the token lifetime, the storage base URL and the token.

use std::fmt;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use sc_core::{Credentials, Error, Result};

pub const AUTH_USER_HEADER: &str = "X-Auth-User";
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";
pub const EXPIRE_HEADER: &str = "X-Expire-Auth-Token";
pub const STORAGE_URL_HEADER: &str = "X-Storage-Url";

/// Token data returned by a successful handshake
#[derive(Clone)]
pub struct Grant {
    pub token: String,
    /// Base URL for object requests, one trailing separator stripped
    pub storage_url: String,
    pub expires_at: Timestamp,
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grant")
            .field("token", &"***")
            .field("storage_url", &self.storage_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Performs the credential handshake
#[derive(Debug)]
pub struct Authenticator {
    http: reqwest::Client,
    auth_url: String,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(
        auth_url: impl Into<String>,
        credentials: Credentials,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            auth_url: auth_url.into(),
            credentials,
        })
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Exchange credentials for a token
    ///
    /// Missing credentials fail before any request is sent.
    pub async fn authenticate(&self) -> Result<Grant> {
        self.credentials.validate()?;

        tracing::debug!(
            auth_url = %self.auth_url,
            user = %self.credentials.user,
            "Authenticating"
        );

        let response = self
            .http
            .get(&self.auth_url)
            .header(AUTH_USER_HEADER, &self.credentials.user)
            .header(AUTH_KEY_HEADER, &self.credentials.password)
            .send()
            .await
            .map_err(|e| Error::Network(format!("auth request to {} failed: {e}", self.auth_url)))?;

        let status = response.status();
        tracing::info!(
            auth_url = %self.auth_url,
            status = status.as_u16(),
            "Request AUTH"
        );

        if status != StatusCode::NO_CONTENT {
            return Err(Error::Auth {
                status: status.as_u16(),
                message: format!("authenticate error ({status})"),
            });
        }

        parse_grant(response.headers(), Timestamp::now())
    }
}

/// Read the three handshake headers of a 204 response
fn parse_grant(headers: &HeaderMap, now: Timestamp) -> Result<Grant> {
    let expires_in = required_header(headers, EXPIRE_HEADER)?;
    let expires_in: i64 = expires_in.trim().parse().map_err(|_| Error::Auth {
        status: 204,
        message: format!("{EXPIRE_HEADER} is not an integer: {expires_in}"),
    })?;
    let expires_at = now
        .checked_add(SignedDuration::from_secs(expires_in))
        .map_err(|e| Error::Auth {
            status: 204,
            message: format!("{EXPIRE_HEADER} is out of range: {e}"),
        })?;

    let storage_url = required_header(headers, STORAGE_URL_HEADER)?;
    let storage_url = storage_url
        .strip_suffix('/')
        .unwrap_or(storage_url)
        .to_string();
    if storage_url.is_empty() {
        return Err(Error::Auth {
            status: 204,
            message: format!("{STORAGE_URL_HEADER} is empty"),
        });
    }

    let token = required_header(headers, crate::session::AUTH_TOKEN_HEADER)?.to_string();

    Ok(Grant {
        token,
        storage_url,
        expires_at,
    })
}

fn required_header<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str> {
    headers
        .get(name)
        .ok_or_else(|| Error::Auth {
            status: 204,
            message: format!("missing {name} header"),
        })?
        .to_str()
        .map_err(|_| Error::Auth {
            status: 204,
            message: format!("{name} header is not valid text"),
        })
}
