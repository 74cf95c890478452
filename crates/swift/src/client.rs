//! Swift client implementation
//!
//! Every object operation goes through the same pipeline: make sure a
//! non-expired session exists, run the request, re-authenticate once on a
//! 401, and wrap all of that in the configured retry policy.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use md5::{Digest, Md5};
use reqwest::header::{CONTENT_LENGTH, ETAG, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use sc_core::{
    ClientConfig, Error, ObjectKey, ObjectStore, Operation, OperationConfig, Result,
    is_retryable_error, retry_with_delay,
};

use crate::auth::Authenticator;
use crate::session::{Session, TokenStore};
use crate::stream::{DEFAULT_CHUNK_SIZE, ObjectStream};

/// MD5 hex digest sent as the integrity tag of an upload
pub fn content_md5(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// Why a new session is requested
#[derive(Debug, Clone, Copy)]
enum Refresh {
    /// Only if the current session is missing or inside the threshold
    IfExpired,
    /// The session with this generation was rejected by the server
    Replace(u64),
    /// Unconditionally
    Always,
}

struct SwiftClientInner {
    authenticator: Authenticator,
    tokens: TokenStore,
    operation: OperationConfig,
    connect_timeout: Duration,
}

/// Client for a Swift-compatible object storage
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct SwiftClient {
    inner: Arc<SwiftClientInner>,
}

impl SwiftClient {
    /// Create a client; no request is made until the first operation
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let operation = config.operation()?;
        let authenticator = Authenticator::new(
            config.auth_url.clone(),
            config.credentials(),
            config.connect_timeout(),
        )?;

        tracing::debug!(
            auth_url = %config.auth_url,
            threshold_secs = operation.threshold.as_secs(),
            attempts = operation.retry.attempts(),
            "Creating Swift client"
        );

        Ok(Self {
            inner: Arc::new(SwiftClientInner {
                authenticator,
                tokens: TokenStore::new(operation.threshold),
                operation,
                connect_timeout: config.connect_timeout(),
            }),
        })
    }

    /// True when the next operation will authenticate first
    pub async fn is_token_expired(&self) -> bool {
        self.inner.tokens.is_expired().await
    }

    /// Authenticate now, replacing any existing session
    pub async fn authenticate(&self) -> Result<()> {
        self.refresh(Refresh::Always).await.map(|_| ())
    }

    /// Download the full content of an object
    pub async fn get(&self, key: &ObjectKey) -> Result<Bytes> {
        self.get_with_headers(key, HeaderMap::new()).await
    }

    /// Download with extra request headers such as `Range`
    pub async fn get_with_headers(&self, key: &ObjectKey, headers: HeaderMap) -> Result<Bytes> {
        let op = Operation::Get;
        self.execute(op, |session| {
            let url = session.object_url(key);
            let headers = headers.clone();
            async move {
                let response = session
                    .http()
                    .get(&url)
                    .headers(headers)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);
                let response = ensure_success(op, &url, response)?;
                response
                    .bytes()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))
            }
        })
        .await
    }

    /// Stream an object in 1 MiB chunks
    pub async fn get_stream(&self, key: &ObjectKey) -> Result<ObjectStream> {
        self.get_stream_with_chunk_size(key, DEFAULT_CHUNK_SIZE)
            .await
    }

    /// Stream an object in chunks of `chunk_size` bytes
    ///
    /// Status errors surface before the first chunk; retries never restart a
    /// stream that has already been handed out.
    pub async fn get_stream_with_chunk_size(
        &self,
        key: &ObjectKey,
        chunk_size: usize,
    ) -> Result<ObjectStream> {
        if chunk_size == 0 {
            return Err(Error::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        let op = Operation::GetStream;
        self.execute(op, |session| {
            let url = session.object_url(key);
            async move {
                let response = session
                    .http()
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);
                let response = ensure_success(op, &url, response)?;
                Ok(ObjectStream::from_response(response, url, chunk_size))
            }
        })
        .await
    }

    /// Upload content as a single object
    pub async fn put(&self, key: &ObjectKey, content: impl Into<Bytes>) -> Result<bool> {
        self.put_with_headers(key, content, HeaderMap::new()).await
    }

    /// Upload with extra request headers such as `Content-Type`
    ///
    /// `ETag` is always set to the MD5 of the content and overrides any
    /// caller-supplied value.
    pub async fn put_with_headers(
        &self,
        key: &ObjectKey,
        content: impl Into<Bytes>,
        headers: HeaderMap,
    ) -> Result<bool> {
        let content: Bytes = content.into();
        let etag = HeaderValue::from_str(&content_md5(&content))
            .map_err(|e| Error::General(format!("invalid ETag value: {e}")))?;

        let op = Operation::Put;
        self.execute(op, |session| {
            let url = session.object_url(key);
            let body = content.clone();
            let mut headers = headers.clone();
            headers.insert(ETAG, etag.clone());
            async move {
                let response = session
                    .http()
                    .put(&url)
                    .headers(headers)
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);

                let status = response.status();
                if status != StatusCode::CREATED {
                    return Err(api_error(
                        op,
                        &url,
                        &response,
                        format!("error create file: expected 201 Created, got {status}"),
                    ));
                }
                Ok(true)
            }
        })
        .await
    }

    /// Upload a byte stream as a single object
    ///
    /// The integrity tag covers the whole payload, so the stream is drained
    /// into memory before the request is sent.
    pub async fn put_stream<S>(&self, key: &ObjectKey, mut stream: S, headers: HeaderMap) -> Result<bool>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        self.put_with_headers(key, buffer.freeze(), headers).await
    }

    /// Delete an object and return the response headers
    ///
    /// Only 204 is success. With `force`, 404 is accepted as well so that
    /// deleting a missing object is idempotent.
    pub async fn remove(&self, key: &ObjectKey, force: bool) -> Result<HeaderMap> {
        let op = Operation::Remove;
        self.execute(op, |session| {
            let url = session.object_url(key);
            async move {
                let response = session
                    .http()
                    .delete(&url)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);

                let status = response.status();
                if force && status == StatusCode::NOT_FOUND {
                    return Ok(response.headers().clone());
                }
                if status != StatusCode::NO_CONTENT {
                    return Err(api_error(
                        op,
                        &url,
                        &response,
                        format!("error remove file: expected 204 No Content, got {status}"),
                    ));
                }
                Ok(response.headers().clone())
            }
        })
        .await
    }

    /// Check whether an object exists (HEAD 200 or 404)
    pub async fn exists(&self, key: &ObjectKey) -> Result<bool> {
        let op = Operation::Exists;
        self.execute(op, |session| {
            let url = session.object_url(key);
            async move {
                let response = session
                    .http()
                    .head(&url)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);

                match response.status() {
                    StatusCode::OK => Ok(true),
                    StatusCode::NOT_FOUND => Ok(false),
                    status => Err(api_error(
                        op,
                        &url,
                        &response,
                        format!("unexpected status {status}"),
                    )),
                }
            }
        })
        .await
    }

    /// Stored size of an object from the `Content-Length` of a HEAD
    pub async fn size(&self, key: &ObjectKey) -> Result<u64> {
        let op = Operation::Size;
        self.execute(op, |session| {
            let url = session.object_url(key);
            async move {
                let response = session
                    .http()
                    .head(&url)
                    .send()
                    .await
                    .map_err(|e| transport_error(op, &url, &e))?;
                log_response(op, &url, &response);

                if response.status() != StatusCode::OK {
                    return Err(api_error(op, &url, &response, format!("file {key} not found")));
                }
                parse_content_length(response.headers()).map_err(|message| {
                    Error::MalformedResponse {
                        url: url.clone(),
                        message,
                    }
                })
            }
        })
        .await
    }

    /// Absolute URL of an object
    ///
    /// Authenticates if needed to learn the storage URL, but sends no object
    /// request.
    pub async fn url(&self, key: &ObjectKey) -> Result<String> {
        let session = self.session().await?;
        let url = key.join_to(session.storage_url());
        tracing::debug!(operation = %Operation::Url, url = %url, "Resolved object URL");
        Ok(url)
    }

    /// Run a request through expiry check, 401 recovery and retry
    async fn execute<T, F, Fut>(&self, operation: Operation, request: F) -> Result<T>
    where
        F: Fn(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let request = &request;
        retry_with_delay(
            &self.inner.operation.retry,
            move || async move { self.attempt(operation, request).await },
            is_retryable_error,
        )
        .await
    }

    async fn attempt<T, F, Fut>(&self, operation: Operation, request: &F) -> Result<T>
    where
        F: Fn(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.session().await?;
        let generation = session.generation();

        match request(session).await {
            Err(err) if err.is_unauthorized() => {
                tracing::warn!(
                    operation = %operation,
                    generation,
                    "Token rejected, re-authenticating"
                );
                let session = self.refresh(Refresh::Replace(generation)).await?;
                request(session).await
            }
            result => result,
        }
    }

    /// Current session, authenticating first when it is missing or expiring
    async fn session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.inner.tokens.valid().await {
            return Ok(session);
        }
        self.refresh(Refresh::IfExpired).await
    }

    /// Single-flight re-authentication
    ///
    /// Callers queue on the refresh lock. Whoever gets it after a refresh has
    /// already happened reuses the new session instead of authenticating again.
    async fn refresh(&self, reason: Refresh) -> Result<Arc<Session>> {
        let _guard = self.inner.tokens.lock_refresh().await;
        let threshold = self.inner.tokens.threshold();

        if let Some(current) = self.inner.tokens.current().await {
            let reusable = match reason {
                Refresh::IfExpired => !current.is_expired(threshold),
                Refresh::Replace(generation) => {
                    current.generation() != generation && !current.is_expired(threshold)
                }
                Refresh::Always => false,
            };
            if reusable {
                tracing::debug!(
                    generation = current.generation(),
                    "Session already refreshed by another task"
                );
                return Ok(current);
            }
        }

        let grant = self.inner.authenticator.authenticate().await?;
        let session = self
            .inner
            .tokens
            .install(grant, self.inner.connect_timeout)
            .await?;

        tracing::info!(
            generation = session.generation(),
            storage_url = %session.storage_url(),
            expires_at = %session.expires_at(),
            "Authenticated"
        );
        Ok(session)
    }
}

impl std::fmt::Debug for SwiftClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwiftClient")
            .field("auth_url", &self.inner.authenticator.auth_url())
            .field("operation", &self.inner.operation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectStore for SwiftClient {
    async fn get_object(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        Ok(self.get(key).await?.to_vec())
    }

    async fn put_object(&self, key: &ObjectKey, content: Vec<u8>) -> Result<bool> {
        self.put(key, content).await
    }

    async fn delete_object(&self, key: &ObjectKey, force: bool) -> Result<()> {
        self.remove(key, force).await.map(|_| ())
    }

    async fn object_exists(&self, key: &ObjectKey) -> Result<bool> {
        self.exists(key).await
    }

    async fn object_size(&self, key: &ObjectKey) -> Result<u64> {
        self.size(key).await
    }

    async fn object_url(&self, key: &ObjectKey) -> Result<String> {
        self.url(key).await
    }
}

fn log_response(operation: Operation, url: &str, response: &Response) {
    tracing::info!(
        operation = %operation,
        url = %url,
        status = response.status().as_u16(),
        "Request {operation}"
    );
}

fn ensure_success(operation: Operation, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(api_error(
        operation,
        url,
        &response,
        format!("error get file: {status}"),
    ))
}

fn api_error(operation: Operation, url: &str, response: &Response, message: String) -> Error {
    Error::Api {
        operation,
        url: url.to_string(),
        status: response.status().as_u16(),
        message,
        headers: header_map(response.headers()),
    }
}

fn transport_error(operation: Operation, url: &str, err: &reqwest::Error) -> Error {
    Error::Network(format!("{operation} {url}: {err}"))
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn parse_content_length(headers: &HeaderMap) -> std::result::Result<u64, String> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or_else(|| "missing Content-Length header".to_string())?;
    let value = value
        .to_str()
        .map_err(|_| "Content-Length header is not valid text".to_string())?;
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("Content-Length is not an integer: {value}"))
}
