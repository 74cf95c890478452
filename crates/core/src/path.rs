//! Object key parsing and URL composition
//!
//! A composite name such as `images/2024/logo.png` is split on its first `/`
//! into a container (`images`) and an object path (`2024/logo.png`).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A container/path pair addressing one object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Container name, never empty
    pub container: String,
    /// Object path inside the container, may be empty
    pub path: String,
}

impl ObjectKey {
    /// Build a key from its parts
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let container = container.into();
        if container.is_empty() {
            return Err(Error::InvalidPath("container cannot be empty".to_string()));
        }
        if container.contains('/') {
            return Err(Error::InvalidPath(format!(
                "container '{container}' cannot contain '/'"
            )));
        }
        Ok(Self {
            container,
            path: path.into(),
        })
    }

    /// Split a composite name on the first separator
    pub fn parse(name: &str) -> Result<Self> {
        match name.split_once('/') {
            Some((container, path)) => Self::new(container, path),
            None => Self::new(name, ""),
        }
    }

    /// Last segment of the object path, or the container for a bare key
    pub fn file_name(&self) -> &str {
        if self.path.is_empty() {
            return &self.container;
        }
        self.path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(self.path.as_str())
    }

    /// Compose `{base}/{container}/{path}` without percent-encoding
    pub fn join_to(&self, base: &str) -> String {
        let mut url = format!("{}/{}", base.trim_end_matches('/'), self.container);
        let path = self.path.trim_start_matches('/');
        if !path.is_empty() {
            url.push('/');
            url.push_str(path);
        }
        url
    }

    /// Compose the request URL, percent-encoding every segment
    ///
    /// Separators inside the object path are kept, so `a b/c.txt` becomes
    /// `a%20b/c.txt`.
    pub fn request_url(&self, base: &str) -> String {
        let mut url = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            urlencoding::encode(&self.container)
        );
        let path = self.path.trim_start_matches('/');
        if !path.is_empty() {
            let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
            url.push('/');
            url.push_str(&encoded.join("/"));
        }
        url
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.container)
        } else {
            write!(f, "{}/{}", self.container, self.path)
        }
    }
}

impl FromStr for ObjectKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
