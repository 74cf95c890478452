//! File-storage adapter on top of an [`ObjectStore`]
//!
//! Maps host-facing file names such as `media/avatars/1.png` onto container
//! and path keys, applies optional gzip compression and custom per-container
//! domains for public URLs.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::config::StorageSettings;
use crate::error::{Error, Result};
use crate::file::StoredFile;
use crate::path::ObjectKey;
use crate::traits::ObjectStore;

/// Storage adapter translating file names into object operations
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
    settings: StorageSettings,
}

impl<S: ObjectStore> Storage<S> {
    pub fn new(store: S, settings: StorageSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    /// Split a file name into an object key, ignoring leading separators
    pub fn key(name: &str) -> Result<ObjectKey> {
        ObjectKey::parse(name.trim_start_matches('/'))
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.object_exists(&Self::key(name)?).await
    }

    /// Stored size, which is the compressed size when gzip is enabled
    pub async fn size(&self, name: &str) -> Result<u64> {
        self.store.object_size(&Self::key(name)?).await
    }

    /// Public URL, using the container's custom domain when one is configured
    pub async fn url(&self, name: &str) -> Result<String> {
        let key = Self::key(name)?;
        if let Some(domain) = self.settings.domains.get(&key.container) {
            return Ok(format!(
                "{}/{}",
                domain.trim_end_matches('/'),
                key.path.trim_start_matches('/')
            ));
        }
        self.store.object_url(&key).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete_object(&Self::key(name)?, false).await
    }

    /// Save content under a free name and return the name actually used
    pub async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
        let name = self.available_name(name).await?;
        self.write_back(&name, content).await?;
        Ok(name)
    }

    /// Download content, decompressing it when gzip is enabled
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let content = self.store.get_object(&Self::key(name)?).await?;
        if self.settings.use_gz {
            return decompress(&content);
        }
        Ok(content)
    }

    /// Lazy handle over a stored file
    pub fn open(&self, name: &str) -> StoredFile<'_, S> {
        StoredFile::new(self, name)
    }

    /// Pick a name that does not collide with an existing object
    ///
    /// With `overwrite_files` the name is returned unchanged. Otherwise `_1`,
    /// `_2`, ... is inserted before the extension until a free name is found.
    pub async fn available_name(&self, name: &str) -> Result<String> {
        if self.settings.overwrite_files {
            return Ok(name.to_string());
        }

        let mut candidate = name.to_string();
        let mut counter = 0u32;
        while self.exists(&candidate).await? {
            counter += 1;
            candidate = numbered_name(name, counter);
        }
        Ok(candidate)
    }

    /// Upload content to exactly this name, compressing when enabled
    pub(crate) async fn write_back(&self, name: &str, content: &[u8]) -> Result<()> {
        let key = Self::key(name)?;
        let payload = if self.settings.use_gz {
            compress(content)?
        } else {
            content.to_vec()
        };

        tracing::debug!(
            key = %key,
            size = content.len(),
            stored = payload.len(),
            gzip = self.settings.use_gz,
            "Saving file"
        );

        if self.store.put_object(&key, payload).await? {
            Ok(())
        } else {
            Err(Error::General(format!("upload of {key} was not acknowledged")))
        }
    }
}

/// Insert `_{n}` before the extension of the last path segment
fn numbered_name(name: &str, n: u32) -> String {
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{n}.{ext}"),
        _ => format!("{file}_{n}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

fn compress(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

fn decompress(content: &[u8]) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(content).read_to_end(&mut decoded)?;
    Ok(decoded)
}
