//! Lazy file handle backed by the storage adapter
//!
//! Content is downloaded on first access and kept in memory for the lifetime
//! of the handle. Writes mark the handle dirty; closing a dirty handle uploads
//! the buffer exactly once.

use std::io::{Cursor, Read, Write};

use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::traits::ObjectStore;

enum FileState {
    Unopened,
    Open(Cursor<Vec<u8>>),
    Dirty(Cursor<Vec<u8>>),
    Closed,
}

/// A file stored in object storage, opened through [`Storage::open`]
pub struct StoredFile<'a, S> {
    storage: &'a Storage<S>,
    name: String,
    state: FileState,
    size: Option<u64>,
}

impl<'a, S: ObjectStore> StoredFile<'a, S> {
    pub(crate) fn new(storage: &'a Storage<S>, name: &str) -> Self {
        Self {
            storage,
            name: name.to_string(),
            state: FileState::Unopened,
            size: None,
        }
    }

    /// Base name of the file
    pub fn name(&self) -> &str {
        self.name
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(self.name.as_str())
    }

    /// Full storage name the handle was opened with
    pub fn path(&self) -> &str {
        &self.name
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, FileState::Dirty(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, FileState::Closed)
    }

    /// Size in bytes
    ///
    /// The stored size is fetched once and cached. A dirty handle reports the
    /// size of its local buffer.
    pub async fn size(&mut self) -> Result<u64> {
        match &self.state {
            FileState::Closed => return Err(self.closed()),
            FileState::Dirty(cursor) => return Ok(cursor.get_ref().len() as u64),
            _ => {}
        }
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self.storage.size(&self.name).await?;
        self.size = Some(size);
        Ok(size)
    }

    /// Read up to `num_bytes` from the current position, or everything left
    pub async fn read(&mut self, num_bytes: Option<usize>) -> Result<Vec<u8>> {
        let cursor = self.buffer().await?;
        let mut out = Vec::new();
        match num_bytes {
            Some(n) => {
                Read::by_ref(cursor).take(n as u64).read_to_end(&mut out)?;
            }
            None => {
                cursor.read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }

    /// Full content regardless of the current position
    pub async fn content(&mut self) -> Result<Vec<u8>> {
        let cursor = self.buffer().await?;
        Ok(cursor.get_ref().clone())
    }

    /// Split the remaining content into lines, keeping the terminators
    pub async fn read_lines(&mut self) -> Result<Vec<Vec<u8>>> {
        let rest = self.read(None).await?;
        Ok(rest
            .split_inclusive(|b| *b == b'\n')
            .map(<[u8]>::to_vec)
            .collect())
    }

    /// Write at the current position, loading existing content first
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.buffer().await?;
        let mut cursor = match std::mem::replace(&mut self.state, FileState::Closed) {
            FileState::Open(cursor) | FileState::Dirty(cursor) => cursor,
            other => {
                self.state = other;
                return Err(self.closed());
            }
        };
        let result = cursor.write_all(data);
        self.state = FileState::Dirty(cursor);
        result?;
        Ok(data.len())
    }

    /// Move the cursor back to the start
    pub fn rewind(&mut self) -> Result<()> {
        match &mut self.state {
            FileState::Open(cursor) | FileState::Dirty(cursor) => {
                cursor.set_position(0);
                Ok(())
            }
            FileState::Unopened => Ok(()),
            FileState::Closed => Err(Error::General(format!("file {} is closed", self.name))),
        }
    }

    /// Close the handle, uploading the buffer if it was modified
    ///
    /// A failed upload leaves the handle dirty so the close can be retried.
    pub async fn close(&mut self) -> Result<()> {
        if let FileState::Dirty(cursor) = &self.state {
            tracing::debug!(name = %self.name, "Saving modified file on close");
            self.storage.write_back(&self.name, cursor.get_ref()).await?;
        }
        self.state = FileState::Closed;
        Ok(())
    }

    async fn buffer(&mut self) -> Result<&mut Cursor<Vec<u8>>> {
        match self.state {
            FileState::Closed => return Err(self.closed()),
            FileState::Unopened => {
                let content = self.storage.read(&self.name).await?;
                self.state = FileState::Open(Cursor::new(content));
            }
            FileState::Open(_) | FileState::Dirty(_) => {}
        }
        match &mut self.state {
            FileState::Open(cursor) | FileState::Dirty(cursor) => Ok(cursor),
            FileState::Unopened | FileState::Closed => {
                Err(Error::General(format!("file {} is not open", self.name)))
            }
        }
    }

    fn closed(&self) -> Error {
        Error::General(format!("file {} is closed", self.name))
    }
}
