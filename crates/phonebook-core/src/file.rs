//! JSON-file backed repository.
//!
//! The whole collection is kept in memory and written back to disk as a JSON
//! array after every successful mutation. Writes go to a sibling temp file
//! which is then renamed over the target. A mutation whose write fails is
//! undone in memory, so readers never see state that is not on disk.
//!
//! # Example
//!
//! ```no_run
//! use phonebook_core::{ContactFields, ContactRepository, FileRepository};
//!
//! # async fn run() -> Result<(), phonebook_core::StoreError> {
//! let repo = FileRepository::open("phonebook.json").await?;
//! repo.create(ContactFields::new("Ada", "040-123456")).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::contact::{Contact, ContactFields};
use crate::error::StoreResult;
use crate::id::ContactId;
use crate::repository::{ContactRepository, MemoryRepository};
use crate::schema::ContactSchema;

/// Repository persisted to a JSON file.
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    inner: MemoryRepository,
    /// Serializes mutate-then-persist so snapshots hit the disk in order.
    write_gate: Mutex<()>,
}

impl FileRepository {
    /// Opens (or starts) a store at `path` with the default schema.
    ///
    /// A missing or empty file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_schema(path, ContactSchema::default()).await
    }

    /// Opens a store with a custom schema.
    pub async fn open_with_schema(path: impl AsRef<Path>, schema: ContactSchema) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contacts = load(&path).await?;

        tracing::info!(
            path = %path.display(),
            contacts = contacts.len(),
            "Opened contact store"
        );

        Ok(Self {
            path,
            inner: MemoryRepository::from_contacts(schema, contacts),
            write_gate: Mutex::new(()),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(&self.inner.snapshot())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Persists the current state, or restores `id` to `previous` if the
    /// write fails. Callers hold the write gate.
    async fn commit(&self, id: ContactId, previous: Option<Contact>) -> StoreResult<()> {
        if let Err(e) = self.persist().await {
            tracing::error!(
                path = %self.path.display(),
                id = %id,
                error = %e,
                "Contact store write failed, change rolled back"
            );
            self.inner.restore(id, previous);
            return Err(e);
        }
        Ok(())
    }
}

async fn load(path: &Path) -> StoreResult<Vec<Contact>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&data)?)
}

#[async_trait]
impl ContactRepository for FileRepository {
    async fn find_all(&self) -> StoreResult<Vec<Contact>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Contact>> {
        self.inner.find_by_name(name).await
    }

    async fn create(&self, candidate: ContactFields) -> StoreResult<Contact> {
        let _gate = self.write_gate.lock().await;
        let contact = self.inner.insert(candidate)?;
        self.commit(contact.id, None).await?;
        Ok(contact)
    }

    async fn update_by_id(&self, id: &str, fields: ContactFields) -> StoreResult<Option<Contact>> {
        let _gate = self.write_gate.lock().await;
        let previous = self.inner.find_by_id(id).await?;
        let updated = self.inner.apply(id, fields)?;
        if let Some(contact) = &updated {
            self.commit(contact.id, previous).await?;
        }
        Ok(updated)
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let _gate = self.write_gate.lock().await;
        if let Some(previous) = self.inner.find_by_id(id).await? {
            self.inner.remove(id)?;
            self.commit(previous.id, Some(previous)).await?;
        }
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }
}
