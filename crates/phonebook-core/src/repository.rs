//! The contact repository contract and its in-memory implementation.
//!
//! # Contract
//!
//! | Operation | Absent target | Malformed id |
//! |---|---|---|
//! | [`find_by_id`](ContactRepository::find_by_id) | `Ok(None)` | [`StoreError::Cast`] |
//! | [`update_by_id`](ContactRepository::update_by_id) | `Ok(None)` | [`StoreError::Cast`] |
//! | [`delete_by_id`](ContactRepository::delete_by_id) | `Ok(())` | [`StoreError::Cast`] |
//!
//! [`create`](ContactRepository::create) and
//! [`update_by_id`](ContactRepository::update_by_id) run the
//! [`ContactSchema`] and fail with [`StoreError::Validation`].
//!
//! Name uniqueness is not enforced here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contact::{Contact, ContactFields};
use crate::error::StoreResult;
use crate::id::ContactId;
use crate::schema::ContactSchema;

/// Async access to the persistent collection of contacts.
#[async_trait]
pub trait ContactRepository: Send + Sync + 'static {
    /// Returns every contact, oldest first.
    async fn find_all(&self) -> StoreResult<Vec<Contact>>;

    /// Looks a contact up by id.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>>;

    /// Looks a contact up by exact, case-sensitive name.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Contact>>;

    /// Validates and inserts a new contact, assigning its id.
    async fn create(&self, candidate: ContactFields) -> StoreResult<Contact>;

    /// Validates and applies the supplied fields, returning the updated contact.
    async fn update_by_id(&self, id: &str, fields: ContactFields) -> StoreResult<Option<Contact>>;

    /// Removes a contact. Removing an unknown id succeeds.
    async fn delete_by_id(&self, id: &str) -> StoreResult<()>;

    /// Returns the number of stored contacts.
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.find_all().await?.len())
    }
}

/// In-memory repository.
///
/// Contacts are kept in id order, which is creation order.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    schema: ContactSchema,
    contacts: RwLock<BTreeMap<ContactId, Contact>>,
}

impl MemoryRepository {
    /// Creates an empty repository with the default schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository with a custom schema.
    #[must_use]
    pub fn with_schema(schema: ContactSchema) -> Self {
        Self {
            schema,
            contacts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a repository pre-populated with contacts.
    ///
    /// The contacts are trusted and not re-validated.
    #[must_use]
    pub fn from_contacts(schema: ContactSchema, contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self {
            schema,
            contacts: RwLock::new(contacts.into_iter().map(|c| (c.id, c)).collect()),
        }
    }

    /// Returns a copy of all contacts, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Contact> {
        self.contacts.read().values().cloned().collect()
    }

    pub(crate) fn insert(&self, candidate: ContactFields) -> StoreResult<Contact> {
        self.schema.validate_new(&candidate)?;

        let contact = Contact {
            id: ContactId::generate(),
            name: candidate.name.unwrap_or_default(),
            number: candidate.number.unwrap_or_default(),
        };
        self.contacts.write().insert(contact.id, contact.clone());

        tracing::debug!(id = %contact.id, name = %contact.name, "Contact created");
        Ok(contact)
    }

    pub(crate) fn apply(&self, id: &str, fields: ContactFields) -> StoreResult<Option<Contact>> {
        let id = ContactId::parse(id)?;
        self.schema.validate_update(&fields)?;

        let mut contacts = self.contacts.write();
        let Some(existing) = contacts.get_mut(&id) else {
            return Ok(None);
        };

        *existing = existing.merged(&fields);
        tracing::debug!(id = %id, "Contact updated");
        Ok(Some(existing.clone()))
    }

    /// Puts `id` back to `previous`, removing it when there was none.
    pub(crate) fn restore(&self, id: ContactId, previous: Option<Contact>) {
        let mut contacts = self.contacts.write();
        match previous {
            Some(contact) => {
                contacts.insert(id, contact);
            }
            None => {
                contacts.remove(&id);
            }
        }
    }

    pub(crate) fn remove(&self, id: &str) -> StoreResult<bool> {
        let id = ContactId::parse(id)?;
        let removed = self.contacts.write().remove(&id).is_some();
        if removed {
            tracing::debug!(id = %id, "Contact deleted");
        }
        Ok(removed)
    }
}

#[async_trait]
impl ContactRepository for MemoryRepository {
    async fn find_all(&self) -> StoreResult<Vec<Contact>> {
        Ok(self.snapshot())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>> {
        let id = ContactId::parse(id)?;
        Ok(self.contacts.read().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Contact>> {
        Ok(self
            .contacts
            .read()
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create(&self, candidate: ContactFields) -> StoreResult<Contact> {
        self.insert(candidate)
    }

    async fn update_by_id(&self, id: &str, fields: ContactFields) -> StoreResult<Option<Contact>> {
        self.apply(id, fields)
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        self.remove(id).map(|_| ())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.contacts.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const UNASSIGNED: &str = "000000000000000000000000";

    async fn seeded() -> (MemoryRepository, Contact) {
        let repo = MemoryRepository::new();
        let ada = repo
            .create(ContactFields::new("Ada Lovelace", "040-123456"))
            .await
            .unwrap();
        (repo, ada)
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let (repo, ada) = seeded().await;

        assert_eq!(ada.name, "Ada Lovelace");
        assert_eq!(ada.number, "040-123456");
        assert_eq!(repo.find_by_id(&ada.id.to_string()).await.unwrap(), Some(ada));
    }

    #[tokio::test]
    async fn test_create_validates() {
        let repo = MemoryRepository::new();
        let err = repo
            .create(ContactFields::new("Ada", "12345678"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_all_in_creation_order() {
        let repo = MemoryRepository::new();
        for (name, number) in [("Arto Hellas", "040-123456"), ("Dan Abramov", "12-43-234345"), ("Mary", "39-4423122")] {
            let _ = repo.create(ContactFields::new(name, number)).await;
        }

        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        // "12-43-234345" has two hyphens and is rejected
        assert_eq!(names, vec!["Arto Hellas", "Mary"]);
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let (repo, ada) = seeded().await;

        assert_eq!(repo.find_by_name("Ada Lovelace").await.unwrap(), Some(ada));
        assert_eq!(repo.find_by_name("ada lovelace").await.unwrap(), None);
        assert_eq!(repo.find_by_name("Ada").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_id_unassigned_and_malformed() {
        let (repo, _) = seeded().await;

        assert_eq!(repo.find_by_id(UNASSIGNED).await.unwrap(), None);
        let err = repo.find_by_id("not-an-id").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cast);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let (repo, ada) = seeded().await;

        let updated = repo
            .update_by_id(&ada.id.to_string(), ContactFields::new("Ada King", "09-999999"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, ada.id);
        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.number, "09-999999");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_invalid_number_leaves_contact_untouched() {
        let (repo, ada) = seeded().await;

        let err = repo
            .update_by_id(&ada.id.to_string(), ContactFields::new("Ada Lovelace", "bad"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let stored = repo.find_by_id(&ada.id.to_string()).await.unwrap().unwrap();
        assert_eq!(stored.number, "040-123456");
    }

    #[tokio::test]
    async fn test_update_absent_and_malformed() {
        let (repo, _) = seeded().await;

        let absent = repo
            .update_by_id(UNASSIGNED, ContactFields::new("Ada", "09-999999"))
            .await
            .unwrap();
        assert!(absent.is_none());

        let err = repo
            .update_by_id("xyz", ContactFields::new("Ada", "09-999999"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cast);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (repo, ada) = seeded().await;
        let id = ada.id.to_string();

        repo.delete_by_id(&id).await.unwrap();
        repo.delete_by_id(&id).await.unwrap();
        repo.delete_by_id(UNASSIGNED).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(
            repo.delete_by_id("bogus").await.unwrap_err().kind(),
            ErrorKind::Cast
        );
    }

    #[test]
    fn test_repository_is_object_safe() {
        let repo: std::sync::Arc<dyn ContactRepository> = std::sync::Arc::new(MemoryRepository::new());
        let created = tokio_test::block_on(repo.create(ContactFields::new("Ada", "040-123456")));
        let created = tokio_test::assert_ok!(created);
        assert_eq!(tokio_test::block_on(repo.count()).unwrap(), 1);
        assert_eq!(
            tokio_test::block_on(repo.find_by_name("Ada")).unwrap(),
            Some(created)
        );
    }

    #[tokio::test]
    async fn test_store_allows_duplicate_names() {
        let (repo, _) = seeded().await;

        // Uniqueness is a handler-level pre-check, not a store constraint.
        repo.create(ContactFields::new("Ada Lovelace", "09-999999"))
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_contacts() {
        let contact = Contact {
            id: ContactId::generate(),
            name: "Grace Hopper".to_string(),
            number: "040-555555".to_string(),
        };
        let repo = MemoryRepository::from_contacts(ContactSchema::default(), vec![contact.clone()]);

        assert_eq!(repo.snapshot(), vec![contact]);
    }
}
