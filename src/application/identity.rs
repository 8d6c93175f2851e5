use super::events::EventPublisher;
use crate::domain::identity::{Temple, User, contact, required};
use crate::domain::ids::{TempleId, UserId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::state::{ChangeSet, Mutation, Receipt};
use crate::error::{EntityKind, LedgerError, Result};

/// Registers users and temples and resolves them by id.
#[derive(Clone)]
pub struct IdentityStore {
    store: LedgerStoreRef,
    events: EventPublisher,
}

impl IdentityStore {
    pub fn new(store: LedgerStoreRef, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Fails with `DuplicateKey` if another user already holds `email`.
    pub async fn create_user(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<UserId> {
        let name = required("name", name)?;
        let (email, phone) = contact(email, phone)?;
        let receipts = self
            .store
            .commit(ChangeSet::single(Mutation::CreateUser { name, email, phone }))
            .await?;
        let id = match receipts.first() {
            Some(Receipt::UserCreated(user)) => user.id,
            _ => return Err(LedgerError::internal("user commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(id)
    }

    /// Replaces the user's email and phone; the only permitted change to a user.
    pub async fn update_contact(
        &self,
        user: UserId,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User> {
        let (email, phone) = contact(email, phone)?;
        let receipts = self
            .store
            .commit(ChangeSet::single(Mutation::UpdateContact { user, email, phone }))
            .await?;
        let updated = match receipts.first() {
            Some(Receipt::ContactUpdated(user)) => user.clone(),
            _ => return Err(LedgerError::internal("contact commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(updated)
    }

    pub async fn create_temple(&self, name: &str, location: &str) -> Result<TempleId> {
        let name = required("name", name)?;
        let location = required("location", location)?;
        let receipts = self
            .store
            .commit(ChangeSet::single(Mutation::CreateTemple { name, location }))
            .await?;
        let id = match receipts.first() {
            Some(Receipt::TempleCreated(temple)) => temple.id,
            _ => return Err(LedgerError::internal("temple commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(id)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.store
            .snapshot()
            .await?
            .user(id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::User,
                id: id.value(),
            })
    }

    pub async fn get_temple(&self, id: TempleId) -> Result<Temple> {
        self.store
            .snapshot()
            .await?
            .temple(id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Temple,
                id: id.value(),
            })
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        Ok(self.store.snapshot().await?.users().cloned().collect())
    }

    pub async fn temples(&self) -> Result<Vec<Temple>> {
        Ok(self.store.snapshot().await?.temples().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::harness;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let h = harness();
        let id = h
            .identity
            .create_user("Rama", Some("rama@gmail.com"), Some("9000000000"))
            .await
            .unwrap();
        assert_eq!(id, UserId(1));

        let user = h.identity.get_user(id).await.unwrap();
        assert_eq!(user.name, "Rama");
        assert_eq!(user.email.as_deref(), Some("rama@gmail.com"));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let h = harness();
        h.identity
            .create_user("Rama", Some("rama@gmail.com"), None)
            .await
            .unwrap();
        let result = h
            .identity
            .create_user("Impostor", Some("rama@gmail.com"), None)
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::DuplicateKey {
                entity: EntityKind::User,
                ..
            })
        ));
        assert_eq!(h.identity.users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_users_without_email_do_not_collide() {
        let h = harness();
        h.identity.create_user("Rama", None, None).await.unwrap();
        h.identity.create_user("Sita", None, None).await.unwrap();
        assert_eq!(h.identity.users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_commit() {
        let h = harness();
        let result = h.identity.create_temple(" ", "Tirupati").await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert!(h.sink.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_misses() {
        let h = harness();
        assert!(matches!(
            h.identity.get_user(UserId(5)).await,
            Err(LedgerError::NotFound {
                entity: EntityKind::User,
                id: 5
            })
        ));
        assert!(matches!(
            h.identity.get_temple(TempleId(5)).await,
            Err(LedgerError::NotFound {
                entity: EntityKind::Temple,
                id: 5
            })
        ));
    }

    #[tokio::test]
    async fn test_update_contact() {
        let h = harness();
        let id = h
            .identity
            .create_user("Rama", Some("rama@gmail.com"), None)
            .await
            .unwrap();
        let user = h
            .identity
            .update_contact(id, None, Some("9000000000"))
            .await
            .unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.phone.as_deref(), Some("9000000000"));
        assert_eq!(user.name, "Rama");

        assert!(matches!(
            h.identity.update_contact(UserId(9), None, None).await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
