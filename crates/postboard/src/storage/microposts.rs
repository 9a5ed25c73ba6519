//! Micropost repository on a single table.

use std::sync::Arc;

use async_trait::async_trait;

use postboard_core::board::Micropost;
use postboard_core::storage::{
    Condition, MicropostRepository, RepositoryError, Result, TableClient,
};

use super::{keys, mapper};

const ENTITY_TYPE: &str = "Micropost";

fn not_found(user_id: u64, id: u64) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: ENTITY_TYPE,
        id: format!("{user_id}/{id}"),
    }
}

/// Microposts are stored under their owner's partition.
pub struct TableMicropostRepository<T>
where
    T: TableClient,
{
    table: Arc<T>,
}

impl<T> TableMicropostRepository<T>
where
    T: TableClient,
{
    pub fn new(table: Arc<T>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl<T> MicropostRepository for TableMicropostRepository<T>
where
    T: TableClient + 'static,
{
    async fn get(&self, user_id: u64, id: u64) -> Result<Option<Micropost>> {
        match self.table.get(&keys::micropost_key(user_id, id)).await? {
            Some(item) => Ok(Some(mapper::item_to_micropost(&item)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<Micropost>> {
        let items = self
            .table
            .query(&keys::micropost_partition(user_id), keys::POST_PREFIX)
            .await?;

        items
            .iter()
            .map(|item| mapper::item_to_micropost(item).map_err(RepositoryError::from))
            .collect()
    }

    async fn create(&self, user_id: u64, content: &str) -> Result<Micropost> {
        let id = self
            .table
            .increment(&keys::sequence_key(keys::MICROPOST_SEQUENCE))
            .await?;
        let post = Micropost::new(id, user_id, content);

        if !self.table.put_if_absent(&mapper::micropost_to_item(&post)).await? {
            return Err(RepositoryError::Conflict {
                entity_type: ENTITY_TYPE,
                id: id.to_string(),
            });
        }

        tracing::info!(micropost_id = id, user_id, "Micropost created");
        Ok(post)
    }

    async fn update(&self, user_id: u64, id: u64, content: &str) -> Result<Micropost> {
        let current = self.get(user_id, id).await?.ok_or_else(|| not_found(user_id, id))?;
        let next = current.next_version(content);

        if !self
            .table
            .put_if_version(&mapper::micropost_to_item(&next), current.version)
            .await?
        {
            return Err(RepositoryError::Conflict {
                entity_type: ENTITY_TYPE,
                id: format!("{user_id}/{id}"),
            });
        }

        tracing::info!(micropost_id = id, user_id, version = next.version, "Micropost updated");
        Ok(next)
    }

    async fn delete(&self, user_id: u64, id: u64) -> Result<()> {
        let deleted = self
            .table
            .delete_if(&keys::micropost_key(user_id, id), &Condition::Exists)
            .await?;
        if !deleted {
            return Err(not_found(user_id, id));
        }

        tracing::info!(micropost_id = id, user_id, "Micropost deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::inmemory::InMemoryTable;

    fn repo() -> TableMicropostRepository<InMemoryTable> {
        TableMicropostRepository::new(Arc::new(InMemoryTable::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo();

        let post = repo.create(1, "hello").await.unwrap();
        assert_eq!(post.id, 1);
        assert_eq!(post.version, 1);

        assert_eq!(repo.get(1, post.id).await.unwrap(), Some(post.clone()));
        // Posts are scoped to their owner.
        assert!(repo.get(2, post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_user_in_creation_order() {
        let repo = repo();
        repo.create(1, "first").await.unwrap();
        repo.create(2, "other user").await.unwrap();
        repo.create(1, "second").await.unwrap();

        let contents: Vec<String> = repo
            .list_by_user(1)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert!(repo.list_by_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update() {
        let repo = repo();
        let post = repo.create(1, "draft").await.unwrap();

        let updated = repo.update(1, post.id, "final").await.unwrap();

        assert_eq!(updated.content, "final");
        assert_eq!(updated.version, 2);
        assert_eq!(repo.get(1, post.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo();
        let result = repo.update(1, 42, "x").await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo();
        let post = repo.create(1, "bye").await.unwrap();

        repo.delete(1, post.id).await.unwrap();

        assert!(repo.get(1, post.id).await.unwrap().is_none());
        let again = repo.delete(1, post.id).await;
        assert!(matches!(again, Err(RepositoryError::NotFound { .. })));
    }
}
