//! Per-call deadline decorator.
//!
//! Wraps any [`TableClient`] and bounds every call by a fixed deadline. An
//! elapsed deadline is reported as [`StoreError::Unavailable`], the same as
//! a transport failure: the outcome of the call is unknown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use postboard_core::storage::{
    Condition, Item, Key, StoreError, StoreResult, TableClient, TransactOutcome, WriteOp,
};

/// Deadline-bounded table decorator.
pub struct DeadlineTable<T>
where
    T: TableClient,
{
    inner: Arc<T>,
    deadline: Duration,
}

impl<T> DeadlineTable<T>
where
    T: TableClient,
{
    pub fn new(inner: Arc<T>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn bounded<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<R>> + Send,
    ) -> StoreResult<R> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                let deadline_ms = self.deadline.as_millis();
                tracing::warn!(operation, deadline_ms, "Store call exceeded deadline");
                Err(StoreError::Unavailable(format!(
                    "{operation} exceeded deadline of {deadline_ms}ms"
                )))
            }
        }
    }
}

#[async_trait]
impl<T> TableClient for DeadlineTable<T>
where
    T: TableClient + 'static,
{
    async fn get(&self, key: &Key) -> StoreResult<Option<Item>> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> StoreResult<Vec<Item>> {
        self.bounded("query", self.inner.query(pk, sk_prefix)).await
    }

    async fn put_if_absent(&self, item: &Item) -> StoreResult<bool> {
        self.bounded("put_if_absent", self.inner.put_if_absent(item))
            .await
    }

    async fn put_if_version(&self, item: &Item, expected: u64) -> StoreResult<bool> {
        self.bounded("put_if_version", self.inner.put_if_version(item, expected))
            .await
    }

    async fn delete_if(&self, key: &Key, condition: &Condition) -> StoreResult<bool> {
        self.bounded("delete_if", self.inner.delete_if(key, condition))
            .await
    }

    async fn increment(&self, key: &Key) -> StoreResult<u64> {
        self.bounded("increment", self.inner.increment(key)).await
    }

    fn supports_transactions(&self) -> bool {
        self.inner.supports_transactions()
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> StoreResult<TransactOutcome> {
        self.bounded("transact_write", self.inner.transact_write(ops))
            .await
    }
}

#[cfg(test)]
mod tests {
    use postboard_core::storage::AttributeValue;

    use super::*;
    use crate::storage::inmemory::InMemoryTable;
    use crate::storage::testing::FaultyTable;

    fn item() -> Item {
        Item::new(Key::new("P", "S")).with("version", AttributeValue::N(1))
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let table = DeadlineTable::new(Arc::new(InMemoryTable::new()), Duration::from_secs(1));

        assert!(table.put_if_absent(&item()).await.unwrap());
        assert!(table.get(&item().key).await.unwrap().is_some());
        assert!(table.supports_transactions());
    }

    #[tokio::test]
    async fn test_elapsed_deadline_is_unavailable() {
        let slow = FaultyTable::new(InMemoryTable::new()).with_delay(Duration::from_millis(200));
        let table = DeadlineTable::new(Arc::new(slow), Duration::from_millis(20));

        let result = table.get(&item().key).await;
        match result {
            Err(StoreError::Unavailable(msg)) => assert!(msg.contains("get")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delegates_transaction_support() {
        let table = DeadlineTable::new(
            Arc::new(InMemoryTable::without_transactions()),
            Duration::from_secs(1),
        );
        assert!(!table.supports_transactions());
    }
}
