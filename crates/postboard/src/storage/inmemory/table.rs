//! In-memory `TableClient` implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use postboard_core::storage::{
    AttributeValue, Condition, Item, Key, StoreError, StoreResult, TableClient, TransactOutcome,
    WriteOp, COUNTER_ATTR,
};

/// Thread-safe in-memory table.
///
/// Each operation takes the lock once, so every conditional write is atomic
/// with respect to every other call. Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    items: Arc<RwLock<BTreeMap<Key, Item>>>,
    transactions: bool,
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTable {
    /// Creates an empty table with transaction support.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            transactions: true,
        }
    }

    /// Creates an empty table that reports no transaction support.
    #[cfg(test)]
    pub fn without_transactions() -> Self {
        Self {
            transactions: false,
            ..Self::new()
        }
    }

    /// Number of stored items whose partition key starts with `prefix`.
    #[cfg(test)]
    pub async fn count_with_prefix(&self, prefix: &str) -> usize {
        let items = self.items.read().await;
        items.keys().filter(|k| k.pk.starts_with(prefix)).count()
    }

    fn apply(items: &mut BTreeMap<Key, Item>, op: &WriteOp) {
        match op {
            WriteOp::PutIfAbsent(item) | WriteOp::PutIfVersion { item, .. } => {
                items.insert(item.key.clone(), item.clone());
            }
            WriteOp::DeleteIf { key, .. } => {
                items.remove(key);
            }
        }
    }

    async fn conditional(&self, op: WriteOp) -> bool {
        let mut items = self.items.write().await;
        if !op.precondition_holds(items.get(op.key())) {
            return false;
        }
        Self::apply(&mut items, &op);
        true
    }
}

#[async_trait]
impl TableClient for InMemoryTable {
    async fn get(&self, key: &Key) -> StoreResult<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;
        let start = Key::new(pk, sk_prefix);
        Ok(items
            .range(start..)
            .take_while(|(key, _)| key.pk == pk && key.sk.starts_with(sk_prefix))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn put_if_absent(&self, item: &Item) -> StoreResult<bool> {
        Ok(self.conditional(WriteOp::PutIfAbsent(item.clone())).await)
    }

    async fn put_if_version(&self, item: &Item, expected: u64) -> StoreResult<bool> {
        Ok(self
            .conditional(WriteOp::PutIfVersion {
                item: item.clone(),
                expected,
            })
            .await)
    }

    async fn delete_if(&self, key: &Key, condition: &Condition) -> StoreResult<bool> {
        Ok(self
            .conditional(WriteOp::DeleteIf {
                key: key.clone(),
                condition: condition.clone(),
            })
            .await)
    }

    async fn increment(&self, key: &Key) -> StoreResult<u64> {
        let mut items = self.items.write().await;
        let next = items
            .get(key)
            .and_then(|item| item.get_n(COUNTER_ATTR))
            .unwrap_or(0)
            + 1;
        items.insert(
            key.clone(),
            Item::new(key.clone()).with(COUNTER_ATTR, AttributeValue::N(next)),
        );
        Ok(next)
    }

    fn supports_transactions(&self) -> bool {
        self.transactions
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> StoreResult<TransactOutcome> {
        if !self.transactions {
            return Err(StoreError::Unsupported("transact_write"));
        }

        let mut items = self.items.write().await;
        let failed: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| !op.precondition_holds(items.get(op.key())))
            .map(|(index, _)| index)
            .collect();

        if !failed.is_empty() {
            return Ok(TransactOutcome::Cancelled { failed });
        }

        for op in ops {
            Self::apply(&mut items, op);
        }
        Ok(TransactOutcome::Committed)
    }
}
