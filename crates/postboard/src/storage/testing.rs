//! Fault-injecting table used by the storage tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use postboard_core::storage::{
    Condition, Item, Key, StoreError, StoreResult, TableClient, TransactOutcome, WriteOp,
};

use super::inmemory::InMemoryTable;

/// Table operation a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Get,
    Query,
    PutIfAbsent,
    PutIfVersion,
    DeleteIf,
    Increment,
    Transact,
}

#[derive(Debug, Clone, Copy)]
enum FaultKind {
    Fail,
    /// Apply the operation before failing, so the write lands but the caller
    /// sees an error.
    FailAfterApply,
    /// Sleep before running the operation.
    Stall(Duration),
}

#[derive(Debug)]
struct Fault {
    op: FaultOp,
    pk_prefix: String,
    remaining: usize,
    kind: FaultKind,
}

/// Wraps an [`InMemoryTable`] and fails selected calls with
/// [`StoreError::Unavailable`].
pub struct FaultyTable {
    inner: InMemoryTable,
    faults: Mutex<Vec<Fault>>,
    delay: Option<Duration>,
    transactions: bool,
}

impl FaultyTable {
    pub fn new(inner: InMemoryTable) -> Self {
        Self {
            transactions: inner.supports_transactions(),
            inner,
            faults: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleeps this long before every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails the next `times` calls of `op` on partitions starting with `pk_prefix`.
    pub fn fail(&self, op: FaultOp, pk_prefix: &str, times: usize) {
        self.push(op, pk_prefix, times, FaultKind::Fail);
    }

    /// Like [`fail`](Self::fail), but the write is applied first.
    pub fn fail_after_apply(&self, op: FaultOp, pk_prefix: &str, times: usize) {
        self.push(op, pk_prefix, times, FaultKind::FailAfterApply);
    }

    /// Delays the next `times` calls of `op` on partitions starting with
    /// `pk_prefix` by `delay`. The call itself runs normally afterwards.
    pub fn stall(&self, op: FaultOp, pk_prefix: &str, times: usize, delay: Duration) {
        self.push(op, pk_prefix, times, FaultKind::Stall(delay));
    }

    pub fn inner(&self) -> &InMemoryTable {
        &self.inner
    }

    fn push(&self, op: FaultOp, pk_prefix: &str, times: usize, kind: FaultKind) {
        let mut faults = self.faults.lock().unwrap();
        faults.push(Fault {
            op,
            pk_prefix: pk_prefix.to_string(),
            remaining: times,
            kind,
        });
    }

    /// Consumes a matching fault.
    fn take(&self, op: FaultOp, pks: &[&str]) -> Option<FaultKind> {
        let mut faults = self.faults.lock().unwrap();
        let fault = faults.iter_mut().find(|f| {
            f.op == op && f.remaining > 0 && pks.iter().any(|pk| pk.starts_with(&f.pk_prefix))
        })?;
        fault.remaining -= 1;
        Some(fault.kind)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn injected(op: FaultOp) -> StoreError {
        StoreError::Unavailable(format!("injected fault on {op:?}"))
    }

    async fn run<R>(
        &self,
        op: FaultOp,
        pks: &[&str],
        call: impl std::future::Future<Output = StoreResult<R>>,
    ) -> StoreResult<R> {
        self.pause().await;
        match self.take(op, pks) {
            None => call.await,
            Some(FaultKind::Fail) => Err(Self::injected(op)),
            Some(FaultKind::FailAfterApply) => {
                call.await?;
                Err(Self::injected(op))
            }
            Some(FaultKind::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                call.await
            }
        }
    }
}

#[async_trait]
impl TableClient for FaultyTable {
    async fn get(&self, key: &Key) -> StoreResult<Option<Item>> {
        self.run(FaultOp::Get, &[&key.pk], self.inner.get(key)).await
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> StoreResult<Vec<Item>> {
        self.run(FaultOp::Query, &[pk], self.inner.query(pk, sk_prefix))
            .await
    }

    async fn put_if_absent(&self, item: &Item) -> StoreResult<bool> {
        self.run(
            FaultOp::PutIfAbsent,
            &[&item.key.pk],
            self.inner.put_if_absent(item),
        )
        .await
    }

    async fn put_if_version(&self, item: &Item, expected: u64) -> StoreResult<bool> {
        self.run(
            FaultOp::PutIfVersion,
            &[&item.key.pk],
            self.inner.put_if_version(item, expected),
        )
        .await
    }

    async fn delete_if(&self, key: &Key, condition: &Condition) -> StoreResult<bool> {
        self.run(
            FaultOp::DeleteIf,
            &[&key.pk],
            self.inner.delete_if(key, condition),
        )
        .await
    }

    async fn increment(&self, key: &Key) -> StoreResult<u64> {
        self.run(FaultOp::Increment, &[&key.pk], self.inner.increment(key))
            .await
    }

    fn supports_transactions(&self) -> bool {
        self.transactions
    }

    async fn transact_write(&self, ops: &[WriteOp]) -> StoreResult<TransactOutcome> {
        let pks: Vec<&str> = ops.iter().map(|op| op.key().pk.as_str()).collect();
        self.run(FaultOp::Transact, &pks, self.inner.transact_write(ops))
            .await
    }
}
