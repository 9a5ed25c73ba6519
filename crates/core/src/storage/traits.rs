use async_trait::async_trait;

use crate::board::{Micropost, User};

use super::{Condition, Item, Key, Result, StoreError, StoreResult, TransactOutcome, WriteOp};

/// Minimal single-table key-value store with conditional writes.
///
/// Every mutation is conditional; there is no unconditional overwrite.
/// Conditional operations return `Ok(false)` when their precondition does
/// not hold, and an error only when the outcome is unknown or rejected.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Strongly consistent read of a single item.
    async fn get(&self, key: &Key) -> StoreResult<Option<Item>>;

    /// Items of partition `pk` whose sort key starts with `sk_prefix`,
    /// in ascending sort key order.
    async fn query(&self, pk: &str, sk_prefix: &str) -> StoreResult<Vec<Item>>;

    async fn put_if_absent(&self, item: &Item) -> StoreResult<bool>;

    /// Replaces the item if the stored version equals `expected`.
    async fn put_if_version(&self, item: &Item, expected: u64) -> StoreResult<bool>;

    async fn delete_if(&self, key: &Key, condition: &Condition) -> StoreResult<bool>;

    /// Atomically increments the counter at `key`, returning the new value.
    /// A missing counter starts at zero.
    async fn increment(&self, key: &Key) -> StoreResult<u64>;

    /// Whether [`transact_write`](Self::transact_write) is available.
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Applies all operations atomically, or none of them.
    async fn transact_write(&self, _ops: &[WriteOp]) -> StoreResult<TransactOutcome> {
        Err(StoreError::Unsupported("transact_write"))
    }
}

/// Repository for user operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_by_id(&self, id: u64) -> Result<Option<User>>;

    /// Lists all users in creation order.
    async fn list(&self) -> Result<Vec<User>>;

    /// Creates a user with a freshly allocated ID.
    async fn create(&self, name: &str, email: &str) -> Result<User>;

    /// Creates a user with a caller-chosen ID.
    ///
    /// Retrying with the same ID after an unknown outcome is safe: when the
    /// earlier attempt landed with the same name and email, the stored user
    /// is returned. Any other user already under that ID is a `Conflict`.
    async fn create_with_id(&self, id: u64, name: &str, email: &str) -> Result<User>;

    /// Replaces name and email of an existing user.
    async fn update(&self, id: u64, name: &str, email: &str) -> Result<User>;

    /// Deletes a user and releases their email.
    async fn delete(&self, id: u64) -> Result<()>;
}

/// Repository for micropost operations.
#[async_trait]
pub trait MicropostRepository: Send + Sync {
    async fn get(&self, user_id: u64, id: u64) -> Result<Option<Micropost>>;

    /// Lists a user's microposts in creation order.
    async fn list_by_user(&self, user_id: u64) -> Result<Vec<Micropost>>;

    async fn create(&self, user_id: u64, content: &str) -> Result<Micropost>;

    async fn update(&self, user_id: u64, id: u64, content: &str) -> Result<Micropost>;

    async fn delete(&self, user_id: u64, id: u64) -> Result<()>;
}
