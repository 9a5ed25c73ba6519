//! Uniqueness claims.
//!
//! A key-value store has no unique secondary index, so every unique value is
//! guarded by a claim item keyed on `(dimension, value)` and owned by the id
//! of the record that uses it. The claim is the only source of truth for
//! whether a value is taken; records are never scanned to decide it.
//!
//! All state changes are single conditional writes (or one transaction), so
//! two racing requests are serialized by the store itself.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use postboard_core::board::UniquenessClaim;
use postboard_core::storage::{RepositoryError, Result, TableClient, TransactOutcome, WriteOp};

use super::{keys, mapper};

/// Dimension guarding user email addresses.
pub const USER_EMAIL: &str = "user_email";

const ENTITY_TYPE: &str = "UniquenessClaim";

/// Bound on re-reads when a claim changes between a write and its follow-up read.
const MAX_ATTEMPTS: usize = 3;

/// How [`ClaimManager::transfer`] moves a claim to a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferStrategy {
    /// Claim the new value, then release the old one.
    #[default]
    ClaimFirst,
    /// Release and claim in one store transaction.
    Transactional,
}

impl FromStr for TransferStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claim-first" | "claim_first" => Ok(TransferStrategy::ClaimFirst),
            "transactional" => Ok(TransferStrategy::Transactional),
            other => Err(format!("unknown claim transfer strategy: {other}")),
        }
    }
}

impl fmt::Display for TransferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStrategy::ClaimFirst => f.write_str("claim-first"),
            TransferStrategy::Transactional => f.write_str("transactional"),
        }
    }
}

/// Result of a successful [`ClaimManager::transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The owner now holds the new value and no longer holds the old one.
    Transferred,
    /// The owner holds the new value, but releasing the old one failed with
    /// an unknown outcome. The old claim may linger until reconciled.
    TransferredWithStaleClaim,
    /// The new value belongs to someone else. Nothing changed.
    Taken,
    /// The companion write's precondition failed and was not applied. The
    /// owner may still hold the new value; the caller settles it against the
    /// stored record.
    Rejected,
}

/// Guarantees at most one owner per value within a dimension.
pub struct ClaimManager<T>
where
    T: TableClient,
{
    table: Arc<T>,
    strategy: TransferStrategy,
}

impl<T> Clone for ClaimManager<T>
where
    T: TableClient,
{
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            strategy: self.strategy,
        }
    }
}

impl<T> ClaimManager<T>
where
    T: TableClient,
{
    /// Creates a manager using the claim-first transfer strategy.
    pub fn new(table: Arc<T>) -> Self {
        Self::with_strategy(table, TransferStrategy::ClaimFirst)
    }

    /// Creates a manager with an explicit transfer strategy.
    ///
    /// `Transactional` falls back to `ClaimFirst` when the table cannot
    /// run transactions.
    pub fn with_strategy(table: Arc<T>, strategy: TransferStrategy) -> Self {
        let strategy = if strategy == TransferStrategy::Transactional
            && !table.supports_transactions()
        {
            tracing::warn!(
                requested = %strategy,
                "Store does not support transactions, using claim-first transfers"
            );
            TransferStrategy::ClaimFirst
        } else {
            strategy
        };

        Self { table, strategy }
    }

    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    async fn current_owner(&self, dimension: &str, value: &str) -> Result<Option<u64>> {
        let item = self.table.get(&keys::claim_key(dimension, value)).await?;
        match item {
            Some(item) => Ok(Some(mapper::item_to_claim(&item)?.owner_id)),
            None => Ok(None),
        }
    }

    fn contended(dimension: &str, value: &str) -> RepositoryError {
        RepositoryError::Conflict {
            entity_type: ENTITY_TYPE,
            id: format!("{dimension}#{value}"),
        }
    }

    fn owner_mismatch(
        dimension: &'static str,
        value: &str,
        expected_owner: u64,
        actual_owner: u64,
    ) -> RepositoryError {
        tracing::error!(
            dimension,
            value,
            expected_owner,
            actual_owner,
            "Claim held by an unexpected owner"
        );
        RepositoryError::OwnerMismatch {
            dimension,
            value: value.to_string(),
            expected_owner,
            actual_owner,
        }
    }

    /// Claims `value` for `owner_id`.
    ///
    /// Returns `true` when the claim was created or is already held by
    /// `owner_id`, and `false` when another owner holds it. A store failure
    /// is an error, never `false`.
    pub async fn try_claim(
        &self,
        dimension: &'static str,
        value: &str,
        owner_id: u64,
    ) -> Result<bool> {
        let item = mapper::claim_to_item(&UniquenessClaim::new(dimension, value, owner_id));

        for _ in 0..MAX_ATTEMPTS {
            if self.table.put_if_absent(&item).await? {
                tracing::debug!(dimension, value, owner_id, "Claim created");
                return Ok(true);
            }

            match self.current_owner(dimension, value).await? {
                Some(owner) if owner == owner_id => return Ok(true),
                Some(owner) => {
                    tracing::debug!(dimension, value, owner_id, holder = owner, "Claim taken");
                    return Ok(false);
                }
                // Released between the write and the read.
                None => continue,
            }
        }

        Err(Self::contended(dimension, value))
    }

    /// Releases `value` if `owner_id` holds it.
    ///
    /// An absent claim is already released. A claim held by another owner is
    /// an [`RepositoryError::OwnerMismatch`].
    pub async fn release(&self, dimension: &'static str, value: &str, owner_id: u64) -> Result<()> {
        let key = keys::claim_key(dimension, value);
        let condition = mapper::owner_condition(owner_id);

        for _ in 0..MAX_ATTEMPTS {
            if self.table.delete_if(&key, &condition).await? {
                tracing::debug!(dimension, value, owner_id, "Claim released");
                return Ok(());
            }

            match self.current_owner(dimension, value).await? {
                None => return Ok(()),
                Some(actual) if actual != owner_id => {
                    return Err(Self::owner_mismatch(dimension, value, owner_id, actual));
                }
                Some(_) => continue,
            }
        }

        Err(Self::contended(dimension, value))
    }

    /// Moves `owner_id`'s claim from `old` to `new`.
    pub async fn transfer(
        &self,
        dimension: &'static str,
        old: &str,
        new: &str,
        owner_id: u64,
    ) -> Result<TransferOutcome> {
        self.transfer_with(dimension, old, new, owner_id, None)
            .await
    }

    /// Moves `owner_id`'s claim from `old` to `new` together with `companion`,
    /// the write of the record that starts using `new`.
    ///
    /// The old value is released only after the companion write succeeded,
    /// so the record is never visible with a value it does not hold. An
    /// error means the outcome is unknown and the owner may hold both values.
    /// `OwnerMismatch` means the old value belongs to someone else; with the
    /// claim-first strategy the companion has already been applied then.
    pub async fn transfer_with(
        &self,
        dimension: &'static str,
        old: &str,
        new: &str,
        owner_id: u64,
        companion: Option<WriteOp>,
    ) -> Result<TransferOutcome> {
        if old == new {
            if let Some(op) = &companion {
                if !self.apply(op).await? {
                    return Ok(TransferOutcome::Rejected);
                }
            }
            return Ok(TransferOutcome::Transferred);
        }

        match self.strategy {
            TransferStrategy::ClaimFirst => {
                if !self.try_claim(dimension, new, owner_id).await? {
                    return Ok(TransferOutcome::Taken);
                }
                self.finish_claim_first(dimension, old, new, owner_id, companion.as_ref())
                    .await
            }
            TransferStrategy::Transactional => {
                self.transfer_transactional(dimension, old, new, owner_id, companion)
                    .await
            }
        }
    }

    async fn apply(&self, op: &WriteOp) -> Result<bool> {
        let applied = match op {
            WriteOp::PutIfAbsent(item) => self.table.put_if_absent(item).await?,
            WriteOp::PutIfVersion { item, expected } => {
                self.table.put_if_version(item, *expected).await?
            }
            WriteOp::DeleteIf { key, condition } => self.table.delete_if(key, condition).await?,
        };
        Ok(applied)
    }

    /// Completes a claim-first transfer once `new` is held by the owner.
    async fn finish_claim_first(
        &self,
        dimension: &'static str,
        old: &str,
        new: &str,
        owner_id: u64,
        companion: Option<&WriteOp>,
    ) -> Result<TransferOutcome> {
        if let Some(op) = companion {
            if !self.apply(op).await? {
                return Ok(TransferOutcome::Rejected);
            }
        }

        match self.release(dimension, old, owner_id).await {
            Ok(()) => Ok(TransferOutcome::Transferred),
            Err(RepositoryError::Unavailable(reason)) => {
                tracing::warn!(
                    dimension,
                    old,
                    new,
                    owner_id,
                    %reason,
                    "Old claim may be stale after transfer"
                );
                Ok(TransferOutcome::TransferredWithStaleClaim)
            }
            // The companion landed; the new value stays with the owner.
            Err(err @ RepositoryError::OwnerMismatch { .. }) if companion.is_some() => Err(err),
            Err(err) if companion.is_some() => {
                tracing::warn!(
                    dimension,
                    old,
                    new,
                    owner_id,
                    error = %err,
                    "Old claim may be stale after transfer"
                );
                Ok(TransferOutcome::TransferredWithStaleClaim)
            }
            Err(err) => {
                // Undo the new claim so the caller sees no change.
                if let Err(undo) = self.release(dimension, new, owner_id).await {
                    tracing::error!(
                        dimension,
                        value = new,
                        owner_id,
                        error = %undo,
                        "Could not undo claim after failed transfer"
                    );
                }
                Err(err)
            }
        }
    }

    async fn transfer_transactional(
        &self,
        dimension: &'static str,
        old: &str,
        new: &str,
        owner_id: u64,
        companion: Option<WriteOp>,
    ) -> Result<TransferOutcome> {
        let mut ops = vec![
            WriteOp::DeleteIf {
                key: keys::claim_key(dimension, old),
                condition: mapper::owner_condition(owner_id),
            },
            WriteOp::PutIfAbsent(mapper::claim_to_item(&UniquenessClaim::new(
                dimension, new, owner_id,
            ))),
        ];
        let companion_index = ops.len();
        if let Some(op) = &companion {
            ops.push(op.clone());
        }

        match self.table.transact_write(&ops).await? {
            TransactOutcome::Committed => {
                tracing::debug!(dimension, old, new, owner_id, "Claim transferred");
                Ok(TransferOutcome::Transferred)
            }
            TransactOutcome::Cancelled { failed } => {
                tracing::debug!(dimension, old, new, owner_id, ?failed, "Transfer cancelled");
                let companion_failed = failed.contains(&companion_index);
                self.classify_cancelled(
                    dimension,
                    old,
                    new,
                    owner_id,
                    companion.as_ref().filter(|_| !companion_failed),
                    companion_failed,
                )
                .await
            }
        }
    }

    /// Works out why a transfer transaction was cancelled.
    ///
    /// `pending` is the companion write when it has not been ruled out.
    async fn classify_cancelled(
        &self,
        dimension: &'static str,
        old: &str,
        new: &str,
        owner_id: u64,
        pending: Option<&WriteOp>,
        companion_failed: bool,
    ) -> Result<TransferOutcome> {
        match self.current_owner(dimension, new).await? {
            Some(holder) if holder != owner_id => return Ok(TransferOutcome::Taken),
            Some(_) if companion_failed => return Ok(TransferOutcome::Rejected),
            // A previous attempt already claimed the new value.
            Some(_) => {
                return self
                    .finish_claim_first(dimension, old, new, owner_id, pending)
                    .await;
            }
            None if companion_failed => return Ok(TransferOutcome::Rejected),
            None => {}
        }

        match self.current_owner(dimension, old).await? {
            Some(actual) if actual != owner_id => {
                Err(Self::owner_mismatch(dimension, old, owner_id, actual))
            }
            _ => Err(Self::contended(dimension, old)),
        }
    }
}
