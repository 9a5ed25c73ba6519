//! User repository on a single table.
//!
//! Email uniqueness is enforced by the [`ClaimManager`]: the claim is always
//! taken before the user item is written and released only after it is
//! gone, so a failure at any step leaves at worst an orphaned claim, never
//! two users with one email.

use std::sync::Arc;

use async_trait::async_trait;

use postboard_core::board::{normalize_email, User};
use postboard_core::storage::{RepositoryError, Result, TableClient, UserRepository, WriteOp};

use super::claims::{ClaimManager, TransferOutcome, USER_EMAIL};
use super::{keys, mapper};

const ENTITY_TYPE: &str = "User";

fn not_found(id: u64) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: ENTITY_TYPE,
        id: id.to_string(),
    }
}

fn conflict(id: u64) -> RepositoryError {
    RepositoryError::Conflict {
        entity_type: ENTITY_TYPE,
        id: id.to_string(),
    }
}

fn partial_failure(
    operation: &'static str,
    value: &str,
    owner_id: u64,
    reason: String,
) -> RepositoryError {
    tracing::error!(
        operation,
        dimension = USER_EMAIL,
        value,
        owner_id,
        %reason,
        "Compensation failed, claim needs reconciliation"
    );
    RepositoryError::PartialFailure {
        operation,
        dimension: USER_EMAIL,
        value: value.to_string(),
        owner_id,
        reason,
    }
}

/// Uniqueness-aware user repository.
pub struct TableUserRepository<T>
where
    T: TableClient,
{
    table: Arc<T>,
    claims: ClaimManager<T>,
}

impl<T> TableUserRepository<T>
where
    T: TableClient,
{
    pub fn new(table: Arc<T>, claims: ClaimManager<T>) -> Self {
        Self { table, claims }
    }

    async fn load(&self, id: u64) -> Result<Option<User>> {
        match self.table.get(&keys::user_key(id)).await? {
            Some(item) => Ok(Some(mapper::item_to_user(&item)?)),
            None => Ok(None),
        }
    }

    /// Resolves a create whose user write did not succeed.
    ///
    /// The claim for `user.email` is held by `user.id` at this point.
    async fn abandon_create(&self, user: &User, cause: RepositoryError) -> Result<User> {
        let stored = match self.load(user.id).await {
            Ok(stored) => stored,
            Err(err) => {
                // Unknown whether the user landed; keep the claim.
                tracing::warn!(
                    user_id = user.id,
                    email = %user.email,
                    error = %err,
                    "Could not verify failed create"
                );
                return Err(cause);
            }
        };

        if let Some(stored) = stored {
            if stored.email == user.email {
                // The claim belongs to the stored user either way.
                if stored.name != user.name {
                    return Err(cause);
                }
                tracing::info!(user_id = user.id, "User already created by an earlier attempt");
                return Ok(stored);
            }
        }

        match self.claims.release(USER_EMAIL, &user.email, user.id).await {
            Ok(()) => Err(cause),
            Err(err) => Err(partial_failure(
                "create",
                &user.email,
                user.id,
                format!("{cause}; releasing claim failed: {err}"),
            )),
        }
    }

    /// Restores claims after an update whose user write did not succeed.
    ///
    /// `attempted.email` differs from `current.email` and is claimed by the
    /// user. The stored record decides which claim must survive.
    async fn abandon_update(
        &self,
        current: &User,
        attempted: &User,
        cause: RepositoryError,
    ) -> Result<User> {
        let id = current.id;

        let stored = match self.load(id).await {
            Ok(stored) => stored,
            Err(err) => {
                // Hold both values so neither can be taken while unverified.
                if let Err(claim_err) = self.claims.try_claim(USER_EMAIL, &current.email, id).await
                {
                    tracing::warn!(user_id = id, error = %claim_err, "Could not reclaim old email");
                }
                return Err(partial_failure(
                    "update",
                    &attempted.email,
                    id,
                    format!("{cause}; re-reading user failed: {err}"),
                ));
            }
        };

        let write_unknown = !matches!(cause, RepositoryError::Conflict { .. });
        if let Some(stored) = &stored {
            if write_unknown
                && stored.version == attempted.version
                && stored.email == attempted.email
            {
                tracing::info!(user_id = id, "User update landed despite store error");
                let released = match cause {
                    RepositoryError::OwnerMismatch { .. } => Err(cause),
                    _ => self.claims.release(USER_EMAIL, &current.email, id).await,
                };
                return match released {
                    Ok(()) => Ok(stored.clone()),
                    Err(err @ RepositoryError::OwnerMismatch { .. }) => Err(partial_failure(
                        "update",
                        &current.email,
                        id,
                        format!("user updated but old email is not theirs: {err}"),
                    )),
                    Err(err) => {
                        tracing::warn!(
                            user_id = id,
                            email = %current.email,
                            error = %err,
                            "Old claim may be stale after update"
                        );
                        Ok(stored.clone())
                    }
                };
            }

            if stored.email == current.email {
                match self.claims.try_claim(USER_EMAIL, &current.email, id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        return Err(partial_failure(
                            "update",
                            &current.email,
                            id,
                            format!("{cause}; old email was claimed by another user"),
                        ));
                    }
                    Err(err) => {
                        return Err(partial_failure(
                            "update",
                            &current.email,
                            id,
                            format!("{cause}; reclaiming old email failed: {err}"),
                        ));
                    }
                }
            }

            if stored.email == attempted.email {
                return Err(cause);
            }
        }

        match self.claims.release(USER_EMAIL, &attempted.email, id).await {
            Ok(()) => Err(cause),
            Err(err) => Err(partial_failure(
                "update",
                &attempted.email,
                id,
                format!("{cause}; releasing new email failed: {err}"),
            )),
        }
    }
}

#[async_trait]
impl<T> UserRepository for TableUserRepository<T>
where
    T: TableClient + 'static,
{
    async fn get_by_id(&self, id: u64) -> Result<Option<User>> {
        self.load(id).await
    }

    async fn list(&self) -> Result<Vec<User>> {
        let items = self
            .table
            .query(keys::USER_PARTITION, keys::USER_PREFIX)
            .await?;

        items
            .iter()
            .map(|item| mapper::item_to_user(item).map_err(RepositoryError::from))
            .collect()
    }

    async fn create(&self, name: &str, email: &str) -> Result<User> {
        let id = self
            .table
            .increment(&keys::sequence_key(keys::USER_SEQUENCE))
            .await?;
        self.create_with_id(id, name, email).await
    }

    async fn create_with_id(&self, id: u64, name: &str, email: &str) -> Result<User> {
        let email = normalize_email(email);

        if !self.claims.try_claim(USER_EMAIL, &email, id).await? {
            tracing::debug!(user_id = id, email = %email, "Email already registered");
            return Err(RepositoryError::DuplicateEmail { email });
        }

        let user = User::new(id, name, email);
        let cause = match self.table.put_if_absent(&mapper::user_to_item(&user)).await {
            Ok(true) => {
                tracing::info!(user_id = id, email = %user.email, "User created");
                return Ok(user);
            }
            Ok(false) => conflict(id),
            Err(err) => err.into(),
        };

        self.abandon_create(&user, cause).await
    }

    async fn update(&self, id: u64, name: &str, email: &str) -> Result<User> {
        let email = normalize_email(email);
        let current = self.load(id).await?.ok_or_else(|| not_found(id))?;
        let next = current.next_version(name, email);
        let item = mapper::user_to_item(&next);

        if current.email == next.email {
            if !self.table.put_if_version(&item, current.version).await? {
                return Err(conflict(id));
            }
            tracing::info!(user_id = id, version = next.version, "User updated");
            return Ok(next);
        }

        // The user write rides along with the claim transfer so the old
        // email is released only once the record no longer uses it.
        let write = WriteOp::PutIfVersion {
            item,
            expected: current.version,
        };
        let outcome = self
            .claims
            .transfer_with(USER_EMAIL, &current.email, &next.email, id, Some(write))
            .await;

        match outcome {
            Ok(TransferOutcome::Transferred) | Ok(TransferOutcome::TransferredWithStaleClaim) => {
                tracing::info!(
                    user_id = id,
                    version = next.version,
                    email = %next.email,
                    "User updated"
                );
                Ok(next)
            }
            Ok(TransferOutcome::Taken) => Err(RepositoryError::DuplicateEmail { email: next.email }),
            Ok(TransferOutcome::Rejected) => self.abandon_update(&current, &next, conflict(id)).await,
            Err(err) => self.abandon_update(&current, &next, err).await,
        }
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let user = self.load(id).await?.ok_or_else(|| not_found(id))?;

        let deleted = self
            .table
            .delete_if(&keys::user_key(id), &mapper::version_condition(user.version))
            .await?;
        if !deleted {
            return match self.load(id).await? {
                None => Err(not_found(id)),
                Some(_) => Err(conflict(id)),
            };
        }

        if let Err(err) = self.claims.release(USER_EMAIL, &user.email, id).await {
            return Err(partial_failure(
                "delete",
                &user.email,
                id,
                format!("user deleted but releasing claim failed: {err}"),
            ));
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
