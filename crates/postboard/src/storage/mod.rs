//! Storage layer.
//!
//! Repositories are written against the [`TableClient`] trait from
//! `postboard_core::storage`; backends live in the submodules:
//!
//! - `inmemory`: always compiled, the default backend and the test store
//! - `dynamodb`: behind the `dynamodb` feature
//!
//! [`TableClient`]: postboard_core::storage::TableClient

pub mod claims;
mod deadline;
pub mod inmemory;
pub mod keys;
pub mod mapper;
mod microposts;
mod users;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(test)]
pub mod testing;

pub use claims::{ClaimManager, TransferOutcome, TransferStrategy, USER_EMAIL};
pub use deadline::DeadlineTable;
pub use inmemory::InMemoryTable;
pub use microposts::TableMicropostRepository;
pub use users::TableUserRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbTable;
