//! DynamoDB table backend.
//!
//! Implements [`TableClient`](postboard_core::storage::TableClient) on a
//! single DynamoDB table with string `PK`/`SK` keys, using conditional
//! expressions for every write and `TransactWriteItems` for transactions.

mod conversions;
mod error;
mod table;

pub use table::DynamoDbTable;
