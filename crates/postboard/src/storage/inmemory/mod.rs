//! In-memory table backend.
//!
//! Keeps every item in a `BTreeMap` behind a tokio `RwLock`. Used by the
//! default build and by the tests; data is lost when the table is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use postboard::storage::inmemory::InMemoryTable;
//!
//! let table = InMemoryTable::new();
//! let repo = TableUserRepository::new(Arc::new(table), TransferStrategy::ClaimFirst);
//! ```

mod table;

pub use table::InMemoryTable;
