//! Functional core for postboard.
//!
//! Domain types, validation rules and the storage abstractions shared by the
//! server crate. Nothing in here performs I/O.

pub mod board;
pub mod storage;
