//! Generic item model for a single-table key-value store.
//!
//! Items are addressed by a partition key (`pk`) and a sort key (`sk`) and
//! carry a flat map of string or numeric attributes. Backends translate
//! these into their native representation.

use std::collections::BTreeMap;

/// Attribute holding the optimistic concurrency version of an item.
pub const VERSION_ATTR: &str = "version";

/// Attribute holding the current value of a sequence counter.
pub const COUNTER_ATTR: &str = "counter";

/// Primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub pk: String,
    pub sk: String,
}

impl Key {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    N(u64),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            AttributeValue::N(_) => None,
        }
    }

    pub fn as_n(&self) -> Option<u64> {
        match self {
            AttributeValue::N(n) => Some(*n),
            AttributeValue::S(_) => None,
        }
    }
}

/// A stored item: key plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: Key,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute (builder style).
    pub fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn get_s(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_s)
    }

    pub fn get_n(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(AttributeValue::as_n)
    }

    /// The item's version, if it carries one.
    pub fn version(&self) -> Option<u64> {
        self.get_n(VERSION_ATTR)
    }
}

/// Precondition evaluated atomically against the currently stored item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The item exists.
    Exists,
    /// The item exists and the named attribute equals `value`.
    AttributeEquals {
        name: &'static str,
        value: AttributeValue,
    },
}

impl Condition {
    /// Evaluates the condition against the stored item, if any.
    pub fn matches(&self, current: Option<&Item>) -> bool {
        match (self, current) {
            (_, None) => false,
            (Condition::Exists, Some(_)) => true,
            (Condition::AttributeEquals { name, value }, Some(item)) => {
                item.get(name) == Some(value)
            }
        }
    }
}

/// One conditional write inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Put the item only if no item with its key exists.
    PutIfAbsent(Item),
    /// Replace the item only if the stored version equals `expected`.
    PutIfVersion { item: Item, expected: u64 },
    /// Delete the item only if `condition` holds.
    DeleteIf { key: Key, condition: Condition },
}

impl WriteOp {
    pub fn key(&self) -> &Key {
        match self {
            WriteOp::PutIfAbsent(item) | WriteOp::PutIfVersion { item, .. } => &item.key,
            WriteOp::DeleteIf { key, .. } => key,
        }
    }

    /// Evaluates this operation's precondition against the stored item.
    pub fn precondition_holds(&self, current: Option<&Item>) -> bool {
        match self {
            WriteOp::PutIfAbsent(_) => current.is_none(),
            WriteOp::PutIfVersion { expected, .. } => {
                current.and_then(Item::version) == Some(*expected)
            }
            WriteOp::DeleteIf { condition, .. } => condition.matches(current),
        }
    }
}

/// Result of a multi-item conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactOutcome {
    /// Every precondition held and all writes were applied.
    Committed,
    /// Nothing was applied; `failed` lists the indices whose precondition failed.
    Cancelled { failed: Vec<usize> },
}
