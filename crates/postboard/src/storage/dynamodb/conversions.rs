//! DynamoDB attribute conversion functions.
//!
//! Pure functions between generic table items and DynamoDB attribute maps,
//! plus the condition expressions used by conditional writes.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use postboard_core::storage::{AttributeValue, Condition, Item, Key, StoreError, VERSION_ATTR};

pub const PK: &str = "PK";
pub const SK: &str = "SK";

/// Expression guarding a put of a new item.
pub const ATTRIBUTE_NOT_EXISTS: &str = "attribute_not_exists(PK)";

// ============================================================================
// Item conversions
// ============================================================================

pub fn to_dynamo_value(value: &AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s.clone()),
        AttributeValue::N(n) => DynamoValue::N(n.to_string()),
    }
}

pub fn key_to_dynamo(key: &Key) -> HashMap<String, DynamoValue> {
    HashMap::from([
        (PK.to_string(), DynamoValue::S(key.pk.clone())),
        (SK.to_string(), DynamoValue::S(key.sk.clone())),
    ])
}

pub fn item_to_dynamo(item: &Item) -> HashMap<String, DynamoValue> {
    let mut map = key_to_dynamo(&item.key);
    for (name, value) in &item.attributes {
        map.insert(name.clone(), to_dynamo_value(value));
    }
    map
}

fn get_key_part(map: &HashMap<String, DynamoValue>, name: &str) -> Result<String, StoreError> {
    map.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::Malformed(format!("missing key attribute {name}")))
}

pub fn dynamo_to_item(map: &HashMap<String, DynamoValue>) -> Result<Item, StoreError> {
    let mut item = Item::new(Key::new(get_key_part(map, PK)?, get_key_part(map, SK)?));

    for (name, value) in map {
        if name == PK || name == SK {
            continue;
        }
        let value = match value {
            DynamoValue::S(s) => AttributeValue::S(s.clone()),
            DynamoValue::N(n) => AttributeValue::N(n.parse().map_err(|_| {
                StoreError::Malformed(format!("attribute {name} is not an unsigned integer: {n}"))
            })?),
            other => {
                return Err(StoreError::Malformed(format!(
                    "attribute {name} has unsupported type: {other:?}"
                )))
            }
        };
        item.attributes.insert(name.clone(), value);
    }

    Ok(item)
}

// ============================================================================
// Condition expressions
// ============================================================================

/// A condition expression with its placeholder bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    pub expression: String,
    pub names: Option<HashMap<String, String>>,
    pub values: Option<HashMap<String, DynamoValue>>,
}

impl ConditionExpr {
    /// The item must not exist yet.
    pub fn absent() -> Self {
        Self {
            expression: ATTRIBUTE_NOT_EXISTS.to_string(),
            names: None,
            values: None,
        }
    }

    /// The stored item must be at `expected`.
    pub fn version(expected: u64) -> Self {
        Self::attribute_equals(VERSION_ATTR, &AttributeValue::N(expected))
    }

    pub fn from_condition(condition: &Condition) -> Self {
        match condition {
            Condition::Exists => Self {
                expression: "attribute_exists(PK)".to_string(),
                names: None,
                values: None,
            },
            Condition::AttributeEquals { name, value } => Self::attribute_equals(name, value),
        }
    }

    fn attribute_equals(name: &str, value: &AttributeValue) -> Self {
        Self {
            expression: "#attr = :expected".to_string(),
            names: Some(HashMap::from([("#attr".to_string(), name.to_string())])),
            values: Some(HashMap::from([(
                ":expected".to_string(),
                to_dynamo_value(value),
            )])),
        }
    }
}
