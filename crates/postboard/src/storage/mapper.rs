//! Conversion between domain records and generic table items.
//!
//! Pure functions, testable without any store.

use chrono::{DateTime, Utc};
use postboard_core::board::{Micropost, UniquenessClaim, User};
use postboard_core::storage::{AttributeValue, Condition, Item, StoreError, VERSION_ATTR};

use super::keys;

// ============================================================================
// Entity type constants
// ============================================================================

pub const ENTITY_TYPE_USER: &str = "USER";
pub const ENTITY_TYPE_MICROPOST: &str = "MICROPOST";
pub const ENTITY_TYPE_CLAIM: &str = "UNIQUE";

// ============================================================================
// Attribute names
// ============================================================================

const ENTITY_TYPE: &str = "entityType";
const ID: &str = "id";
const NAME: &str = "name";
const EMAIL: &str = "email";
const USER_ID: &str = "userId";
const CONTENT: &str = "content";
const DIMENSION: &str = "dimension";
const VALUE: &str = "value";
pub const OWNER_ID: &str = "ownerId";
const CLAIMED_AT: &str = "claimedAt";

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn get_string(item: &Item, name: &str) -> Result<String, StoreError> {
    item.get_s(name)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Malformed(format!("missing string attribute {name}")))
}

fn get_number(item: &Item, name: &str) -> Result<u64, StoreError> {
    item.get_n(name)
        .ok_or_else(|| StoreError::Malformed(format!("missing numeric attribute {name}")))
}

fn get_datetime(item: &Item, name: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw = get_string(item, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("invalid timestamp in {name}: {e}")))
}

// ============================================================================
// User conversions
// ============================================================================

pub fn user_to_item(user: &User) -> Item {
    Item::new(keys::user_key(user.id))
        .with(ENTITY_TYPE, s(ENTITY_TYPE_USER))
        .with(ID, AttributeValue::N(user.id))
        .with(NAME, s(&user.name))
        .with(EMAIL, s(&user.email))
        .with(VERSION_ATTR, AttributeValue::N(user.version))
}

pub fn item_to_user(item: &Item) -> Result<User, StoreError> {
    Ok(User {
        id: get_number(item, ID)?,
        name: get_string(item, NAME)?,
        email: get_string(item, EMAIL)?,
        version: get_number(item, VERSION_ATTR)?,
    })
}

// ============================================================================
// Micropost conversions
// ============================================================================

pub fn micropost_to_item(post: &Micropost) -> Item {
    Item::new(keys::micropost_key(post.user_id, post.id))
        .with(ENTITY_TYPE, s(ENTITY_TYPE_MICROPOST))
        .with(ID, AttributeValue::N(post.id))
        .with(USER_ID, AttributeValue::N(post.user_id))
        .with(CONTENT, s(&post.content))
        .with(VERSION_ATTR, AttributeValue::N(post.version))
}

pub fn item_to_micropost(item: &Item) -> Result<Micropost, StoreError> {
    Ok(Micropost {
        id: get_number(item, ID)?,
        user_id: get_number(item, USER_ID)?,
        content: get_string(item, CONTENT)?,
        version: get_number(item, VERSION_ATTR)?,
    })
}

// ============================================================================
// Claim conversions
// ============================================================================

pub fn claim_to_item(claim: &UniquenessClaim) -> Item {
    Item::new(keys::claim_key(&claim.dimension, &claim.value))
        .with(ENTITY_TYPE, s(ENTITY_TYPE_CLAIM))
        .with(DIMENSION, s(&claim.dimension))
        .with(VALUE, s(&claim.value))
        .with(OWNER_ID, AttributeValue::N(claim.owner_id))
        .with(CLAIMED_AT, s(claim.claimed_at.to_rfc3339()))
}

pub fn item_to_claim(item: &Item) -> Result<UniquenessClaim, StoreError> {
    Ok(UniquenessClaim {
        dimension: get_string(item, DIMENSION)?,
        value: get_string(item, VALUE)?,
        owner_id: get_number(item, OWNER_ID)?,
        claimed_at: get_datetime(item, CLAIMED_AT)?,
    })
}

// ============================================================================
// Conditions
// ============================================================================

/// Holds when the stored claim belongs to `owner_id`.
pub fn owner_condition(owner_id: u64) -> Condition {
    Condition::AttributeEquals {
        name: OWNER_ID,
        value: AttributeValue::N(owner_id),
    }
}

/// Holds when the stored item is at `version`.
pub fn version_condition(version: u64) -> Condition {
    Condition::AttributeEquals {
        name: VERSION_ATTR,
        value: AttributeValue::N(version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_item_layout() {
        let user = User::new(5, "Taro", "taro@example.com");
        let item = user_to_item(&user);

        assert_eq!(item.key, keys::user_key(5));
        assert_eq!(item.get_s("entityType"), Some(ENTITY_TYPE_USER));
        assert_eq!(item.get_s("email"), Some("taro@example.com"));
        assert_eq!(item.version(), Some(1));
        assert_eq!(item_to_user(&item).unwrap(), user);
    }

    #[test]
    fn test_micropost_item_layout() {
        let post = Micropost::new(8, 5, "first post");
        let item = micropost_to_item(&post);

        assert_eq!(item.key, keys::micropost_key(5, 8));
        assert_eq!(item.get_n("userId"), Some(5));
        assert_eq!(item_to_micropost(&item).unwrap(), post);
    }

    #[test]
    fn test_claim_item_layout() {
        let claim = UniquenessClaim::new("user_email", "taro@example.com", 5);
        let item = claim_to_item(&claim);

        assert_eq!(item.key, keys::claim_key("user_email", "taro@example.com"));
        assert_eq!(item.get_n(OWNER_ID), Some(5));

        let decoded = item_to_claim(&item).unwrap();
        assert_eq!(decoded.owner_id, 5);
        assert_eq!(decoded.value, "taro@example.com");
        assert_eq!(
            decoded.claimed_at.timestamp_micros(),
            claim.claimed_at.timestamp_micros()
        );
    }

    #[test]
    fn test_missing_attribute_is_malformed() {
        let item = Item::new(keys::user_key(1)).with("id", AttributeValue::N(1));

        match item_to_user(&item) {
            Err(StoreError::Malformed(msg)) => assert!(msg.contains("name")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_timestamp_is_malformed() {
        let claim = UniquenessClaim::new("user_email", "a@b.c", 1);
        let item = claim_to_item(&claim).with("claimedAt", s("yesterday"));

        assert!(matches!(item_to_claim(&item), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_conditions() {
        let claim = claim_to_item(&UniquenessClaim::new("user_email", "a@b.c", 3));

        assert!(owner_condition(3).matches(Some(&claim)));
        assert!(!owner_condition(4).matches(Some(&claim)));

        let user = user_to_item(&User::new(1, "A", "a@b.c"));
        assert!(version_condition(1).matches(Some(&user)));
        assert!(!version_condition(2).matches(Some(&user)));
    }
}
