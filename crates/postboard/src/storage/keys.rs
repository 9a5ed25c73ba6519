//! Key generation for the single-table layout.
//!
//! Pure functions; all numeric ids are zero-padded to 20 digits so that
//! sort-key order equals id order.

use postboard_core::storage::Key;

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PARTITION: &str = "USER";
pub const USER_PREFIX: &str = "USER#";
pub const POSTS_SUFFIX: &str = "#POSTS";
pub const POST_PREFIX: &str = "POST#";
pub const UNIQUE_PREFIX: &str = "UNIQUE#";
pub const SEQUENCE_PREFIX: &str = "SEQ#";

// ============================================================================
// Sequence names
// ============================================================================

pub const USER_SEQUENCE: &str = "user";
pub const MICROPOST_SEQUENCE: &str = "micropost";

fn padded(id: u64) -> String {
    format!("{id:020}")
}

// ============================================================================
// User keys
// ============================================================================

/// Pattern: `USER` / `USER#<id>`
pub fn user_key(id: u64) -> Key {
    Key::new(USER_PARTITION, format!("{USER_PREFIX}{}", padded(id)))
}

// ============================================================================
// Micropost keys
// ============================================================================

/// Partition holding all microposts of a user.
///
/// Pattern: `USER#<user_id>#POSTS`
pub fn micropost_partition(user_id: u64) -> String {
    format!("{USER_PREFIX}{}{POSTS_SUFFIX}", padded(user_id))
}

/// Pattern: `USER#<user_id>#POSTS` / `POST#<id>`
pub fn micropost_key(user_id: u64, id: u64) -> Key {
    Key::new(
        micropost_partition(user_id),
        format!("{POST_PREFIX}{}", padded(id)),
    )
}

// ============================================================================
// Claim keys
// ============================================================================

/// Pattern: `UNIQUE#<dimension>#<value>` / `UNIQUE#<dimension>`
pub fn claim_key(dimension: &str, value: &str) -> Key {
    Key::new(
        format!("{UNIQUE_PREFIX}{dimension}#{value}"),
        format!("{UNIQUE_PREFIX}{dimension}"),
    )
}

// ============================================================================
// Sequence keys
// ============================================================================

/// Pattern: `SEQ#<name>` / `SEQ#<name>`
pub fn sequence_key(name: &str) -> Key {
    let key = format!("{SEQUENCE_PREFIX}{name}");
    Key::new(key.clone(), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key() {
        let key = user_key(42);
        assert_eq!(key.pk, "USER");
        assert_eq!(key.sk, "USER#00000000000000000042");
    }

    #[test]
    fn test_user_keys_sort_by_id() {
        assert!(user_key(9).sk < user_key(10).sk);
        assert!(user_key(99).sk < user_key(100).sk);
        assert!(user_key(10).sk.starts_with(USER_PREFIX));
    }

    #[test]
    fn test_micropost_key() {
        let key = micropost_key(3, 12);
        assert_eq!(key.pk, "USER#00000000000000000003#POSTS");
        assert_eq!(key.sk, "POST#00000000000000000012");
        assert_eq!(micropost_partition(3), key.pk);
    }

    #[test]
    fn test_claim_key() {
        let key = claim_key("user_email", "taro@example.com");
        assert_eq!(key.pk, "UNIQUE#user_email#taro@example.com");
        assert_eq!(key.sk, "UNIQUE#user_email");
    }

    #[test]
    fn test_sequence_key() {
        let key = sequence_key(USER_SEQUENCE);
        assert_eq!(key.pk, "SEQ#user");
        assert_eq!(key.sk, "SEQ#user");
    }

    #[test]
    fn test_claims_never_collide_with_users() {
        let claim = claim_key("user_email", "x");
        assert_ne!(claim.pk, USER_PARTITION);
        assert!(!claim.pk.ends_with(POSTS_SUFFIX));
    }
}
