use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// The email is stored case-folded and is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Optimistic concurrency token, bumped on every successful update.
    pub version: u64,
}

impl User {
    /// Creates a first-version user.
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            version: 1,
        }
    }

    /// Returns the next version of this user with new name and email.
    pub fn next_version(&self, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: self.id,
            name: name.into(),
            email: email.into(),
            version: self.version + 1,
        }
    }
}

/// A short post owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Micropost {
    pub id: u64,
    pub user_id: u64,
    pub content: String,
    pub version: u64,
}

impl Micropost {
    /// Creates a first-version micropost.
    pub fn new(id: u64, user_id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            content: content.into(),
            version: 1,
        }
    }

    /// Returns the next version of this micropost with new content.
    pub fn next_version(&self, content: impl Into<String>) -> Self {
        Self {
            id: self.id,
            user_id: self.user_id,
            content: content.into(),
            version: self.version + 1,
        }
    }
}

/// Record asserting that `owner_id` holds `value` within `dimension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessClaim {
    pub dimension: String,
    pub value: String,
    pub owner_id: u64,
    pub claimed_at: DateTime<Utc>,
}

impl UniquenessClaim {
    /// Creates a claim stamped with the current time.
    pub fn new(dimension: impl Into<String>, value: impl Into<String>, owner_id: u64) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
            owner_id,
            claimed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_starts_at_version_one() {
        let user = User::new(7, "Taro", "taro@example.com");
        assert_eq!(user.id, 7);
        assert_eq!(user.version, 1);
    }

    #[test]
    fn test_user_next_version_keeps_id() {
        let user = User::new(7, "Taro", "taro@example.com");
        let next = user.next_version("Taro Y", "t@example.com");

        assert_eq!(next.id, 7);
        assert_eq!(next.version, 2);
        assert_eq!(next.name, "Taro Y");
        assert_eq!(next.email, "t@example.com");
    }

    #[test]
    fn test_micropost_next_version() {
        let post = Micropost::new(3, 7, "hello");
        let next = post.next_version("edited");

        assert_eq!(next.id, 3);
        assert_eq!(next.user_id, 7);
        assert_eq!(next.version, 2);
        assert_eq!(next.content, "edited");
    }
}
