use serde::{Deserialize, Serialize};

use postboard_core::board::User;

/// Request payload for creating or updating a user.
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub user_name: String,
    pub email: String,
}

/// A user as returned by the API. The version token stays internal.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub user_name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_version() {
        let mut user = User::new(3, "Taro", "taro@example.com");
        user.version = 4;

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 3, "user_name": "Taro", "email": "taro@example.com"})
        );
    }
}
