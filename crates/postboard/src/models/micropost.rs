use serde::{Deserialize, Serialize};

use postboard_core::board::Micropost;

/// Request payload for creating or updating a micropost.
#[derive(Debug, Deserialize)]
pub struct MicropostPayload {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MicropostResponse {
    pub id: u64,
    pub user_id: u64,
    pub content: String,
}

impl From<Micropost> for MicropostResponse {
    fn from(post: Micropost) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            content: post.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MicropostsResponse {
    pub microposts: Vec<MicropostResponse>,
}
