mod hello;
mod micropost;
mod user;

use serde::Serialize;

pub use hello::{HelloPayload, HelloResponse};
pub use micropost::{MicropostPayload, MicropostResponse, MicropostsResponse};
pub use user::{UserPayload, UserResponse, UsersResponse};

/// Body of a successful mutation.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub message: &'static str,
    /// Id of the created resource, rendered as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self {
            message: "OK",
            id: None,
        }
    }

    pub fn created(id: u64) -> Self {
        Self {
            message: "OK",
            id: Some(id.to_string()),
        }
    }
}
