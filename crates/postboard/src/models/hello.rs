use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: String,
}
