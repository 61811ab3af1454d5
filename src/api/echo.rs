use crate::api::extract::{ApiJson, ApiQuery};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EchoParams {
    #[serde(default)]
    pub message: Option<String>,
}

/// GET /api/echo
pub async fn get_echo(ApiQuery(params): ApiQuery<EchoParams>) -> Json<Message> {
    Json(Message {
        message: params.message.unwrap_or_else(|| "Hello!".to_string()),
    })
}

/// POST /api/echo
pub async fn post_echo(ApiJson(message): ApiJson<Message>) -> Json<Message> {
    Json(message)
}
