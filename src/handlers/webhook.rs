use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::entities::raw_message::{self, MessageType};
use crate::errors::ServiceError;
use crate::message_queue::{enqueue_job, Job};
use crate::AppState;

/// POST /logistics/{provider}/webhook
///
/// Accepts one provider message, persists it as an immutable raw message,
/// queues reconciliation, and returns immediately. Bearer tokens map to
/// provider names; a token may only post to its own provider's path.
pub async fn provider_webhook(
    State(state): State<AppState>,
    Path(provider_name): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, ServiceError> {
    let Some(token_provider) = authenticate(&state, &headers) else {
        return Ok(rejection(
            StatusCode::FORBIDDEN,
            "Invalid API key.",
            "forbidden",
        ));
    };

    if token_provider != provider_name {
        return Ok(rejection(
            StatusCode::FORBIDDEN,
            "Invalid API key.",
            "forbidden",
        ));
    }

    if provider_name != state.config.provider.name {
        error!("failed to match provider name {provider_name} with a configured center");
        return Ok(rejection(
            StatusCode::BAD_REQUEST,
            "Bad provider.",
            "bad_provider",
        ));
    }

    let raw_type = payload.get("type").and_then(Value::as_str).unwrap_or("");
    let Some(message_type) = MessageType::from_wire(raw_type) else {
        error!("failed to match message type {raw_type}");
        return Ok(rejection(
            StatusCode::BAD_REQUEST,
            "Bad message type.",
            "bad_message_type",
        ));
    };

    let message = raw_message::ActiveModel {
        center: Set(provider_name.clone()),
        message_type: Set(message_type.to_string()),
        raw_body: Set(payload.to_string()),
        received_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    enqueue_job(
        state.queue.as_ref(),
        &Job::ProcessMessage {
            raw_message_id: message.id,
        },
    )
    .await?;

    info!(
        "accepted {message_type} message {} from provider {provider_name}",
        message.id
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Payload accepted.",
            "status": StatusCode::OK.as_u16(),
            "data": {},
        })),
    )
        .into_response())
}

/// Resolves the bearer token to a provider name. The keyword comparison is
/// case-insensitive; the token itself is not.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let header = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.split_whitespace();
    let keyword = parts.next()?;
    if !keyword.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    state.config.provider.webhook_tokens.get(token).cloned()
}

fn rejection(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": message,
            "code": code,
            "status": status.as_u16(),
        })),
    )
        .into_response()
}
