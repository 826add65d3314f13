use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use wanderher_core::relay;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/chat`: relay a conversation and stream the reply.
///
/// The body is read raw so malformed payloads get the same `{"error"}`
/// shape as every other failure.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let messages = relay::parse_chat_request(&body)?;

    tracing::info!(
        messages = messages.len(),
        provider = state.provider.name(),
        "Relaying chat request"
    );

    let events = relay::open_relay(state.provider.as_ref(), messages).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(events),
    )
        .into_response())
}
