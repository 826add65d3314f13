//! Client side of the relay: posts the history and turns the event stream
//! back into [`ReplyEvent`]s.

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde_json::json;

use crate::ai::Fragment;
use crate::conversation::ReplyEvent;
use crate::sse::{SseDecoder, SseEvent};
use crate::state::ChatMessage;

pub const CHAT_PATH: &str = "/api/chat";

#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

/// Content of one relay event, or `None` for lines that do not decode.
fn decode_content(data: &str) -> Option<String> {
    serde_json::from_str::<Fragment>(data)
        .ok()
        .map(|fragment| fragment.content)
        .filter(|content| !content.is_empty())
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `history` and stream the reply.
    ///
    /// Always ends with exactly one `Done` or `Failed`. Running out of body
    /// without a sentinel counts as `Done`.
    pub fn reply_stream(&self, history: Vec<ChatMessage>) -> impl Stream<Item = ReplyEvent> + Send + 'static {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        stream! {
            tracing::info!(messages = history.len(), endpoint = %endpoint, "Sending chat request");

            let response = match client
                .post(&endpoint)
                .json(&json!({ "messages": history }))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield ReplyEvent::Failed(format!("Request failed: {}", e));
                    return;
                }
            };

            if !response.status().is_success() {
                yield ReplyEvent::Failed(format!("Relay returned {}", response.status()));
                return;
            }

            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield ReplyEvent::Failed(format!("Stream error: {}", e));
                        return;
                    }
                };

                for event in decoder.feed(&chunk) {
                    match event {
                        SseEvent::Done => {
                            yield ReplyEvent::Done;
                            return;
                        }
                        SseEvent::Data(data) => {
                            if let Some(content) = decode_content(&data) {
                                yield ReplyEvent::Fragment(content);
                            }
                        }
                    }
                }
            }

            if let Some(SseEvent::Data(data)) = decoder.finish() {
                if let Some(content) = decode_content(&data) {
                    yield ReplyEvent::Fragment(content);
                }
            }
            yield ReplyEvent::Done;
        }
    }
}
