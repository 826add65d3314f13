use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatProvider, CompletionRequest, Fragment, FragmentStream};
use crate::error::ProviderError;
use crate::sse::{SseDecoder, SseEvent};
use crate::state::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

#[derive(Serialize)]
struct MistralRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

// Streamed chunks come either as the bare completion chunk or wrapped in a
// `data` envelope, depending on the API/SDK version.
#[derive(Deserialize)]
struct MistralChunk {
    #[serde(default)]
    choices: Vec<MistralChoice>,
    #[serde(default)]
    data: Option<Box<MistralChunk>>,
}

#[derive(Deserialize)]
struct MistralChoice {
    #[serde(default)]
    delta: MistralDelta,
}

#[derive(Deserialize, Default)]
struct MistralDelta {
    #[serde(default)]
    content: Option<DeltaContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeltaContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl DeltaContent {
    fn into_text(self) -> String {
        match self {
            DeltaContent::Text(text) => text,
            DeltaContent::Parts(parts) => parts.into_iter().filter_map(|p| p.text).collect(),
        }
    }
}

impl MistralChunk {
    fn into_fragment(self) -> Option<Fragment> {
        let direct = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map(DeltaContent::into_text)
            .filter(|text| !text.is_empty());

        match direct {
            Some(text) => Some(Fragment::new(text)),
            None => self.data.and_then(|inner| (*inner).into_fragment()),
        }
    }
}

/// Map one raw `data:` payload from the provider to a fragment.
///
/// Role-only deltas, usage records and anything undecodable yield `None`.
fn normalize_chunk(data: &str) -> Option<Fragment> {
    match serde_json::from_str::<MistralChunk>(data) {
        Ok(chunk) => chunk.into_fragment(),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping undecodable provider chunk");
            None
        }
    }
}

#[derive(Clone)]
pub struct MistralClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MistralClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for MistralClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn stream_chat(&self, request: CompletionRequest) -> Result<FragmentStream, ProviderError> {
        let body = MistralRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let mut bytes = response.bytes_stream();

        Ok(Box::pin(stream! {
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };

                for event in decoder.feed(&chunk) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(data) => {
                            if let Some(fragment) = normalize_chunk(&data) {
                                yield Ok(fragment);
                            }
                        }
                    }
                }
            }

            // Last record may lack its trailing newline
            if let Some(SseEvent::Data(data)) = decoder.finish() {
                if let Some(fragment) = normalize_chunk(&data) {
                    yield Ok(fragment);
                }
            }
        }))
    }
}
