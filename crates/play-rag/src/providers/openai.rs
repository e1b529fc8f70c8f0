//! OpenAI-compatible chat completions client with streamed output

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{FragmentStream, GenerationProvider};

/// Chat completions client (`/v1/chat/completions`, `stream: true`)
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client with an explicit API key
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client reading its key from the configured environment variable
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| Error::config(format!("{} is not set", config.api_key_env)))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiClient {
    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_message: &str,
        model: &str,
    ) -> Result<FragmentStream> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream("generation", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream("generation", format!("HTTP {} - {}", status, body)));
        }

        let stream = async_stream::try_stream! {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut finished = false;

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk
                    .map_err(|e| Error::upstream("generation", format!("stream error: {}", e)))?;

                for event in decoder.push(&chunk) {
                    match event {
                        SseEvent::Done => {
                            finished = true;
                            break 'read;
                        }
                        SseEvent::Data(payload) => {
                            if let Some(fragment) = parse_delta(&payload)? {
                                yield fragment;
                            }
                        }
                    }
                }
            }

            if !finished {
                Err::<(), Error>(Error::upstream("generation", "stream closed before [DONE]"))?;
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Extract the content delta of one streamed chunk, skipping empty deltas
fn parse_delta(payload: &str) -> Result<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(payload)
        .map_err(|e| Error::upstream("generation", format!("bad stream chunk: {}", e)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// A server-sent event relevant to chat streaming
#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Data(String),
    Done,
}

/// Incremental `data:` line decoder.
///
/// Network chunks may split lines (and UTF-8 sequences) anywhere, so bytes
/// are buffered until a newline arrives.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();
            if data == "[DONE]" {
                events.push(SseEvent::Done);
            } else if !data.is_empty() {
                events.push(SseEvent::Data(data.to_string()));
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::default();
        let first = decoder.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Wher");
        assert!(first.is_empty());

        let second = decoder.push(b"efore\"}}]}\n\n: keep-alive\ndata: [DONE]\n");
        assert_eq!(
            second,
            vec![
                SseEvent::Data("{\"choices\":[{\"delta\":{\"content\":\"Wherefore\"}}]}".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_decoder_keeps_multibyte_chars_intact() {
        let mut decoder = SseDecoder::default();
        let line = "data: café\n".as_bytes();
        let split = line.len() - 2; // inside the two-byte 'é'
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec![SseEvent::Data("café".to_string())]);
    }

    #[test]
    fn test_parse_delta() {
        assert_eq!(
            parse_delta(r#"{"choices":[{"delta":{"content":"O Romeo"}}]}"#).unwrap(),
            Some("O Romeo".to_string())
        );
        assert_eq!(parse_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(), None);
        assert_eq!(parse_delta(r#"{"choices":[]}"#).unwrap(), None);
        assert!(parse_delta("not json").is_err());
    }
}
