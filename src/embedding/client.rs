// file: src/embedding/client.rs
// description: OpenAI-compatible embeddings API client with retry on transient failures
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::EmbeddingConfig;
use crate::embedding::{Embedder, RetryPolicy};
use crate::error::{PipelineError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    #[serde(default)]
    index: usize,
}

enum AttemptError {
    Transient(String),
    Fatal(PipelineError),
}

pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
    retries: AtomicUsize,
}

impl EmbeddingClient {
    pub fn new(api_key: String, config: &EmbeddingConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::MissingCredential(config.api_key_env.clone()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| PipelineError::Validation("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            retry: RetryPolicy::from_config(&config.retry),
            retries: AtomicUsize::new(0),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of retried requests since the client was created.
    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::SeqCst)
    }

    async fn request_once(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f64>>, AttemptError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            if is_transient_status(status) {
                return Err(AttemptError::Transient(format!("status {}: {}", status, body)));
            }
            return Err(AttemptError::Fatal(PipelineError::Api {
                status: status.as_u16(),
                body,
            }));
        }

        let mut parsed: EmbeddingResponse =
            response.json().await.map_err(classify_transport_error)?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(AttemptError::Fatal(PipelineError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: parsed.data.len(),
            }));
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

impl Embedder for EmbeddingClient {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Requesting {} embeddings from {}", texts.len(), self.endpoint);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.request_once(texts).await {
                Ok(vectors) => {
                    debug!(
                        "Received {} embeddings of dimension {}",
                        vectors.len(),
                        vectors.first().map(Vec::len).unwrap_or(0)
                    );
                    return Ok(vectors);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(message)) => {
                    if !self.retry.should_retry(attempt) {
                        return Err(PipelineError::RetriesExhausted {
                            attempts: attempt,
                            last_error: message,
                        });
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Embeddings request failed (attempt {}/{}): {}. Retrying in {:.1}s",
                        attempt,
                        self.retry.max_attempts,
                        message,
                        delay.as_secs_f64()
                    );
                    self.retries.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn classify_transport_error(err: reqwest::Error) -> AttemptError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() || err.is_decode()
    {
        AttemptError::Transient(err.to_string())
    } else {
        AttemptError::Fatal(PipelineError::Http(err))
    }
}
