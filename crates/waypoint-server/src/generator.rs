// SPDX-License-Identifier: Apache-2.0

//! Image-generation collaborator port.
//!
//! The provider call runs fully inside the request that triggered it; a
//! slow provider directly extends client-perceived latency. No retry here:
//! failures surface to the caller as 502.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError(pub String);

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storyboard generation failed: {}", self.0)
    }
}

impl std::error::Error for GenerationError {}

#[async_trait]
pub trait StoryboardGenerator: Send + Sync + 'static {
    /// `generate(prompt) -> imageUrl`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Deterministic stand-in used by tests and local runs without a provider.
#[derive(Debug, Default)]
pub struct FakeGenerator {
    pub fail_with: Option<String>,
}

#[async_trait]
impl StoryboardGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Some(reason) = &self.fail_with {
            return Err(GenerationError(reason.clone()));
        }
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        Ok(format!("https://storyboards.invalid/{}.png", &digest[..16]))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    image_url: String,
}

/// Talks to an HTTP provider: `POST {url}` with `{"prompt": ...}`, expects
/// `{"imageUrl": ...}` back.
pub struct HttpGenerator {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl StoryboardGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| GenerationError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GenerationError(format!(
                "provider returned {}",
                response.status()
            )));
        }
        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|e| GenerationError(e.to_string()))?;
        Ok(body.image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_generator_is_deterministic_per_prompt() {
        let generator = FakeGenerator::default();
        let a = generator.generate("a sketch").await.expect("url");
        let b = generator.generate("a sketch").await.expect("url");
        assert_eq!(a, b);
        let c = generator.generate("another").await.expect("url");
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn fake_generator_surfaces_configured_failure() {
        let generator = FakeGenerator {
            fail_with: Some("quota exhausted".to_string()),
        };
        let err = generator.generate("x").await.expect_err("failure");
        assert!(err.to_string().contains("quota exhausted"));
    }
}
