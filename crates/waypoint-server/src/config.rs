// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub max_body_bytes: usize,
    /// Endpoint of the image-generation collaborator; `None` selects the
    /// in-process fake.
    pub generator_url: Option<String>,
    pub generator_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_body_bytes: 1024 * 1024,
            generator_url: None,
            generator_timeout: Duration::from_secs(30),
        }
    }
}
