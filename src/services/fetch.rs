// src/services/fetch.rs

//! HTTP fetch agent.
//!
//! One GET per URL with transparent redirect following. Retry is not this
//! component's job; redelivery of the queue message is the only retry in
//! the system.

use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub final_url: String,
    /// Decoded body text
    pub body: String,
}

/// Performs single-page fetches with a configured HTTP client.
pub struct FetchAgent {
    client: Client,
}

impl FetchAgent {
    /// Create a fetch agent from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a URL, following redirects.
    ///
    /// Any non-2xx final status is an error; network failures (DNS,
    /// timeout, reset) surface as typed errors, never a panic.
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(AppError::Status {
                url: final_url,
                status,
            });
        }

        let body = response.text().await?;
        Ok(Page { final_url, body })
    }
}
