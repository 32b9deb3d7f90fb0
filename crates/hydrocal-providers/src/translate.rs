//! MyMemory translation client.
//!
//! Used to turn Russian city and food names into English before they
//! hit the weather and nutrition APIs. Free endpoint, no credentials.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use hydrocal_core::TextTranslator;

use crate::error::{ProviderError, Result};

const API_URL: &str = "https://api.mymemory.translated.net/get";

/// MyMemory translation client.
pub struct MyMemory {
    http: reqwest::Client,
}

impl MyMemory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch(&self, text: &str, src: &str, dest: &str) -> Result<String> {
        debug!(text, src, dest, "translating");

        let langpair = format!("{src}|{dest}");
        let response: Value = self
            .http
            .get(API_URL)
            .query(&[("q", text), ("langpair", &langpair)])
            .send()
            .await?
            .json()
            .await?;

        let status = response
            .get("responseStatus")
            .and_then(|v| v.as_i64())
            .unwrap_or(-1);
        if status != 200 {
            return Err(ProviderError::Api {
                service: "mymemory",
                reason: format!("status {status}"),
            });
        }

        response
            .pointer("/responseData/translatedText")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or(ProviderError::BadResponse {
                service: "mymemory",
                reason: "missing responseData.translatedText".to_string(),
            })
    }
}

#[async_trait]
impl TextTranslator for MyMemory {
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Option<String> {
        match self.fetch(text, src, dest).await {
            Ok(translated) => Some(translated),
            Err(err) => {
                warn!(text, %err, "translation failed, using original text");
                None
            }
        }
    }
}
