//! Telegram Bot API client.
//!
//! Thin typed wrapper over the HTTP API: long-polling via `getUpdates`,
//! message sending with reply/inline keyboards, callback acknowledgment,
//! and multipart photo upload for progress charts. All method calls are
//! POSTed to `{base}{token}/{method}` and answered as
//! `{ "ok": true, "result": ... }`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use hydrocal_core::Keyboard;

use crate::error::{ProviderError, Result};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";

// ═══════════════════════════════════════════════════════════════════════
//  Wire types
// ═══════════════════════════════════════════════════════════════════════

/// One incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// The bot's own identity, from `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
//  Client
// ═══════════════════════════════════════════════════════════════════════

/// Telegram Bot API client, authenticated with a bot token.
pub struct TelegramClient {
    token: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            token: token.into(),
            http,
        }
    }

    /// Build a full Bot API URL for the given method.
    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", TELEGRAM_API_BASE, self.token, method)
    }

    /// Check the `ok` field and return the `result` payload.
    ///
    /// Failures arrive as
    /// `{ "ok": false, "error_code": 400, "description": "..." }`.
    fn parse_response(response: Value, method: &'static str) -> Result<Value> {
        let ok = response
            .get("ok")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !ok {
            let error_code = response
                .get("error_code")
                .and_then(|v| v.as_i64())
                .unwrap_or(-1);
            let description = response
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(ProviderError::Api {
                service: "telegram",
                reason: format!("{method} failed (code {error_code}): {description}"),
            });
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// POST a JSON body to a Bot API method and return its `result`.
    async fn call(&self, method: &'static str, body: Value) -> Result<Value> {
        let url = self.api_url(method);
        debug!(method, "telegram api call");
        let response: Value = self.http.post(&url).json(&body).send().await?.json().await?;
        Self::parse_response(response, method)
    }

    // ── methods ──────────────────────────────────────────────────────

    /// Verify the token and fetch the bot's identity.
    pub async fn get_me(&self) -> Result<BotIdentity> {
        let result = self.call("getMe", json!({})).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Long-poll for updates after `offset`.
    ///
    /// The HTTP timeout is padded past the poll timeout so the request
    /// is not cut off mid-poll.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = json!({ "timeout": timeout_secs });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let url = self.api_url("getUpdates");
        let response: Value = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        let result = Self::parse_response(response, "getUpdates")?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a text message, optionally with a keyboard.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = keyboard_markup(keyboard);
        }
        self.call("sendMessage", body).await?;
        Ok(())
    }

    /// Replace the text of a previously sent message.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<()> {
        self.call(
            "editMessageText",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "text": text,
            }),
        )
        .await?;
        Ok(())
    }

    /// Acknowledge an inline-keyboard press so the client stops its
    /// loading spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.call(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_query_id }),
        )
        .await?;
        Ok(())
    }

    /// Upload a PNG as a photo message.
    pub async fn send_photo(&self, chat_id: i64, png: Vec<u8>, filename: &str) -> Result<()> {
        let url = self.api_url("sendPhoto");
        let part = reqwest::multipart::Part::bytes(png)
            .file_name(filename.to_string())
            .mime_str("image/png")
            .map_err(ProviderError::Http)?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        debug!(chat_id, filename, "uploading photo");
        let response: Value = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        Self::parse_response(response, "sendPhoto")?;
        Ok(())
    }

    /// Register the command menu shown in the Telegram client.
    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<()> {
        let commands: Vec<Value> = commands
            .iter()
            .map(|(command, description)| {
                json!({ "command": command, "description": description })
            })
            .collect();
        self.call("setMyCommands", json!({ "commands": commands }))
            .await?;
        Ok(())
    }
}

/// Convert an engine keyboard to Telegram `reply_markup` JSON.
fn keyboard_markup(keyboard: &Keyboard) -> Value {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            json!({ "keyboard": rows, "resize_keyboard": true })
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(label, data)| {
                            json!({ "text": label, "callback_data": data })
                        })
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_embeds_token_and_method() {
        let client = TelegramClient::new("123456:ABC-DEF", reqwest::Client::new());
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/bot123456:ABC-DEF/sendMessage"
        );
    }

    #[test]
    fn parse_response_returns_result_on_ok() {
        let resp = json!({ "ok": true, "result": { "message_id": 42 } });
        let result = TelegramClient::parse_response(resp, "sendMessage").unwrap();
        assert_eq!(result["message_id"], 42);
    }

    #[test]
    fn parse_response_fails_on_ok_false() {
        let resp = json!({ "ok": false, "error_code": 401, "description": "Unauthorized" });
        let err = TelegramClient::parse_response(resp, "getMe").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn parse_response_fails_on_missing_ok() {
        let err = TelegramClient::parse_response(json!({}), "getMe").unwrap_err();
        assert!(err.to_string().contains("getMe"));
    }

    #[test]
    fn reply_keyboard_markup_shape() {
        let markup = keyboard_markup(&Keyboard::Reply(vec![vec![
            "male".to_string(),
            "female".to_string(),
        ]]));
        assert_eq!(markup["keyboard"][0][0]["text"], "male");
        assert_eq!(markup["resize_keyboard"], true);
    }

    #[test]
    fn inline_keyboard_markup_shape() {
        let markup = keyboard_markup(&Keyboard::Inline(vec![vec![(
            "Running".to_string(),
            "running".to_string(),
        )]]));
        assert_eq!(markup["inline_keyboard"][0][0]["text"], "Running");
        assert_eq!(markup["inline_keyboard"][0][0]["callback_data"], "running");
    }

    #[test]
    fn remove_keyboard_markup_shape() {
        let markup = keyboard_markup(&Keyboard::Remove);
        assert_eq!(markup["remove_keyboard"], true);
    }

    #[test]
    fn update_deserializes_message_and_callback() {
        let raw = json!([
            {
                "update_id": 7,
                "message": {
                    "message_id": 1,
                    "chat": { "id": 42 },
                    "from": { "id": 42 },
                    "text": "/start"
                }
            },
            {
                "update_id": 8,
                "callback_query": {
                    "id": "abc",
                    "from": { "id": 42 },
                    "message": { "message_id": 2, "chat": { "id": 42 } },
                    "data": "restart_yes"
                }
            }
        ]);
        let updates: Vec<Update> = serde_json::from_value(raw).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        let cb = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(cb.from.id, 42);
        assert_eq!(cb.data.as_deref(), Some("restart_yes"));
    }
}
