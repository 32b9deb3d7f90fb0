//! # hydrocal-providers
//!
//! HTTP clients behind the engine's provider traits, plus the Telegram
//! Bot API client used by the polling loop:
//!
//! - [`OpenWeather`]: current city temperature (heat bonus input)
//! - [`NutritionClient`]: food lookups and low-calorie suggestions
//! - [`MyMemory`]: best-effort Russian-to-English normalization
//! - [`TelegramClient`]: long polling, keyboards, chart photo upload

pub mod error;
pub mod nutrition;
pub mod telegram;
pub mod translate;
pub mod weather;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{ProviderError, Result};
pub use nutrition::NutritionClient;
pub use telegram::{BotIdentity, CallbackQuery, Message, TelegramClient, Update};
pub use translate::MyMemory;
pub use weather::OpenWeather;
