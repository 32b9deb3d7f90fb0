//! # hydrocal-core
//!
//! The conversation engine for hydrocal: goal calculation, the per-user
//! dialog state machine, history aggregation, and the provider traits
//! the engine consumes. Everything here is transport-agnostic; the
//! Telegram specifics live in `hydrocal-providers` and the binary.

pub mod dialog;
pub mod engine;
pub mod error;
pub mod goals;
pub mod history;
pub mod providers;
pub mod workout;

// ── re-exports ───────────────────────────────────────────────────────

pub use dialog::{DialogRegistry, DialogState, Step};
pub use engine::{ChartRequest, Engine, Keyboard, Reply};
pub use error::{CoreError, CoreResult};
pub use history::{HistoryBucket, aggregate};
pub use providers::{FoodInfo, FoodSample, NutritionProvider, TextTranslator, WeatherProvider};
pub use workout::WorkoutType;
