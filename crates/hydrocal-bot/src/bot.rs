//! Telegram polling loop.
//!
//! Wires the conversation engine to the Telegram Bot API: restores the
//! update offset from the state store, long-polls for updates, routes
//! messages and callback presses to the engine, and turns chart requests
//! into rendered PNG uploads. A background task sweeps idle cache
//! entries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use hydrocal_core::Engine;
use hydrocal_providers::{
    CallbackQuery, Message, MyMemory, NutritionClient, OpenWeather, TelegramClient, Update,
};
use hydrocal_store::{Database, StateStore, UserCache, UserStore};

use crate::chart::render_chart;
use crate::config::BotConfig;

/// State-store key holding the last confirmed Telegram update id.
const OFFSET_KEY: &str = "telegram_offset";

/// Command menu registered with Telegram on startup.
const COMMANDS: &[(&str, &str)] = &[
    ("start", "What this bot does"),
    ("set_profile", "Set up or edit your profile"),
    ("log_water", "Log water in ml"),
    ("log_food", "Log a food and its amount"),
    ("log_workout", "Log a workout"),
    ("check_progress", "Today's water and calorie progress"),
    ("check_history_progress", "Progress chart over a period"),
    ("restart_day", "Reset today's counters"),
];

/// Read an optional credential from the environment, warning when the
/// feature it powers will be degraded.
fn env_or_warn(key: &str, feature: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            warn!(key, "{feature} disabled: credential not set");
            String::new()
        }
    }
}

pub struct Bot {
    client: TelegramClient,
    engine: Engine,
    states: StateStore,
    config: BotConfig,
}

impl Bot {
    /// Build the full provider stack from the environment and `db`.
    pub fn from_env(db: Database, config: BotConfig) -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN is not set")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        let weather = OpenWeather::new(
            env_or_warn("OPENWEATHER_API_KEY", "weather-adjusted water goals"),
            http.clone(),
        );
        let nutrition = NutritionClient::new(
            env_or_warn("NUTRITIONIX_APP_ID", "food lookups"),
            env_or_warn("NUTRITIONIX_APP_KEY", "food lookups"),
            env_or_warn("EDAMAM_APP_ID", "food suggestions"),
            env_or_warn("EDAMAM_APP_KEY", "food suggestions"),
            http.clone(),
        );
        let translator = MyMemory::new(http.clone());

        let store = UserStore::new(db.clone());
        let cache = Arc::new(UserCache::new(store.clone()));
        let engine = Engine::new(
            cache.clone(),
            store,
            Arc::new(weather),
            Arc::new(nutrition),
            Arc::new(translator),
        );

        // Idle-entry sweeper. Holds only the cache, so it never keeps
        // the bot alive on its own.
        let sweep_cache = cache.clone();
        let sweep_every = Duration::from_secs(config.eviction_interval_secs);
        let max_idle = Duration::from_secs(config.inactive_after_hours * 3600);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = sweep_cache.remove_inactive(max_idle).await;
                if evicted > 0 {
                    info!(evicted, "evicted idle cache entries");
                }
            }
        });

        Ok(Self {
            client: TelegramClient::new(token, http),
            engine,
            states: StateStore::new(db),
            config,
        })
    }

    /// Verify the token, register the command menu, and poll forever.
    pub async fn run(&self) -> Result<()> {
        let me = self.client.get_me().await.context("getMe failed")?;
        info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or("?"),
            "connected to telegram"
        );

        if let Err(err) = self.client.set_my_commands(COMMANDS).await {
            warn!(%err, "failed to register command menu");
        }

        let mut offset = self.states.get_i64(OFFSET_KEY).await?;
        if let Some(offset) = offset {
            info!(offset, "resuming from stored update offset");
        }

        loop {
            let updates = match self
                .client
                .get_updates(offset, self.config.poll_timeout)
                .await
            {
                Ok(updates) => updates,
                Err(err) => {
                    warn!(%err, "getUpdates failed, retrying");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                let next_offset = update.update_id + 1;
                self.handle_update(update).await;
                offset = Some(next_offset);
                if let Err(err) = self.states.set_i64(OFFSET_KEY, next_offset).await {
                    warn!(%err, "failed to persist update offset");
                }
            }
        }
    }

    /// Route one update. Errors are logged, never fatal to the loop.
    async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or(chat_id);

        let reply = match self.engine.handle_message(user_id, text).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(user_id, %err, "message handling failed");
                if let Err(err) = self
                    .client
                    .send_message(chat_id, "Something went wrong, please try again.", None)
                    .await
                {
                    warn!(chat_id, %err, "failed to send error notice");
                }
                return;
            }
        };

        if let Err(err) = self
            .client
            .send_message(chat_id, &reply.text, reply.keyboard.as_ref())
            .await
        {
            warn!(chat_id, %err, "failed to send reply");
        }

        if let Some(chart) = reply.chart {
            self.send_chart(chat_id, user_id, chart).await;
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        if let Err(err) = self.client.answer_callback_query(&callback.id).await {
            warn!(%err, "failed to answer callback query");
        }

        let Some(data) = callback.data.as_deref() else {
            return;
        };
        let user_id = callback.from.id;

        let reply = match self.engine.handle_callback(user_id, data).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(user_id, %err, "callback handling failed");
                return;
            }
        };

        // Prefer editing the message the button lives on, so the inline
        // keyboard disappears with it.
        match callback.message {
            Some(message) => {
                if let Err(err) = self
                    .client
                    .edit_message_text(message.chat.id, message.message_id, &reply.text)
                    .await
                {
                    warn!(user_id, %err, "failed to edit callback message");
                }
            }
            None => {
                if let Err(err) = self
                    .client
                    .send_message(user_id, &reply.text, reply.keyboard.as_ref())
                    .await
                {
                    warn!(user_id, %err, "failed to send callback reply");
                }
            }
        }
    }

    /// Render a chart to a temp file, upload it, then delete the file.
    async fn send_chart(&self, chat_id: i64, user_id: i64, chart: hydrocal_core::ChartRequest) {
        let filename = format!("progress_{user_id}_{}.png", chart.period.as_str());
        let path: PathBuf = std::env::temp_dir().join(&filename);

        let render_path = path.clone();
        let rendered = tokio::task::spawn_blocking(move || render_chart(&chart, &render_path))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);
        if let Err(err) = rendered {
            warn!(user_id, %err, "chart rendering failed");
            return;
        }

        let result = match tokio::fs::read(&path).await {
            Ok(png) => self
                .client
                .send_photo(chat_id, png, &filename)
                .await
                .map_err(anyhow::Error::from),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(user_id, %err, "failed to send chart");
        }

        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!(%err, "failed to remove chart file");
        }
    }
}
