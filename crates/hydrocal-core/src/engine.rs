//! The conversation engine.
//!
//! Transport-agnostic: it consumes user ids plus message/callback text
//! and produces [`Reply`] values (text, an optional keyboard, an
//! optional chart request). The Telegram loop in the binary is thin glue
//! around this.
//!
//! Commands route first; otherwise the user's current [`Step`] decides
//! how free text is interpreted. Invalid input never advances a step and
//! never mutates the record, it only re-issues the prompt.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use hydrocal_store::{
    Gender, Period, RecordPatch, UserCache, UserRecord, UserStore,
};

use crate::dialog::{DialogRegistry, DialogState, Step};
use crate::error::CoreResult;
use crate::goals;
use crate::history::{self, HistoryBucket};
use crate::providers::{NutritionProvider, TextTranslator, WeatherProvider};
use crate::workout::WorkoutType;

// ═══════════════════════════════════════════════════════════════════════
//  Reply types
// ═══════════════════════════════════════════════════════════════════════

/// Keyboard attached to a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// Rows of text buttons shown in place of the user's keyboard.
    Reply(Vec<Vec<String>>),
    /// Rows of inline buttons as `(label, callback_data)` pairs.
    Inline(Vec<Vec<(String, String)>>),
    /// Remove any previously shown reply keyboard.
    Remove,
}

/// A chart the transport should render and send as a photo.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub period: Period,
    pub buckets: Vec<HistoryBucket>,
}

/// One outbound reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub chart: Option<ChartRequest>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            chart: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_chart(mut self, chart: ChartRequest) -> Self {
        self.chart = Some(chart);
        self
    }
}

const SETUP_PROMPT: &str = "Please set up your profile first with /set_profile.";

/// Format an amount without a trailing `.0` for whole values.
fn fmt(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

fn gender_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec!["male".to_string(), "female".to_string()]])
}

fn edit_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec!["Weight".to_string(), "Height".to_string()],
        vec!["Age".to_string(), "Activity".to_string()],
        vec!["City".to_string()],
        vec!["Cancel".to_string(), "Save".to_string()],
    ])
}

fn workout_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        WorkoutType::all()
            .iter()
            .map(|w| (w.label().to_string(), w.as_str().to_string()))
            .collect(),
    ])
}

// ═══════════════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════════════

/// The dialog state machine plus everything it needs to answer a turn.
pub struct Engine {
    cache: Arc<UserCache>,
    store: UserStore,
    dialogs: DialogRegistry,
    weather: Arc<dyn WeatherProvider>,
    nutrition: Arc<dyn NutritionProvider>,
    translator: Arc<dyn TextTranslator>,
}

impl Engine {
    pub fn new(
        cache: Arc<UserCache>,
        store: UserStore,
        weather: Arc<dyn WeatherProvider>,
        nutrition: Arc<dyn NutritionProvider>,
        translator: Arc<dyn TextTranslator>,
    ) -> Self {
        Self {
            cache,
            store,
            dialogs: DialogRegistry::new(),
            weather,
            nutrition,
            translator,
        }
    }

    // ── entry points ─────────────────────────────────────────────────

    /// Handle one inbound text message.
    #[instrument(skip(self, text))]
    pub async fn handle_message(&self, user_id: i64, text: &str) -> CoreResult<Reply> {
        let text = text.trim();

        if let Some(rest) = text.strip_prefix('/') {
            let (command, arg) = match rest.split_once(char::is_whitespace) {
                Some((cmd, arg)) => (cmd, arg.trim()),
                None => (rest, ""),
            };
            // "/cmd@botname" arrives in group chats.
            let command = command.split('@').next().unwrap_or(command);
            return self.handle_command(user_id, command, arg).await;
        }

        let state = self.dialogs.get(user_id).await;
        match state.step {
            Some(step) => self.handle_step(user_id, state, step, text).await,
            None if state.editing => self.handle_edit_choice(user_id, text).await,
            None => Ok(Reply::text(
                "I did not catch that. Use /start to see what I can do.",
            )),
        }
    }

    /// Handle one inline-keyboard button press.
    #[instrument(skip(self))]
    pub async fn handle_callback(&self, user_id: i64, data: &str) -> CoreResult<Reply> {
        match data {
            "restart_yes" => self.restart_confirmed(user_id).await,
            "restart_no" => {
                self.dialogs.set_step(user_id, None).await;
                info!(user_id, "day restart cancelled");
                Ok(Reply::text("Day restart cancelled."))
            }
            other => match WorkoutType::parse(other) {
                Some(workout) => {
                    self.dialogs
                        .set_step(user_id, Some(Step::LogWorkout { workout }))
                        .await;
                    Ok(Reply::text(format!(
                        "You chose {}. How many minutes did you train?",
                        workout.label()
                    )))
                }
                None => {
                    warn!(user_id, data = other, "unknown callback data");
                    Ok(Reply::text(
                        "Please pick a workout type with /log_workout.",
                    ))
                }
            },
        }
    }

    // ── commands ─────────────────────────────────────────────────────

    async fn handle_command(&self, user_id: i64, command: &str, arg: &str) -> CoreResult<Reply> {
        match command {
            "start" => Ok(Reply::text(
                "Hi! I track your daily water, calories, and workouts, and \
                 compute personal goals from your body metrics and local \
                 weather. Start with /set_profile.",
            )
            .with_keyboard(Keyboard::Remove)),
            "set_profile" => self.set_profile(user_id).await,
            "restart_day" => self.restart_day(user_id).await,
            "log_water" => self.log_water_command(user_id, arg).await,
            "log_food" => self.log_food_command(user_id, arg).await,
            "log_workout" => self.log_workout_command(user_id).await,
            "check_progress" => self.check_progress(user_id).await,
            "check_history_progress" => self.check_history(user_id, arg).await,
            _ => Ok(Reply::text("Unknown command. Use /start to see the list.")),
        }
    }

    async fn set_profile(&self, user_id: i64) -> CoreResult<Reply> {
        let record = self.cache.get(user_id).await?;
        match record {
            Some(record) if record.profile_complete() => self.profile_summary(user_id, &record).await,
            _ => {
                self.cache.add(user_id, UserRecord::default()).await;
                self.dialogs
                    .set(
                        user_id,
                        DialogState {
                            step: Some(Step::Weight),
                            editing: false,
                        },
                    )
                    .await;
                info!(user_id, "profile setup started");
                Ok(Reply::text("Enter your weight (kg):").with_keyboard(Keyboard::Remove))
            }
        }
    }

    /// Show the profile summary with the edit keyboard and enter edit mode.
    async fn profile_summary(&self, user_id: i64, record: &UserRecord) -> CoreResult<Reply> {
        self.dialogs
            .set(
                user_id,
                DialogState {
                    step: None,
                    editing: true,
                },
            )
            .await;
        Ok(Reply::text(format!(
            "Your profile:\n\
             Weight: {} kg\n\
             Height: {} cm\n\
             Age: {}\n\
             Activity: {} min/day\n\
             City: {}\n\n\
             Pick a field to change, or Save / Cancel:",
            fmt(record.weight),
            fmt(record.height),
            fmt(record.age),
            fmt(record.activity),
            record.city,
        ))
        .with_keyboard(edit_keyboard()))
    }

    async fn restart_day(&self, user_id: i64) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }

        self.dialogs
            .set_step(user_id, Some(Step::RestartConfirm))
            .await;
        Ok(Reply::text(
            "Restart the day? All of today's totals will be reset.",
        )
        .with_keyboard(Keyboard::Inline(vec![vec![
            ("Yes, restart the day".to_string(), "restart_yes".to_string()),
            ("No, cancel".to_string(), "restart_no".to_string()),
        ]])))
    }

    async fn restart_confirmed(&self, user_id: i64) -> CoreResult<Reply> {
        if self.cache.get(user_id).await?.is_none() {
            return Ok(Reply::text("No user data found."));
        }
        self.cache
            .update(
                user_id,
                RecordPatch {
                    logged_water: Some(0.0),
                    logged_calories: Some(0.0),
                    burned_calories: Some(0.0),
                    ..RecordPatch::default()
                },
                true,
            )
            .await?;
        self.dialogs.set_step(user_id, None).await;
        info!(user_id, "day restarted");
        Ok(Reply::text(
            "Day restarted. All totals are back to zero. Good luck!",
        ))
    }

    async fn log_water_command(&self, user_id: i64, arg: &str) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }

        match parse_amount(arg) {
            Some(ml) => self.log_water(user_id, &record, ml).await,
            None => {
                self.dialogs.set_step(user_id, Some(Step::LogWater)).await;
                Ok(Reply::text("How much water did you drink, in ml?")
                    .with_keyboard(Keyboard::Remove))
            }
        }
    }

    async fn log_water(&self, user_id: i64, record: &UserRecord, ml: f64) -> CoreResult<Reply> {
        let merged = self
            .cache
            .update(
                user_id,
                RecordPatch {
                    logged_water: Some(record.logged_water + ml),
                    ..RecordPatch::default()
                },
                true,
            )
            .await?;
        let remaining = (merged.water_goal - merged.logged_water).max(0.0);
        info!(user_id, ml, total = merged.logged_water, "water logged");
        Ok(Reply::text(format!(
            "You drank {} ml. {} ml left to reach your goal.",
            fmt(merged.logged_water),
            fmt(remaining)
        ))
        .with_keyboard(Keyboard::Remove))
    }

    async fn log_food_command(&self, user_id: i64, arg: &str) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }
        if arg.is_empty() {
            return Ok(Reply::text(
                "Please name the food after the command, e.g. /log_food banana.",
            ));
        }

        // Food names may arrive in Russian; the lookup API wants English.
        let query = self
            .translator
            .translate(arg, "ru", "en")
            .await
            .unwrap_or_else(|| arg.to_string());

        match self.nutrition.lookup(&query).await {
            Some(info) if info.calories_per_100 > 0.0 => {
                self.dialogs
                    .set_step(
                        user_id,
                        Some(Step::LogFood {
                            calories_per_100: info.calories_per_100,
                        }),
                    )
                    .await;
                Ok(Reply::text(format!(
                    "🍎 {} has {} kcal per 100 g. How many grams did you eat?",
                    info.name,
                    fmt(info.calories_per_100)
                ))
                .with_keyboard(Keyboard::Remove))
            }
            Some(_) => Ok(Reply::text("Found it, but it has 0 kcal.")),
            None => Ok(Reply::text("Food not found. Try another query.")),
        }
    }

    async fn log_food(
        &self,
        user_id: i64,
        record: &UserRecord,
        grams: f64,
        calories_per_100: f64,
    ) -> CoreResult<Reply> {
        let kcal = (grams * calories_per_100 / 100.0).round();
        let merged = self
            .cache
            .update(
                user_id,
                RecordPatch {
                    logged_calories: Some(record.logged_calories + kcal),
                    ..RecordPatch::default()
                },
                true,
            )
            .await?;
        let remaining = (merged.calorie_goal - merged.logged_calories).max(0.0);
        info!(user_id, kcal, total = merged.logged_calories, "food logged");

        let mut text = format!(
            "Logged {} kcal. {} kcal left for today.",
            fmt(kcal),
            fmt(remaining)
        );
        let samples = self.nutrition.low_calorie_samples(3).await;
        if !samples.is_empty() {
            text.push_str("\n\nLight options to consider:");
            for sample in samples.iter().take(3) {
                text.push_str(&format!(
                    "\n§ {} - {} kcal per 100 g",
                    sample.name,
                    fmt(sample.calories)
                ));
            }
        }
        Ok(Reply::text(text).with_keyboard(Keyboard::Remove))
    }

    async fn log_workout_command(&self, user_id: i64) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }
        Ok(Reply::text("Choose a workout type:").with_keyboard(workout_keyboard()))
    }

    async fn log_workout(
        &self,
        user_id: i64,
        record: &UserRecord,
        workout: WorkoutType,
        minutes: f64,
    ) -> CoreResult<Reply> {
        let burned = workout.rate() * minutes;
        let water_bonus = goals::workout_water_bonus(minutes);
        let patch = RecordPatch {
            burned_calories: Some(record.burned_calories + burned),
            water_goal: if water_bonus > 0.0 {
                Some(record.water_goal + water_bonus)
            } else {
                None
            },
            ..RecordPatch::default()
        };
        self.cache.update(user_id, patch, true).await?;
        info!(user_id, workout = workout.as_str(), minutes, burned, "workout logged");

        let mut text = format!(
            "🏃 {} for {} min burned {} kcal.",
            workout.label(),
            fmt(minutes),
            fmt(burned)
        );
        if water_bonus > 0.0 {
            text.push_str(&format!(" Drink an extra {} ml of water.", fmt(water_bonus)));
        }
        Ok(Reply::text(text).with_keyboard(Keyboard::Remove))
    }

    async fn check_progress(&self, user_id: i64) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }

        let water_left = (record.water_goal - record.logged_water).max(0.0);
        let balance =
            (record.calorie_goal - record.logged_calories + record.burned_calories).max(0.0);
        Ok(Reply::text(format!(
            "📊 Progress:\n\
             Water:\n\
             § Drunk: {} ml of {} ml.\n\
             § Left: {} ml.\n\n\
             Calories:\n\
             § Consumed: {} kcal of {} kcal.\n\
             § Burned: {} kcal.\n\
             § Balance: {} kcal.",
            fmt(record.logged_water),
            fmt(record.water_goal),
            fmt(water_left),
            fmt(record.logged_calories),
            fmt(record.calorie_goal),
            fmt(record.burned_calories),
            fmt(balance),
        )))
    }

    async fn check_history(&self, user_id: i64, arg: &str) -> CoreResult<Reply> {
        let Some(record) = self.cache.get(user_id).await? else {
            return Ok(Reply::text(SETUP_PROMPT));
        };
        if !record.profile_complete() {
            return Ok(Reply::text(SETUP_PROMPT));
        }

        let period = if arg.is_empty() {
            Period::Day
        } else {
            match Period::parse(arg) {
                Some(period) => period,
                None => {
                    return Ok(Reply::text(
                        "Invalid period. Choose day, week, month, or year.",
                    ));
                }
            }
        };

        let points = self.store.query_history(user_id, period).await?;
        if points.is_empty() {
            return Ok(Reply::text("No history to show yet."));
        }
        let buckets = history::aggregate(&points, period);
        Ok(
            Reply::text(format!("📊 Your progress over the last {period}:")).with_chart(
                ChartRequest { period, buckets },
            ),
        )
    }

    // ── step handling ────────────────────────────────────────────────

    async fn handle_step(
        &self,
        user_id: i64,
        state: DialogState,
        step: Step,
        text: &str,
    ) -> CoreResult<Reply> {
        match step {
            Step::Weight => {
                self.capture_numeric(
                    user_id,
                    state,
                    text,
                    |v| RecordPatch {
                        weight: Some(v),
                        ..RecordPatch::default()
                    },
                    Step::Height,
                    "Enter your height (cm):",
                    "Please enter a valid weight in kg.",
                )
                .await
            }
            Step::Height => {
                self.capture_numeric(
                    user_id,
                    state,
                    text,
                    |v| RecordPatch {
                        height: Some(v),
                        ..RecordPatch::default()
                    },
                    Step::Age,
                    "Enter your age:",
                    "Please enter a valid height in cm.",
                )
                .await
            }
            Step::Age => match parse_amount(text) {
                Some(age) => {
                    self.cache
                        .update(
                            user_id,
                            RecordPatch {
                                age: Some(age),
                                ..RecordPatch::default()
                            },
                            false,
                        )
                        .await?;
                    if state.editing {
                        let record = self.require_record(user_id).await?;
                        return self.profile_summary(user_id, &record).await;
                    }
                    self.dialogs.set_step(user_id, Some(Step::Gender)).await;
                    Ok(Reply::text("Please choose your gender:")
                        .with_keyboard(gender_keyboard()))
                }
                None => Ok(Reply::text("Please enter a valid age.")),
            },
            Step::Gender => match text {
                "male" | "female" => {
                    let gender = if text == "male" {
                        Gender::Male
                    } else {
                        Gender::Female
                    };
                    self.cache
                        .update(
                            user_id,
                            RecordPatch {
                                gender: Some(gender),
                                ..RecordPatch::default()
                            },
                            false,
                        )
                        .await?;
                    if state.editing {
                        let record = self.require_record(user_id).await?;
                        return self.profile_summary(user_id, &record).await;
                    }
                    self.dialogs.set_step(user_id, Some(Step::Activity)).await;
                    Ok(Reply::text("How many minutes of activity do you get per day?")
                        .with_keyboard(Keyboard::Remove))
                }
                _ => Ok(Reply::text("Please choose your gender:").with_keyboard(gender_keyboard())),
            },
            Step::Activity => {
                self.capture_numeric(
                    user_id,
                    state,
                    text,
                    |v| RecordPatch {
                        activity: Some(v),
                        ..RecordPatch::default()
                    },
                    Step::City,
                    "Which city are you in?",
                    "Please enter a valid number of minutes.",
                )
                .await
            }
            Step::City => {
                self.cache
                    .update(
                        user_id,
                        RecordPatch {
                            city: Some(text.to_string()),
                            ..RecordPatch::default()
                        },
                        false,
                    )
                    .await?;
                let record = self.compute_and_persist_goals(user_id).await?;
                self.dialogs.set_step(user_id, None).await;

                let done = format!(
                    "Profile set! 🎉\n\
                     Your daily water goal: {} ml.\n\
                     Your daily calorie goal: {} kcal.",
                    fmt(record.water_goal),
                    fmt(record.calorie_goal)
                );
                if state.editing {
                    let summary = self.profile_summary(user_id, &record).await?;
                    return Ok(Reply::text(format!("{done}\n\n{}", summary.text))
                        .with_keyboard(edit_keyboard()));
                }
                Ok(Reply::text(done).with_keyboard(Keyboard::Remove))
            }
            Step::LogWater => match parse_amount(text) {
                Some(ml) => {
                    let record = self.require_record(user_id).await?;
                    self.dialogs.set_step(user_id, None).await;
                    self.log_water(user_id, &record, ml).await
                }
                None => Ok(Reply::text("Please enter the amount of water in ml.")),
            },
            Step::LogFood { calories_per_100 } => match parse_amount(text) {
                Some(grams) => {
                    let record = self.require_record(user_id).await?;
                    self.dialogs.set_step(user_id, None).await;
                    self.log_food(user_id, &record, grams, calories_per_100).await
                }
                None => Ok(Reply::text("Please enter the amount in grams.")),
            },
            Step::LogWorkout { workout } => match parse_amount(text) {
                Some(minutes) => {
                    let record = self.require_record(user_id).await?;
                    self.dialogs.set_step(user_id, None).await;
                    self.log_workout(user_id, &record, workout, minutes).await
                }
                None => Ok(Reply::text("Please enter the workout time in minutes.")),
            },
            Step::RestartConfirm => Ok(Reply::text(
                "Use the buttons to confirm or cancel the restart.",
            )),
        }
    }

    /// Shared handler for the plain numeric profile steps.
    #[allow(clippy::too_many_arguments)]
    async fn capture_numeric(
        &self,
        user_id: i64,
        state: DialogState,
        text: &str,
        patch: impl FnOnce(f64) -> RecordPatch,
        next: Step,
        next_prompt: &str,
        error_prompt: &str,
    ) -> CoreResult<Reply> {
        match parse_amount(text) {
            Some(value) => {
                self.cache.update(user_id, patch(value), false).await?;
                if state.editing {
                    let record = self.require_record(user_id).await?;
                    return self.profile_summary(user_id, &record).await;
                }
                self.dialogs.set_step(user_id, Some(next)).await;
                Ok(Reply::text(next_prompt).with_keyboard(Keyboard::Remove))
            }
            None => Ok(Reply::text(error_prompt)),
        }
    }

    // ── edit mode ────────────────────────────────────────────────────

    async fn handle_edit_choice(&self, user_id: i64, text: &str) -> CoreResult<Reply> {
        let step_and_prompt = match text {
            "Weight" => Some((Step::Weight, "Enter your new weight (kg):")),
            "Height" => Some((Step::Height, "Enter your new height (cm):")),
            "Age" => Some((Step::Age, "Enter your new age:")),
            "Activity" => Some((Step::Activity, "Enter your activity in minutes per day:")),
            "City" => Some((Step::City, "Enter your city:")),
            _ => None,
        };
        if let Some((step, prompt)) = step_and_prompt {
            self.dialogs
                .set(
                    user_id,
                    DialogState {
                        step: Some(step),
                        editing: true,
                    },
                )
                .await;
            return Ok(Reply::text(prompt).with_keyboard(Keyboard::Remove));
        }

        match text {
            "Save" => {
                let record = self.compute_and_persist_goals(user_id).await?;
                self.dialogs.clear(user_id).await;
                info!(user_id, "profile saved");
                Ok(Reply::text(format!(
                    "Profile saved! 🎉\n\
                     Your daily water goal: {} ml.\n\
                     Your daily calorie goal: {} kcal.",
                    fmt(record.water_goal),
                    fmt(record.calorie_goal)
                ))
                .with_keyboard(Keyboard::Remove))
            }
            "Cancel" => {
                // Fields captured so far stay; only the goals are left as
                // they were.
                self.dialogs.clear(user_id).await;
                Ok(Reply::text("Profile edit cancelled.").with_keyboard(Keyboard::Remove))
            }
            _ => {
                let record = self.require_record(user_id).await?;
                self.profile_summary(user_id, &record).await
            }
        }
    }

    // ── goal computation ─────────────────────────────────────────────

    /// Recompute both goals from the current profile and persist them.
    ///
    /// The weather lookup (and the city translation feeding it) happens
    /// here, outside any cache lock.
    async fn compute_and_persist_goals(&self, user_id: i64) -> CoreResult<UserRecord> {
        let record = self.require_record(user_id).await?;

        let city_en = self
            .translator
            .translate(&record.city, "ru", "en")
            .await
            .unwrap_or_else(|| record.city.clone());
        let temperature = self.weather.temperature(&city_en).await;
        if temperature.is_none() {
            warn!(user_id, city = %record.city, "weather unavailable, no heat bonus");
        }

        let water = goals::water_goal(record.weight, record.activity, temperature);
        let calories = goals::calorie_goal(
            record.weight,
            record.height,
            record.age,
            record.gender,
            record.activity,
        );

        let merged = self
            .cache
            .update(
                user_id,
                RecordPatch {
                    water_goal: Some(water),
                    calorie_goal: Some(calories),
                    ..RecordPatch::default()
                },
                true,
            )
            .await?;
        Ok(merged)
    }

    /// Fetch the record that the current step implies must exist.
    async fn require_record(&self, user_id: i64) -> CoreResult<UserRecord> {
        match self.cache.get(user_id).await? {
            Some(record) => Ok(record),
            None => {
                // A step was set without a cache entry; recover with a
                // blank record rather than dropping the turn.
                warn!(user_id, "dialog step active for unknown user");
                Ok(UserRecord::default())
            }
        }
    }
}

/// Parse a non-negative finite number from user text.
fn parse_amount(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

// ── tests ────────────────────────────────────────────────────────────
