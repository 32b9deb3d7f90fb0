//! Per-user conversation state.
//!
//! Each user has at most one [`DialogState`]: the step their
//! conversation is waiting on plus whether they are editing an existing
//! profile. The registry is transient by design; a restart loses it and
//! users recover by re-issuing a command.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::workout::WorkoutType;

/// The input the conversation is currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Weight,
    Height,
    Age,
    Gender,
    Activity,
    City,
    LogWater,
    /// Waiting for gram amount; the kcal density came from the lookup.
    LogFood { calories_per_100: f64 },
    /// Waiting for minutes; the type came from the inline keyboard.
    LogWorkout { workout: WorkoutType },
    RestartConfirm,
}

/// A user's live conversation state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DialogState {
    pub step: Option<Step>,
    /// True while a field is being changed from the profile summary.
    pub editing: bool,
}

/// All live dialog states, keyed by user id.
#[derive(Default)]
pub struct DialogRegistry {
    states: Mutex<HashMap<i64, DialogState>>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for `user_id`, defaulting to idle.
    pub async fn get(&self, user_id: i64) -> DialogState {
        let states = self.states.lock().await;
        states.get(&user_id).copied().unwrap_or_default()
    }

    /// Replace the state for `user_id`.
    pub async fn set(&self, user_id: i64, state: DialogState) {
        let mut states = self.states.lock().await;
        states.insert(user_id, state);
    }

    /// Set only the step, preserving the editing flag.
    pub async fn set_step(&self, user_id: i64, step: Option<Step>) {
        let mut states = self.states.lock().await;
        states.entry(user_id).or_default().step = step;
    }

    /// Return the user to idle (no step, not editing).
    pub async fn clear(&self, user_id: i64) {
        let mut states = self.states.lock().await;
        states.remove(&user_id);
    }
}

// ── tests ────────────────────────────────────────────────────────────
