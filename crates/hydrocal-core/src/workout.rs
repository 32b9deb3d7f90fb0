//! Workout types and their burn rates.

/// A supported workout type with a fixed kcal/minute burn rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutType {
    Running,
    Cycling,
    Swimming,
}

impl WorkoutType {
    /// Calories burned per minute.
    pub fn rate(&self) -> f64 {
        match self {
            Self::Running => 10.0,
            Self::Cycling => 8.0,
            Self::Swimming => 12.0,
        }
    }

    /// Stable identifier used as inline-keyboard callback data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
            Self::Swimming => "swimming",
        }
    }

    /// Display label shown on keyboard buttons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
            Self::Swimming => "Swimming",
        }
    }

    /// Parse a workout token. Accepts the callback identifiers and the
    /// Russian labels users may type by hand.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "running" | "бег" => Some(Self::Running),
            "cycling" | "велосипед" => Some(Self::Cycling),
            "swimming" | "плавание" => Some(Self::Swimming),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Running, Self::Cycling, Self::Swimming]
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_match_expected_burn() {
        assert_eq!(WorkoutType::Running.rate(), 10.0);
        assert_eq!(WorkoutType::Cycling.rate(), 8.0);
        assert_eq!(WorkoutType::Swimming.rate(), 12.0);
    }

    #[test]
    fn parses_identifiers_and_labels() {
        assert_eq!(WorkoutType::parse("running"), Some(WorkoutType::Running));
        assert_eq!(WorkoutType::parse("бег"), Some(WorkoutType::Running));
        assert_eq!(WorkoutType::parse(" Велосипед "), Some(WorkoutType::Cycling));
        assert_eq!(WorkoutType::parse("ПЛАВАНИЕ"), Some(WorkoutType::Swimming));
        assert_eq!(WorkoutType::parse("yoga"), None);
    }

    #[test]
    fn identifiers_round_trip() {
        for w in WorkoutType::all() {
            assert_eq!(WorkoutType::parse(w.as_str()), Some(w));
        }
    }
}
