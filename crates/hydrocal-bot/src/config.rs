//! Bot configuration.
//!
//! Reads the `[bot]` section from `config/default.toml`. Secrets never
//! live here; they come from the environment.

/// Settings loaded from the `[bot]` section of `config/default.toml`.
pub struct BotConfig {
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout: u64,
    /// How often the background eviction sweep runs, in seconds.
    pub eviction_interval_secs: u64,
    /// Cache entries idle longer than this many hours are evicted.
    pub inactive_after_hours: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_timeout: 30,
            eviction_interval_secs: 3600,
            inactive_after_hours: 24,
        }
    }
}

/// Load bot configuration from `config/default.toml`.
///
/// Falls back to defaults if the file is missing or the `[bot]` section
/// is absent.
pub fn load_bot_config() -> BotConfig {
    match std::fs::read_to_string("config/default.toml") {
        Ok(content) => parse_bot_config(&content),
        Err(_) => BotConfig::default(),
    }
}

fn parse_bot_config(content: &str) -> BotConfig {
    let defaults = BotConfig::default();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return defaults,
    };

    let bot = match table.get("bot") {
        Some(toml::Value::Table(b)) => b,
        _ => return defaults,
    };

    BotConfig {
        poll_timeout: bot
            .get("poll_timeout")
            .and_then(|v| v.as_integer())
            .map(|v| v.clamp(1, 300) as u64)
            .unwrap_or(defaults.poll_timeout),
        eviction_interval_secs: bot
            .get("eviction_interval_secs")
            .and_then(|v| v.as_integer())
            .map(|v| v.max(1) as u64)
            .unwrap_or(defaults.eviction_interval_secs),
        inactive_after_hours: bot
            .get("inactive_after_hours")
            .and_then(|v| v.as_integer())
            .map(|v| v.max(1) as u64)
            .unwrap_or(defaults.inactive_after_hours),
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_section() {
        let cfg = parse_bot_config("[other]\nfoo = 1\n");
        assert_eq!(cfg.poll_timeout, 30);
        assert_eq!(cfg.eviction_interval_secs, 3600);
        assert_eq!(cfg.inactive_after_hours, 24);
    }

    #[test]
    fn values_are_read_from_the_bot_section() {
        let cfg = parse_bot_config(
            "[bot]\npoll_timeout = 10\neviction_interval_secs = 600\ninactive_after_hours = 48\n",
        );
        assert_eq!(cfg.poll_timeout, 10);
        assert_eq!(cfg.eviction_interval_secs, 600);
        assert_eq!(cfg.inactive_after_hours, 48);
    }

    #[test]
    fn poll_timeout_is_clamped() {
        let cfg = parse_bot_config("[bot]\npoll_timeout = 9999\n");
        assert_eq!(cfg.poll_timeout, 300);
    }

    #[test]
    fn garbage_input_falls_back_to_defaults() {
        let cfg = parse_bot_config("not toml at all {{{");
        assert_eq!(cfg.poll_timeout, 30);
    }
}
