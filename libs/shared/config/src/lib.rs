use std::env;
use std::str::FromStr;
use tracing::warn;

const MAX_SLOT_STEP_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub generation_api_url: String,
    pub generation_api_key: String,
    pub generation_model: String,
    pub generation_timeout_secs: u64,
    pub slot_step_minutes: i64,
    pub slot_intersection_strategy: String,
    pub scheduling_fixture_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            generation_api_url: String::new(),
            generation_api_key: String::new(),
            generation_model: "default".to_string(),
            generation_timeout_secs: 30,
            slot_step_minutes: 15,
            slot_intersection_strategy: "envelope".to_string(),
            scheduling_fixture_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut config = Self {
            server_port: parsed_var("SERVER_PORT", defaults.server_port),
            generation_api_url: env::var("GENERATION_API_URL")
                .unwrap_or_else(|_| {
                    warn!("GENERATION_API_URL not set, schedule optimization disabled");
                    String::new()
                }),
            generation_api_key: env::var("GENERATION_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("GENERATION_API_KEY not set, using empty value");
                    String::new()
                }),
            generation_model: env::var("GENERATION_MODEL")
                .unwrap_or(defaults.generation_model),
            generation_timeout_secs: parsed_var(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout_secs,
            ),
            slot_step_minutes: parsed_var("SLOT_STEP_MINUTES", defaults.slot_step_minutes),
            slot_intersection_strategy: env::var("SLOT_INTERSECTION_STRATEGY")
                .unwrap_or(defaults.slot_intersection_strategy),
            scheduling_fixture_path: env::var("SCHEDULING_FIXTURE_PATH").ok(),
        };

        if !(1..=MAX_SLOT_STEP_MINUTES).contains(&config.slot_step_minutes) {
            warn!(
                "SLOT_STEP_MINUTES must be within 1..={}, falling back to {}",
                MAX_SLOT_STEP_MINUTES, defaults.slot_step_minutes
            );
            config.slot_step_minutes = defaults.slot_step_minutes;
        }

        config
    }

    pub fn is_generation_configured(&self) -> bool {
        !self.generation_api_url.is_empty()
    }
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fifteen_minute_envelope_search() {
        let config = AppConfig::default();
        assert_eq!(config.slot_step_minutes, 15);
        assert_eq!(config.slot_intersection_strategy, "envelope");
        assert!(!config.is_generation_configured());
    }

    #[test]
    fn out_of_range_slot_step_from_env_falls_back() {
        env::set_var("SLOT_STEP_MINUTES", i64::MAX.to_string());
        let config = AppConfig::from_env();
        env::remove_var("SLOT_STEP_MINUTES");

        assert_eq!(config.slot_step_minutes, 15);
    }

    #[test]
    fn generation_is_configured_once_url_present() {
        let config = AppConfig {
            generation_api_url: "http://localhost:8080".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_generation_configured());
    }
}
