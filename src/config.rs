use crate::engine::{RunSchedule, ScheduleZone, TaxiRules};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub sleeper_api_url: String,
    pub league_id: String,
    pub max_taxi_size: u32,
    pub max_taxi_qb: u32,
    /// Overrides the league's own `draft_rounds` setting when present.
    pub draft_rounds: Option<u32>,
    pub league_history_depth: u32,
    pub schedule_utc_offset_minutes: i32,
    pub schedule_observe_us_dst: bool,
    pub run_tolerance_minutes: u32,
    pub admin_secret: Option<String>,
    pub upstream_retry_max_ms: u64,
    pub snapshots_enabled: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let sleeper_api_url = env_map
            .get("SLEEPER_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.sleeper.app/v1".to_string());

        let league_id = env_map
            .get("LEAGUE_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("LEAGUE_ID".to_string()))?;

        let max_taxi_size = parse_or(&env_map, "MAX_TAXI_SIZE", 3u32, "must be a valid u32")?;
        let max_taxi_qb = parse_or(&env_map, "MAX_TAXI_QB", 1u32, "must be a valid u32")?;

        let draft_rounds = match env_map.get("DRAFT_ROUNDS") {
            Some(s) => match s.trim().parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "DRAFT_ROUNDS".to_string(),
                        "must be a positive integer".to_string(),
                    ))
                }
            },
            None => None,
        };

        let league_history_depth =
            parse_or(&env_map, "LEAGUE_HISTORY_DEPTH", 3u32, "must be a valid u32")?;

        let schedule_utc_offset_minutes = parse_or(
            &env_map,
            "SCHEDULE_UTC_OFFSET_MINUTES",
            -300i32,
            "must be minutes east of UTC",
        )?;
        if ScheduleZone::new(schedule_utc_offset_minutes, false).is_none() {
            return Err(ConfigError::InvalidValue(
                "SCHEDULE_UTC_OFFSET_MINUTES".to_string(),
                "must be a valid UTC offset in minutes".to_string(),
            ));
        }

        let schedule_observe_us_dst = parse_bool(&env_map, "SCHEDULE_OBSERVE_US_DST", true)?;
        let run_tolerance_minutes =
            parse_or(&env_map, "RUN_TOLERANCE_MINUTES", 10u32, "must be a valid u32")?;

        let admin_secret = env_map
            .get("ADMIN_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let upstream_retry_max_ms =
            parse_or(&env_map, "UPSTREAM_RETRY_MAX_MS", 5000u64, "must be a valid u64")?;
        let snapshots_enabled = parse_bool(&env_map, "SNAPSHOTS_ENABLED", true)?;

        Ok(Config {
            port,
            database_path,
            sleeper_api_url,
            league_id,
            max_taxi_size,
            max_taxi_qb,
            draft_rounds,
            league_history_depth,
            schedule_utc_offset_minutes,
            schedule_observe_us_dst,
            run_tolerance_minutes,
            admin_secret,
            upstream_retry_max_ms,
            snapshots_enabled,
        })
    }

    pub fn taxi_rules(&self) -> TaxiRules {
        TaxiRules {
            max_taxi_size: self.max_taxi_size,
            max_taxi_qb: self.max_taxi_qb,
        }
    }

    pub fn run_schedule(&self) -> RunSchedule {
        let zone = ScheduleZone::new(
            self.schedule_utc_offset_minutes,
            self.schedule_observe_us_dst,
        )
        .unwrap_or_else(ScheduleZone::us_eastern);
        RunSchedule::league_default(
            zone,
            chrono::Duration::minutes(i64::from(self.run_tolerance_minutes)),
        )
    }
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    hint: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(s) => s
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), hint.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(
    env_map: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match env_map.get(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(s) => match s.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue(
                key.to_string(),
                format!("must be true or false, got {}", other),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("LEAGUE_ID".to_string(), "1048".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.sleeper_api_url, "https://api.sleeper.app/v1");
        assert_eq!(config.max_taxi_size, 3);
        assert_eq!(config.max_taxi_qb, 1);
        assert_eq!(config.draft_rounds, None);
        assert_eq!(config.schedule_utc_offset_minutes, -300);
        assert!(config.schedule_observe_us_dst);
        assert!(config.snapshots_enabled);
        assert_eq!(config.admin_secret, None);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_blank_league_id_is_missing() {
        let mut env_map = setup_required_env();
        env_map.insert("LEAGUE_ID".to_string(), "  ".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "LEAGUE_ID"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_draft_rounds_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("DRAFT_ROUNDS".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DRAFT_ROUNDS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("SCHEDULE_UTC_OFFSET_MINUTES".to_string(), "5000".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SCHEDULE_UTC_OFFSET_MINUTES"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_bool() {
        let mut env_map = setup_required_env();
        env_map.insert("SNAPSHOTS_ENABLED".to_string(), "maybe".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SNAPSHOTS_ENABLED"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_blank_admin_secret_disables_admin() {
        let mut env_map = setup_required_env();
        env_map.insert("ADMIN_SECRET".to_string(), "".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.admin_secret, None);
    }
}
