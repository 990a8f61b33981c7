use crate::error::{Error, Result};
use crate::groq::{DEFAULT_MODEL, GROQ_CHAT_URL};
use crate::risk::DEFAULT_MISSING_UPDATE_THRESHOLD_DAYS;
use chrono::NaiveTime;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Ten years; anything longer is a typo.
pub const MAX_MISSING_UPDATE_THRESHOLD_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub slack_webhook_url: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_api_url: String,
    pub report_team_id: i32,
    /// Daily report time, UTC.
    pub report_time: NaiveTime,
    pub missing_update_threshold_days: i64,
    pub http_timeout: Duration,
}

impl Settings {
    /// Reads settings from the process environment (and `.env`).
    pub fn from_env() -> Result<Settings> {
        dotenv::dotenv().ok();
        Settings::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let report_time = match get("REPORT_TIME") {
            Some(t) => NaiveTime::parse_from_str(t.trim(), "%H:%M")
                .map_err(|e| Error::Config(format!("REPORT_TIME '{}': {}", t, e)))?,
            None => NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
        };

        let missing_update_threshold_days = parse(
            &get,
            "MISSING_UPDATE_THRESHOLD_DAYS",
            DEFAULT_MISSING_UPDATE_THRESHOLD_DAYS,
        )?;
        if !(1..=MAX_MISSING_UPDATE_THRESHOLD_DAYS).contains(&missing_update_threshold_days) {
            return Err(Error::Config(format!(
                "MISSING_UPDATE_THRESHOLD_DAYS must be between 1 and {}, got {}",
                MAX_MISSING_UPDATE_THRESHOLD_DAYS, missing_update_threshold_days
            )));
        }

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "standup.db".to_string()),
            port: parse(&get, "PORT", 8000)?,
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            groq_api_key: get("GROQ_API_KEY"),
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            groq_api_url: get("GROQ_API_URL").unwrap_or_else(|| GROQ_CHAT_URL.to_string()),
            report_team_id: parse(&get, "REPORT_TEAM_ID", 1)?,
            report_time,
            missing_update_threshold_days,
            http_timeout: Duration::from_secs(parse(&get, "HTTP_TIMEOUT_SECS", 10)?),
        })
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} '{}': {}", key, value, e))),
        None => Ok(default),
    }
}
