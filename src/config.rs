use std::{env, path::PathBuf, str::FromStr, time::Duration};

use log::{debug, error, info};

use crate::error::{BotError, Result};

const DEFAULT_LUIS_SLOT: &str = "production";
const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct LuisConfig {
    pub endpoint: String,
    pub app_id: String,
    pub api_key: String,
    pub slot: String,
    pub timeout: Duration,
    pub min_confidence: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub luis: LuisConfig,
    pub media_library_path: Option<PathBuf>,
    pub welcome_state_path: Option<PathBuf>,
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|e| {
        error!("Failed to load {name} from environment: {e}");
        BotError::EnvVar(e)
    })
}

fn optional(name: &str) -> Option<String> {
    non_empty(env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match non_empty(raw) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{name} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

fn classifier_timeout(raw: Option<String>) -> Result<Duration> {
    let secs = parse_or(
        "CLASSIFIER_TIMEOUT_SECS",
        raw,
        DEFAULT_CLASSIFIER_TIMEOUT_SECS,
    )?;
    if secs == 0 {
        return Err(BotError::Config(
            "CLASSIFIER_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn min_confidence(raw: Option<String>) -> Result<f64> {
    let value = parse_or("INTENT_MIN_CONFIDENCE", raw, 0.0_f64)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(BotError::Config(format!(
            "INTENT_MIN_CONFIDENCE must be between 0 and 1, got {value}"
        )));
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let discord_token = required("DISCORD_TOKEN")?;
        let endpoint = required("LUIS_ENDPOINT")?;
        let app_id = required("LUIS_APP_ID")?;
        let api_key = required("LUIS_API_KEY")?;
        let slot = optional("LUIS_SLOT").unwrap_or_else(|| DEFAULT_LUIS_SLOT.to_string());

        let timeout = classifier_timeout(optional("CLASSIFIER_TIMEOUT_SECS"))?;
        let min_confidence = min_confidence(optional("INTENT_MIN_CONFIDENCE"))?;

        let media_library_path = optional("MEDIA_LIBRARY_PATH").map(PathBuf::from);
        let welcome_state_path = optional("WELCOME_STATE_PATH").map(PathBuf::from);

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("LUIS endpoint: {endpoint}, app: {app_id}, slot: {slot}");
        debug!("LUIS API key length: {} characters", api_key.len());
        debug!("Classifier timeout: {timeout:?}, min confidence: {min_confidence}");
        debug!("Media library: {media_library_path:?}");
        debug!("Welcome state: {welcome_state_path:?}");

        Ok(Self {
            discord_token,
            luis: LuisConfig {
                endpoint,
                app_id,
                api_key,
                slot,
                timeout,
                min_confidence,
            },
            media_library_path,
            welcome_state_path,
        })
    }
}
