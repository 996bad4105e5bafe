use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Classification service unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("No media configured for sentiment '{0}'")]
    NoMediaForSentiment(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for displaying in Discord
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::Serenity(_) => {
                "Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::ClassificationUnavailable(_) => {
                "Sorry, I couldn't figure out your mood right now. Please try again in a moment.".to_string()
            }
            BotError::NoMediaForSentiment(_) => {
                "Sorry, I don't have any tunes for that mood yet. Please contact the bot administrator.".to_string()
            }
            BotError::MalformedEvent(_) => {
                "Sorry, I couldn't read that message. Please try sending some text.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::Json(_) | BotError::Io(_) => {
                "Sorry, something went wrong on my end. Please try again later.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
