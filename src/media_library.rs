//! Sentiment-keyed media table and random video selection.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Mutex, PoisonError},
};

use log::{debug, info};
use rand::{SeedableRng, prelude::IndexedRandom, rngs::StdRng};
use url::Url;

use crate::error::{BotError, Result};
use crate::types::{Sentiment, VideoCard};

const CARD_TITLE: &str = "Here's a tune for your mood";
const CARD_ACTION_LABEL: &str = "Watch on YouTube";

/// Source of the random draw used for media selection.
pub trait RandomSource: Send + Sync {
    /// Pick one entry, or `None` if `options` is empty.
    fn choose<'a>(&self, options: &'a [String]) -> Option<&'a String>;
}

/// Thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn choose<'a>(&self, options: &'a [String]) -> Option<&'a String> {
        options.choose(&mut rand::rng())
    }
}

/// Seeded RNG; the same seed yields the same sequence of picks.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn choose<'a>(&self, options: &'a [String]) -> Option<&'a String> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        options.choose(&mut *rng)
    }
}

/// Mapping from sentiment label to candidate video URLs.
#[derive(Debug, Clone, Default)]
pub struct MediaLibrary {
    entries: HashMap<Sentiment, Vec<String>>,
}

impl MediaLibrary {
    #[must_use]
    pub fn new(entries: HashMap<Sentiment, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Built-in table covering the LUIS sentiment labels.
    #[must_use]
    pub fn builtin() -> Self {
        let table: [(&str, &[&str]); 3] = [
            (
                "positive",
                &[
                    "https://www.youtube.com/watch?v=ZbZSe6N_BXs",
                    "https://www.youtube.com/watch?v=y6Sxv-sUYtM",
                    "https://www.youtube.com/watch?v=ru0K8uYEZWw",
                    "https://www.youtube.com/watch?v=OPf0YbXqDm0",
                ],
            ),
            (
                "neutral",
                &[
                    "https://www.youtube.com/watch?v=hTWKbfoikeg",
                    "https://www.youtube.com/watch?v=fJ9rUzIMcZQ",
                    "https://www.youtube.com/watch?v=1w7OgIMMRc4",
                ],
            ),
            (
                "negative",
                &[
                    "https://www.youtube.com/watch?v=QJO3ROT-A4E",
                    "https://www.youtube.com/watch?v=YQHsXMglC9A",
                    "https://www.youtube.com/watch?v=d-diB65scQU",
                    "https://www.youtube.com/watch?v=ZbZSe6N_BXs",
                ],
            ),
        ];

        let entries = table
            .into_iter()
            .map(|(label, urls)| {
                (
                    Sentiment::new(label),
                    urls.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();

        Self { entries }
    }

    /// Load a table from a JSON object of `label -> [url, ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the table
    /// is empty, any label has no URLs, or two labels differ only in case.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let labelled: HashMap<String, Vec<String>> = serde_json::from_str(&raw)?;

        if labelled.is_empty() {
            return Err(BotError::Config(format!(
                "Media library {} has no sentiments",
                path.display()
            )));
        }

        let mut entries = HashMap::with_capacity(labelled.len());
        for (label, urls) in labelled {
            let sentiment = Sentiment::new(&label);
            if urls.is_empty() {
                return Err(BotError::Config(format!(
                    "Media library {} has no URLs for sentiment '{sentiment}'",
                    path.display()
                )));
            }
            if entries.insert(sentiment, urls).is_some() {
                return Err(BotError::Config(format!(
                    "Media library {} lists sentiment '{label}' more than once (labels ignore case)",
                    path.display()
                )));
            }
        }

        info!(
            "Loaded media library from {} ({} sentiments)",
            path.display(),
            entries.len()
        );
        Ok(Self { entries })
    }

    /// Select a video for a sentiment.
    ///
    /// # Errors
    ///
    /// Returns `NoMediaForSentiment` if the sentiment is missing or its list is empty.
    pub fn select<'a>(
        &'a self,
        sentiment: &Sentiment,
        random: &dyn RandomSource,
    ) -> Result<&'a str> {
        let url = self
            .entries
            .get(sentiment)
            .and_then(|urls| random.choose(urls))
            .ok_or_else(|| BotError::NoMediaForSentiment(sentiment.to_string()))?;
        debug!("Selected {url} for sentiment {sentiment}");
        Ok(url.as_str())
    }

}

/// Build the card for a selected video.
#[must_use]
pub fn video_card(video_url: &str) -> VideoCard {
    VideoCard {
        title: CARD_TITLE.to_string(),
        video_url: video_url.to_string(),
        preview_image_url: youtube_video_id(video_url)
            .map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg")),
        action_label: CARD_ACTION_LABEL.to_string(),
    }
}

fn youtube_video_id(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtube.com" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" => url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(ToString::to_string),
        _ => None,
    }?;

    (!id.is_empty()).then_some(id)
}
