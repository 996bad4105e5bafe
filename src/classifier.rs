//! Intent and sentiment classification through the LUIS prediction API.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::config::LuisConfig;
use crate::error::{BotError, Result};
use crate::types::{ClassificationResult, Intent, Sentiment};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const FALLBACK_SENTIMENT: &str = "neutral";

/// External intent/sentiment classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one utterance.
    ///
    /// # Errors
    ///
    /// Returns `ClassificationUnavailable` if the service call fails or times out.
    async fn classify(&self, utterance: &str) -> Result<ClassificationResult>;
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    prediction: Prediction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    top_intent: String,
    #[serde(default)]
    intents: HashMap<String, IntentScore>,
    sentiment: Option<SentimentScore>,
}

#[derive(Debug, Deserialize)]
struct IntentScore {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct SentimentScore {
    label: String,
}

pub struct LuisClassifier {
    client: reqwest::Client,
    predict_url: Url,
    api_key: String,
    min_confidence: f64,
}

impl LuisClassifier {
    /// Build a classifier for the configured LUIS app.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the endpoint is not a valid URL, or a
    /// `Reqwest` error if the HTTP client cannot be built.
    pub fn new(config: &LuisConfig) -> Result<Self> {
        let base = Url::parse(&format!("{}/", config.endpoint.trim_end_matches('/')))
            .map_err(|e| BotError::Config(format!("Invalid LUIS_ENDPOINT: {e}")))?;
        let predict_url = base
            .join(&format!(
                "luis/prediction/v3.0/apps/{}/slots/{}/predict",
                config.app_id, config.slot
            ))
            .map_err(|e| BotError::Config(format!("Invalid LUIS prediction URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            predict_url,
            api_key: config.api_key.clone(),
            min_confidence: config.min_confidence,
        })
    }

    async fn predict(&self, utterance: &str) -> std::result::Result<PredictionResponse, String> {
        let response = self
            .client
            .get(self.predict_url.clone())
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .query(&[("query", utterance), ("show-all-intents", "true")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(format!("{status}: {message}"));
        }

        response.json().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Classifier for LuisClassifier {
    async fn classify(&self, utterance: &str) -> Result<ClassificationResult> {
        debug!("Sending utterance to LUIS ({} characters)", utterance.len());

        let response = self
            .predict(utterance)
            .await
            .map_err(BotError::ClassificationUnavailable)?;

        let result = interpret(response.prediction, self.min_confidence);
        debug!(
            "LUIS result: intent={} confidence={:.3} sentiment={}",
            result.intent, result.confidence, result.sentiment
        );
        Ok(result)
    }
}

/// Turn a raw prediction into a result, demoting low-confidence intents to `None`.
fn interpret(prediction: Prediction, min_confidence: f64) -> ClassificationResult {
    let confidence = prediction
        .intents
        .get(&prediction.top_intent)
        .map_or(0.0, |intent| intent.score);

    let intent = match Intent::from_label(&prediction.top_intent) {
        Intent::Named(_) if confidence < min_confidence => Intent::None,
        intent => intent,
    };

    let sentiment = prediction
        .sentiment
        .map_or_else(|| Sentiment::new(FALLBACK_SENTIMENT), |s| Sentiment::new(s.label));

    ClassificationResult {
        intent,
        confidence,
        sentiment,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn build(config: &LuisConfig) -> Result<LuisClassifier> {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        LuisClassifier::new(config)
    }

    fn parse(body: &str) -> Prediction {
        serde_json::from_str::<PredictionResponse>(body)
            .unwrap()
            .prediction
    }

    const PLAY_MUSIC: &str = r#"{
        "query": "play me something",
        "prediction": {
            "topIntent": "PlayMusic",
            "intents": { "PlayMusic": { "score": 0.82 }, "None": { "score": 0.1 } },
            "entities": {},
            "sentiment": { "label": "positive", "score": 0.9 }
        }
    }"#;

    #[test]
    fn interprets_top_intent_and_sentiment() {
        let result = interpret(parse(PLAY_MUSIC), 0.0);
        assert_eq!(result.intent, Intent::Named("PlayMusic".to_string()));
        assert!((result.confidence - 0.82).abs() < f64::EPSILON);
        assert_eq!(result.sentiment, Sentiment::new("positive"));
    }

    #[test]
    fn low_confidence_becomes_none() {
        let result = interpret(parse(PLAY_MUSIC), 0.9);
        assert_eq!(result.intent, Intent::None);
    }

    #[test]
    fn none_sentinel_and_missing_sentiment() {
        let body = r#"{ "prediction": { "topIntent": "None", "intents": { "None": { "score": 0.7 } } } }"#;
        let result = interpret(parse(body), 0.0);
        assert_eq!(result.intent, Intent::None);
        assert_eq!(result.sentiment, Sentiment::new("neutral"));
    }

    #[test]
    fn builds_prediction_url() {
        let config = LuisConfig {
            endpoint: "https://westus.api.cognitive.microsoft.com/".to_string(),
            app_id: "app-123".to_string(),
            api_key: "key".to_string(),
            slot: "staging".to_string(),
            timeout: Duration::from_secs(5),
            min_confidence: 0.0,
        };
        let classifier = build(&config).unwrap();
        assert_eq!(
            classifier.predict_url.as_str(),
            "https://westus.api.cognitive.microsoft.com/luis/prediction/v3.0/apps/app-123/slots/staging/predict"
        );
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = LuisConfig {
            endpoint: "not a url".to_string(),
            app_id: "app".to_string(),
            api_key: "key".to_string(),
            slot: "production".to_string(),
            timeout: Duration::from_secs(5),
            min_confidence: 0.0,
        };
        assert!(matches!(
            build(&config),
            Err(BotError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let config = LuisConfig {
            endpoint: "http://127.0.0.1:9/".to_string(),
            app_id: "app".to_string(),
            api_key: "key".to_string(),
            slot: "production".to_string(),
            timeout: Duration::from_secs(2),
            min_confidence: 0.0,
        };
        let classifier = build(&config).unwrap();
        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, BotError::ClassificationUnavailable(_)));
    }
}
