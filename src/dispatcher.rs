//! Turn handling: routes one inbound event to the reply it deserves.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::{BotError, Result};
use crate::media_library::{MediaLibrary, RandomSource, video_card};
use crate::onboarding::{is_greeting, onboarding_messages};
use crate::transport::Transport;
use crate::types::{ConversationEvent, EventKind, Identity, Intent, OutboundMessage};
use crate::welcome::WelcomeStore;

/// Text sent ahead of every media suggestion.
pub const ACKNOWLEDGMENT: &str = "Hmm, I think I know what you need! Try this one:";

/// What a handled turn ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    MediaSuggested { url: String },
    Onboarded { recipients: Vec<String> },
    Ignored,
}

pub struct TurnDispatcher {
    classifier: Arc<dyn Classifier>,
    library: MediaLibrary,
    random: Arc<dyn RandomSource>,
    welcome: Option<Arc<dyn WelcomeStore>>,
}

impl TurnDispatcher {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        library: MediaLibrary,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            classifier,
            library,
            random,
            welcome: None,
        }
    }

    #[must_use]
    pub fn with_welcome_store(mut self, store: Arc<dyn WelcomeStore>) -> Self {
        self.welcome = Some(store);
        self
    }

    /// Handle one inbound event, sending zero or more replies through `transport`.
    ///
    /// # Errors
    ///
    /// - `MalformedEvent` if a message event has no body
    /// - `ClassificationUnavailable` if the classifier call fails
    /// - `NoMediaForSentiment` if the library has nothing for the returned sentiment
    pub async fn handle_turn(
        &self,
        event: &ConversationEvent,
        transport: &dyn Transport,
    ) -> Result<TurnOutcome> {
        match event.kind {
            EventKind::Message => self.handle_message(event, transport).await,
            EventKind::ParticipantsChanged => {
                self.handle_participants_changed(event, transport).await
            }
            EventKind::Other => {
                debug!("Ignoring non-message event from {}", event.sender.id);
                Ok(TurnOutcome::Ignored)
            }
        }
    }

    async fn handle_message(
        &self,
        event: &ConversationEvent,
        transport: &dyn Transport,
    ) -> Result<TurnOutcome> {
        let body = event.body.as_deref().ok_or_else(|| {
            BotError::MalformedEvent(format!("message from {} has no body", event.sender.id))
        })?;

        let classification = self.classifier.classify(body).await?;
        debug!(
            "Classified message from {}: intent={} sentiment={}",
            event.sender.id, classification.intent, classification.sentiment
        );

        match classification.intent {
            Intent::Named(_) => {
                let url = self
                    .library
                    .select(&classification.sentiment, self.random.as_ref())?
                    .to_string();

                send(transport, OutboundMessage::Text(ACKNOWLEDGMENT.to_string())).await;
                send(transport, OutboundMessage::Video(video_card(&url))).await;

                info!(
                    "Suggested {url} to {} for sentiment {}",
                    event.sender.id, classification.sentiment
                );
                Ok(TurnOutcome::MediaSuggested { url })
            }
            Intent::None if is_greeting(body) => {
                self.onboard(&event.sender, transport).await;
                Ok(TurnOutcome::Onboarded {
                    recipients: vec![event.sender.id.clone()],
                })
            }
            Intent::None => {
                debug!("No intent and no greeting from {}, staying quiet", event.sender.id);
                Ok(TurnOutcome::Ignored)
            }
        }
    }

    async fn handle_participants_changed(
        &self,
        event: &ConversationEvent,
        transport: &dyn Transport,
    ) -> Result<TurnOutcome> {
        let mut recipients = Vec::new();
        for member in event
            .joined
            .iter()
            .filter(|member| member.id != event.recipient.id)
        {
            self.onboard(member, transport).await;
            recipients.push(member.id.clone());
        }

        if recipients.is_empty() {
            debug!("No new participants to welcome");
            return Ok(TurnOutcome::Ignored);
        }
        Ok(TurnOutcome::Onboarded { recipients })
    }

    async fn onboard(&self, user: &Identity, transport: &dyn Transport) {
        if let Some(store) = &self.welcome {
            match store.is_welcomed(&user.id).await {
                Ok(welcomed) => debug!("User {} previously welcomed: {welcomed}", user.id),
                Err(e) => warn!("Failed to read welcome state for {}: {e}", user.id),
            }
        }

        for message in onboarding_messages(user) {
            send(transport, message).await;
        }
        info!("Sent onboarding to {}", user.id);

        if let Some(store) = &self.welcome
            && let Err(e) = store.mark_welcomed(&user.id).await
        {
            warn!("Failed to record welcome state for {}: {e}", user.id);
        }
    }
}

/// Best-effort send: failures are logged and the turn carries on.
async fn send(transport: &dyn Transport, message: OutboundMessage) {
    if let Err(e) = transport.send(message).await {
        warn!("Failed to send reply: {e}");
    }
}
