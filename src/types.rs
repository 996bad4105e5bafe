//! Common types used throughout the moodytunes bot.

use std::fmt;

use strum::{Display, EnumString, VariantArray};

/// Label the classifier uses when it has no confident intent.
pub const NO_INTENT_LABEL: &str = "None";

/// A participant in a conversation, as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Kind of an inbound conversation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EventKind {
    /// A user sent a message
    Message,
    /// New participants joined the conversation
    ParticipantsChanged,
    /// Any other channel signal
    Other,
}

/// One inbound event in a conversation.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub kind: EventKind,
    /// Free text, only meaningful for `Message` events
    pub body: Option<String>,
    pub sender: Identity,
    /// The bot itself on inbound events
    pub recipient: Identity,
    /// Only meaningful for `ParticipantsChanged` events
    pub joined: Vec<Identity>,
}

impl ConversationEvent {
    pub fn message(sender: Identity, recipient: Identity, body: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            body: Some(body.into()),
            sender,
            recipient,
            joined: Vec::new(),
        }
    }

    pub fn participants_changed(
        sender: Identity,
        recipient: Identity,
        joined: Vec<Identity>,
    ) -> Self {
        Self {
            kind: EventKind::ParticipantsChanged,
            body: None,
            sender,
            recipient,
            joined,
        }
    }

    pub fn other(sender: Identity, recipient: Identity) -> Self {
        Self {
            kind: EventKind::Other,
            body: None,
            sender,
            recipient,
            joined: Vec::new(),
        }
    }
}

/// The classifier's best guess at the user's goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Low confidence or no match
    None,
    Named(String),
}

impl Intent {
    /// Map a wire label to an intent, treating the `"None"` sentinel as no intent.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == NO_INTENT_LABEL {
            Intent::None
        } else {
            Intent::Named(label.to_string())
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::None => f.write_str(NO_INTENT_LABEL),
            Intent::Named(name) => f.write_str(name),
        }
    }
}

/// Mood label returned by the classifier; keys the media library.
///
/// Labels are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sentiment(String);

impl Sentiment {
    pub fn new(label: impl AsRef<str>) -> Self {
        Sentiment(label.as_ref().trim().to_lowercase())
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of one classifier call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub sentiment: Sentiment,
}

/// Mood options offered as suggested replies during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantArray)]
#[strum(ascii_case_insensitive)]
pub enum Mood {
    Happy,
    Depressed,
    Angry,
    Splendid,
}

/// A renderable video suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    pub title: String,
    pub video_url: String,
    pub preview_image_url: Option<String>,
    pub action_label: String,
}

/// A reply handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Video(VideoCard),
    Animation { url: String, caption: String },
    SuggestedReplies { text: String, options: Vec<Mood> },
}
