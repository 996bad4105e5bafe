//! The fixed welcome sequence shown to new or greeting users.

use strum::VariantArray;

use crate::types::{Identity, Mood, OutboundMessage};

pub const WELCOME_CAPTION: &str = "Welcome to Moody Tunes";

pub const WELCOME_ANIMATION_URL: &str =
    "https://media.giphy.com/media/tqfS3mgQU28ko/giphy.gif";

/// Greeting texts that trigger onboarding when no intent was recognized.
const GREETINGS: [&str; 2] = ["hi", "hello"];

/// Returns true if the text is a bare greeting (case-insensitive, trimmed).
#[must_use]
pub fn is_greeting(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// Build the onboarding messages for one user, in send order.
#[must_use]
pub fn onboarding_messages(user: &Identity) -> Vec<OutboundMessage> {
    let greeting = match user.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("Hi {name}! How are you feeling today?"),
        _ => "Hi there! How are you feeling today?".to_string(),
    };

    vec![
        OutboundMessage::Animation {
            url: WELCOME_ANIMATION_URL.to_string(),
            caption: WELCOME_CAPTION.to_string(),
        },
        OutboundMessage::SuggestedReplies {
            text: greeting,
            options: Mood::VARIANTS.to_vec(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_are_normalized() {
        assert!(is_greeting("Hello"));
        assert!(is_greeting("  hi  "));
        assert!(is_greeting("HI"));
        assert!(!is_greeting("hi there"));
        assert!(!is_greeting("hey"));
        assert!(!is_greeting(""));
    }

    #[test]
    fn onboarding_uses_display_name() {
        let messages = onboarding_messages(&Identity::new("1").with_display_name("Alice"));
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            OutboundMessage::Animation {
                url: WELCOME_ANIMATION_URL.to_string(),
                caption: "Welcome to Moody Tunes".to_string(),
            }
        );
        match &messages[1] {
            OutboundMessage::SuggestedReplies { text, options } => {
                assert!(text.contains("Alice"));
                assert_eq!(
                    options,
                    &[Mood::Happy, Mood::Depressed, Mood::Angry, Mood::Splendid]
                );
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn onboarding_without_name() {
        let messages = onboarding_messages(&Identity::new("1"));
        assert!(matches!(
            &messages[1],
            OutboundMessage::SuggestedReplies { text, .. } if text.starts_with("Hi there!")
        ));
    }
}
