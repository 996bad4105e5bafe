//! Discord adapter: maps gateway events to conversation turns and renders replies.

use std::{error::Error as StdError, str::FromStr, sync::Arc};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use poise::{
    Framework, FrameworkOptions,
    serenity_prelude::{
        ButtonStyle, ChannelId, ClientBuilder, Context, CreateActionRow, CreateButton,
        CreateEmbed, CreateInteractionResponse, CreateMessage, FullEvent, GatewayIntents, Http,
        Interaction, Mentionable, User, UserId,
    },
};

use crate::classifier::LuisClassifier;
use crate::config::Config;
use crate::dispatcher::TurnDispatcher;
use crate::error::{BotError, Result};
use crate::media_library::{MediaLibrary, ThreadRandom};
use crate::transport::Transport;
use crate::types::{ConversationEvent, Identity, Mood, OutboundMessage, VideoCard};
use crate::welcome::{InMemoryWelcomeStore, JsonFileWelcomeStore, WelcomeStore};

type EventResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

const MOOD_BUTTON_PREFIX: &str = "mood:";

pub struct Data {
    dispatcher: Arc<TurnDispatcher>,
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing LUIS classifier");
    let classifier = Arc::new(LuisClassifier::new(&config.luis)?);

    let library = match &config.media_library_path {
        Some(path) => MediaLibrary::from_json_file(path).await?,
        None => {
            info!("Using built-in media library");
            MediaLibrary::builtin()
        }
    };

    let welcome: Arc<dyn WelcomeStore> = match &config.welcome_state_path {
        Some(path) => Arc::new(JsonFileWelcomeStore::open(path).await?),
        None => {
            debug!("Keeping welcome state in memory");
            Arc::new(InMemoryWelcomeStore::new())
        }
    };

    let dispatcher = Arc::new(
        TurnDispatcher::new(classifier, library, Arc::new(ThreadRandom))
            .with_welcome_store(welcome),
    );

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |_ctx, _ready, _framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord");
                Ok(Data { dispatcher })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}

/// Replies for one turn go to the channel the turn came from.
pub struct DiscordTransport {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordTransport {
    #[must_use]
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Transport for DiscordTransport {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let builder = match message {
            OutboundMessage::Text(text) => CreateMessage::new().content(text),
            OutboundMessage::Video(card) => video_message(card),
            OutboundMessage::Animation { url, caption } => {
                CreateMessage::new().embed(CreateEmbed::new().title(caption).image(url))
            }
            OutboundMessage::SuggestedReplies { text, options } => {
                suggested_replies_message(text, &options)
            }
        };

        self.channel_id.send_message(&self.http, builder).await?;
        Ok(())
    }
}

fn video_message(card: VideoCard) -> CreateMessage {
    let mut embed = CreateEmbed::new()
        .title(card.title)
        .url(&card.video_url)
        .description(&card.video_url);
    if let Some(preview) = card.preview_image_url {
        embed = embed.image(preview);
    }

    let open = CreateButton::new_link(card.video_url).label(card.action_label);

    CreateMessage::new()
        .embed(embed)
        .components(vec![CreateActionRow::Buttons(vec![open])])
}

fn suggested_replies_message(text: String, options: &[Mood]) -> CreateMessage {
    let buttons = options
        .iter()
        .map(|mood| {
            CreateButton::new(format!("{MOOD_BUTTON_PREFIX}{mood}"))
                .label(mood.to_string())
                .style(ButtonStyle::Primary)
        })
        .collect();

    CreateMessage::new()
        .content(text)
        .components(vec![CreateActionRow::Buttons(buttons)])
}

fn identity_of(user: &User) -> Identity {
    let name = user.global_name.as_ref().unwrap_or(&user.name);
    Identity::new(user.id.to_string()).with_display_name(name.as_str())
}

/// Identity for a joiner welcomed in a shared channel: greeted by mention.
fn mentioned_identity(user_id: UserId) -> Identity {
    Identity::new(user_id.to_string()).with_display_name(user_id.mention().to_string())
}

/// Remove mentions of the bot so the classifier only sees what the user said.
fn strip_mention(content: &str, bot_id: UserId) -> String {
    content
        .replace(&format!("<@{bot_id}>"), "")
        .replace(&format!("<@!{bot_id}>"), "")
        .trim()
        .to_string()
}

fn mood_from_custom_id(custom_id: &str) -> Option<Mood> {
    custom_id
        .strip_prefix(MOOD_BUTTON_PREFIX)
        .and_then(|name| Mood::from_str(name).ok())
}

async fn run_turn(
    ctx: &Context,
    data: &Data,
    event: ConversationEvent,
    channel_id: ChannelId,
    reply_on_error: bool,
) -> EventResult {
    let transport = DiscordTransport::new(ctx.http.clone(), channel_id);

    match data.dispatcher.handle_turn(&event, &transport).await {
        Ok(outcome) => {
            debug!("Turn in channel {channel_id} finished: {outcome:?}");
        }
        Err(BotError::MalformedEvent(reason)) => {
            debug!("Dropped malformed event in channel {channel_id}: {reason}");
        }
        Err(e) => {
            error!(
                "Error handling {} event from {} in channel {}: {}",
                event.kind, event.sender.id, channel_id, e
            );
            if reply_on_error {
                channel_id.say(&ctx.http, e.user_message()).await?;
            }
        }
    }

    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> EventResult {
    let (bot_id, bot_identity) = {
        let me = ctx.cache.current_user();
        (me.id, identity_of(&me))
    };

    match event {
        FullEvent::Message { new_message } => {
            if new_message.author.bot
                || (new_message.guild_id.is_some() && !new_message.mentions_user_id(bot_id))
            {
                return Ok(());
            }

            info!(
                "Received message from {} in channel {}: {}",
                new_message.author.tag(),
                new_message.channel_id,
                new_message.content
            );

            if let Err(e) = new_message.channel_id.broadcast_typing(&ctx.http).await {
                debug!("Failed to broadcast typing indicator: {e}");
            }

            let text = strip_mention(&new_message.content, bot_id);
            let mut turn =
                ConversationEvent::message(identity_of(&new_message.author), bot_identity, text);
            if turn.body.as_deref().is_some_and(str::is_empty) {
                turn.body = None;
            }

            run_turn(ctx, data, turn, new_message.channel_id, true).await
        }
        FullEvent::GuildMemberAddition { new_member } => {
            let system_channel = ctx
                .cache
                .guild(new_member.guild_id)
                .and_then(|guild| guild.system_channel_id);
            let Some(channel_id) = system_channel else {
                warn!(
                    "Guild {} has no system channel, not welcoming {}",
                    new_member.guild_id,
                    new_member.user.tag()
                );
                return Ok(());
            };

            info!(
                "{} joined guild {}",
                new_member.user.tag(),
                new_member.guild_id
            );

            let joiner = mentioned_identity(new_member.user.id);
            let turn = ConversationEvent::participants_changed(
                joiner.clone(),
                bot_identity,
                vec![joiner],
            );
            run_turn(ctx, data, turn, channel_id, false).await
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } => {
            let Some(mood) = mood_from_custom_id(&component.data.custom_id) else {
                return Ok(());
            };

            component
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            info!("{} picked mood {mood}", component.user.tag());

            let turn = ConversationEvent::message(
                identity_of(&component.user),
                bot_identity,
                mood.to_string(),
            );
            run_turn(ctx, data, turn, component.channel_id, true).await
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_mention_forms() {
        let bot_id = UserId::new(42);
        assert_eq!(strip_mention("<@42> hello", bot_id), "hello");
        assert_eq!(strip_mention("hi <@!42>", bot_id), "hi");
        assert_eq!(strip_mention("<@7> hello", bot_id), "<@7> hello");
    }

    #[test]
    fn joiners_are_greeted_by_mention() {
        let joiner = mentioned_identity(UserId::new(42));
        assert_eq!(joiner.id, "42");

        let messages = crate::onboarding::onboarding_messages(&joiner);
        assert!(matches!(
            messages.last(),
            Some(OutboundMessage::SuggestedReplies { text, .. }) if text.starts_with("Hi <@42>!")
        ));
    }

    #[test]
    fn parses_mood_buttons() {
        assert_eq!(mood_from_custom_id("mood:Happy"), Some(Mood::Happy));
        assert_eq!(mood_from_custom_id("mood:splendid"), Some(Mood::Splendid));
        assert_eq!(mood_from_custom_id("mood:Bored"), None);
        assert_eq!(mood_from_custom_id("Happy"), None);
    }

    #[test]
    fn button_ids_round_trip_through_parser() {
        for mood in [Mood::Happy, Mood::Depressed, Mood::Angry, Mood::Splendid] {
            let id = format!("{MOOD_BUTTON_PREFIX}{mood}");
            assert_eq!(mood_from_custom_id(&id), Some(mood));
        }
    }
}
