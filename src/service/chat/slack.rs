//! Slack socket-mode implementation of the chat service.
//!
//! Plain user messages sent to the bot become dialog turns. Edits, joins, bot
//! messages and thread replies are ignored. The Slack channel ID is used as the
//! conversation ID, so a direct-message channel holds one user's assessment.

use crate::{
    assessment::Assessment,
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{
        self,
        gate::TurnGate,
        turn::IncomingTurn,
    },
    service::{db::DbClient, nlu::IntentClassifier},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, db: DbClient, nlu: IntentClassifier, assessment: Assessment) -> Res<Self> {
        let client = SlackChatClient::new(config, db, nlu, assessment).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    db: DbClient,
    nlu: IntentClassifier,
    chat: ChatClient,
    assessment: Assessment,
    gate: TurnGate,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    bot_user_id: String,
    client: Arc<FullClient>,
    db: DbClient,
    nlu: IntentClassifier,
    assessment: Assessment,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, db: DbClient, nlu: IntentClassifier, assessment: Assessment) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            db,
            nlu,
            assessment,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            db: self.db.clone(),
            nlu: self.nlu.clone(),
            chat: ChatClient::from(self.clone()),
            assessment: self.assessment.clone(),
            gate: TurnGate::new(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, conversation_id: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(conversation_id.to_string()), message);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn user_name(&self, user_id: &str) -> Res<Option<String>> {
        let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));
        let session = self.client.open_session(&self.bot_token);

        let response = session.users_info(&request).await.map_err(|e| anyhow::anyhow!("Failed to get user info: {}", e))?;
        let user = response.user;

        // Prefer the name the user chose to display.
        let display_name = user.profile.as_ref().and_then(|p| p.display_name.clone()).filter(|n| !n.trim().is_empty());

        Ok(display_name.or(user.name))
    }
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    match event {
        SlackEventCallbackBody::Message(slack_message_event) => {
            let Some(turn) = turn_from_message(&slack_message_event, user_state.chat.bot_user_id()) else {
                debug!("Skipping message event that is not a plain user message.");
                return Ok(());
            };

            info!("Received message event ...");

            interaction::turn::handle_turn(
                turn,
                user_state.db.clone(),
                user_state.nlu.clone(),
                user_state.chat.clone(),
                user_state.assessment.clone(),
                user_state.gate.clone(),
            );
        }
        _ => {
            warn!("Received unhandled push event.")
        }
    }

    Ok(())
}

/// Extracts a turn from a message event, or `None` if the message should not advance the dialog.
fn turn_from_message(event: &SlackMessageEvent, bot_user_id: &str) -> Option<IncomingTurn> {
    // Edits, deletions, joins, and so on.
    if event.subtype.is_some() {
        return None;
    }

    if event.sender.bot_id.is_some() {
        return None;
    }

    // The dialog lives at the top level of the conversation.
    if event.origin.thread_ts.is_some() {
        return None;
    }

    let user_id = event.sender.user.as_ref()?.0.clone();
    if user_id == bot_user_id {
        return None;
    }

    let conversation_id = event.origin.channel.as_ref()?.0.clone();
    let text = event.content.as_ref().and_then(|c| c.text.clone()).unwrap_or_default();

    if text.trim().is_empty() {
        return None;
    }

    Some(IncomingTurn { conversation_id, user_id, text })
}

// Tests.
