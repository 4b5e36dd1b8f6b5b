//! Chat service integration for lifeline-bot.
//!
//! This module provides functionality for interacting with chat platforms like Slack:
//! - Receiving user messages and turning them into dialog turns
//! - Sending replies in order
//! - Looking up user display names
//!
//! It defines the `GenericChatClient` trait that can be implemented for different
//! chat services, with a default implementation for Slack.

pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the bot user ID.
    ///
    /// Used to ignore the bot's own messages.
    fn bot_user_id(&self) -> &str;

    /// Start the chat client listener.
    ///
    /// This sets up event listeners for the chat platform and begins processing
    /// incoming messages as turns.
    async fn start(&self) -> Void;

    /// Send a message to a conversation.
    ///
    /// Messages sent by one caller arrive in the order they were sent.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Void;

    /// Look up the display name of a user, if the platform knows one.
    async fn user_name(&self, user_id: &str) -> Res<Option<String>>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
