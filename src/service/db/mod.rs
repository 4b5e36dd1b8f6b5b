//! Conversation state storage.
//!
//! Each conversation owns one [`ConversationState`]: the user's profile and,
//! while an assessment is running, the dialog position. It is loaded at the
//! start of a turn and written back at the end.

pub mod surreal;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    assessment::{DialogState, UserProfile},
    base::types::{Res, Void},
};

// Types.

/// Everything persisted for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub dialog: Option<DialogState>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the core functionality for storing and retrieving
/// conversation state. Implementing this trait allows different database
/// backends to be used with the lifeline-bot.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the conversation state by its ID; or, a default state if it doesn't exist.
    ///
    /// Nothing is written for a conversation until it is first saved.
    async fn get_or_create_conversation(&self, conversation_id: &str) -> Res<ConversationState>;

    /// Writes the conversation state, replacing whatever was stored.
    async fn save_conversation(&self, conversation_id: &str, state: &ConversationState) -> Void;
}

// Structs.

/// Database client for lifeline-bot.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}
