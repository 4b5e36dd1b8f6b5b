//! SurrealDB implementation for lifeline-bot data storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    RecordId, Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tracing::{debug, info, instrument};

use crate::{
    assessment::{DialogState, UserProfile},
    base::{
        config::Config,
        types::{Res, Void},
    },
};

use super::{ConversationState, DbClient, GenericDbClient};

const CONVERSATION_TABLE: &str = "conversation";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the database configured by `db_endpoint`.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let credentials = if config.db_username.is_empty() { None } else { Some((config.db_username.as_str(), config.db_password.as_str())) };

        let client = SurrealDbClient::connect(&config.db_endpoint, credentials, &config.db_namespace, &config.db_database).await?;

        Ok(Self::new(Arc::new(client)))
    }

    /// Creates a fresh in-memory database.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::connect("mem://", None, "lifeline", "bot").await?;

        Ok(Self::new(Arc::new(client)))
    }
}

// Records.

/// A conversation record in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurrealConversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    #[serde(default)]
    profile: UserProfile,
    #[serde(default)]
    dialog: Option<DialogState>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<SurrealConversation> for ConversationState {
    fn from(record: SurrealConversation) -> Self {
        Self {
            profile: record.profile,
            dialog: record.dialog,
            updated_at: record.updated_at,
        }
    }
}

// Specific implementations.

/// SurrealDB client implementation.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connects to `endpoint` (`mem://`, `ws://…`, `wss://…`) and prepares the schema.
    #[instrument(name = "SurrealDbClient::connect", skip(credentials))]
    pub async fn connect(endpoint: &str, credentials: Option<(&str, &str)>, namespace: &str, database: &str) -> Res<Self> {
        let db = connect(endpoint).await?;

        // Authenticate with the database using the provided username and password.
        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        // Define schemas.

        db.query(format!("DEFINE TABLE IF NOT EXISTS {CONVERSATION_TABLE} SCHEMALESS;")).await?.check()?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_or_create_conversation(&self, conversation_id: &str) -> Res<ConversationState> {
        let record: Option<SurrealConversation> = self.db.select((CONVERSATION_TABLE, conversation_id)).await?;

        match record {
            Some(record) => {
                debug!("Conversation `{}` found.", conversation_id);
                Ok(record.into())
            }
            None => {
                info!("Conversation `{}` not found, starting a new one.", conversation_id);
                Ok(ConversationState::default())
            }
        }
    }

    #[instrument(skip(self, state))]
    async fn save_conversation(&self, conversation_id: &str, state: &ConversationState) -> Void {
        let record = SurrealConversation {
            id: None,
            profile: state.profile.clone(),
            dialog: state.dialog.clone(),
            updated_at: Some(Utc::now()),
        };

        let _: Option<SurrealConversation> = self.db.upsert((CONVERSATION_TABLE, conversation_id)).content(record).await?;

        debug!("Conversation `{}` saved.", conversation_id);

        Ok(())
    }
}

// Tests.
