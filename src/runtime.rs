//! Runtime services and shared state for the lifeline-bot.

use tracing::instrument;

use crate::{
    assessment::Assessment,
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{chat::ChatClient, db::DbClient, nlu::IntentClassifier},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the database client, intent classifier, chat client,
/// dialog engine, and configuration. It is designed to be trivially
/// cloneable, allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The intent classifier instance.
    pub nlu: IntentClassifier,
    /// The chat client instance.
    pub chat: ChatClient,
    /// The dialog engine.
    pub assessment: Assessment,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the intent classifier.
        let nlu = IntentClassifier::openai(&config);

        // Initialize the dialog engine.
        let assessment = Assessment::from_config(&config);

        // Initialize the chat client.
        let chat = ChatClient::slack(&config, db.clone(), nlu.clone(), assessment.clone()).await?;

        Ok(Self { config, db, nlu, chat, assessment })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
