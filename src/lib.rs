//! Library root for `lifeline-bot`.
//!
//! Lifeline-bot is a Slack counseling bot for young people. It walks a user
//! through a short screening dialog:
//! - Asks for consent, then asks about mood, relationships, loneliness, and
//!   thoughts of suicide
//! - Scores each answer with an intent classifier
//! - Refers the user to a crisis line immediately when danger is detected
//! - Closes with a high-risk or low-risk message
//!
//! The bot integrates with Slack for chat, SurrealDB for conversation state,
//! and OpenAI for intent classification. Each service sits behind a trait so
//! that other implementations can be swapped in.

pub mod assessment;
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the lifeline-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database, classifier, and chat clients
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting lifeline-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
