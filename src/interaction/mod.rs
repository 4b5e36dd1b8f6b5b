//! Event handling and user interactions for lifeline-bot.
//!
//! This module turns incoming chat messages into dialog turns:
//! - Serializing turns per conversation
//! - Loading and persisting conversation state
//! - Coordinating the classifier, the dialog, and the chat replies

pub mod gate;
pub mod turn;
