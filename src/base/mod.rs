//! Core components, types, and utilities for the lifeline-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - User-facing messages and the classifier directive.
//! - Common types and result handling.

pub mod config;
pub mod prompts;
pub mod types;
