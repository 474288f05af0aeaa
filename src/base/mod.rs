//! Core components, types, and utilities for the bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - System prompts, fixed localized strings, and prompt assembly.
//! - Reply post-processing.
//! - Common types and result handling.

pub mod config;
pub mod format;
pub mod prompts;
pub mod types;
