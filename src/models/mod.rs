// src/models/mod.rs

//! Domain models for the job monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod posting;
mod seen;
mod source;

// Re-export all public types
pub use config::{
    Config, DeliveryPolicy, ENV_BOT_TOKEN, ENV_CHAT_ID, ENV_CHECK_INTERVAL, ExtractionConfig,
    NotifierConfig, ScraperConfig,
};
pub use posting::{Posting, posting_id};
pub use seen::SeenSet;
pub use source::Source;
