//! Service layer for the job monitor.
//!
//! This module contains the business logic for:
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Posting extraction (`JobExtractor`)
//! - Extraction patterns (`PatternSet`)
//! - Notification delivery (`Notifier`, `TelegramNotifier`)

mod extractor;
mod fetcher;
mod notifier;
pub mod patterns;

pub use extractor::JobExtractor;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{DESCRIPTION_LIMIT, Notifier, TelegramNotifier, format_posting_message};
pub use patterns::PatternSet;
