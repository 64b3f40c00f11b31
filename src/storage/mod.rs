//! Storage abstractions for the seen-posting set.
//!
//! The set is read once when the monitor starts and written once at the end
//! of every check cycle.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! └── seen_jobs.json        # Flat JSON array of posting identifiers
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeenSet;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for seen-set storage backends.
#[async_trait]
pub trait SeenStorage: Send + Sync {
    /// Load the full seen set. A store that was never written is empty.
    async fn load_seen(&self) -> Result<SeenSet>;

    /// Replace the stored set with `seen`.
    async fn save_seen(&self, seen: &SeenSet) -> Result<()>;
}
