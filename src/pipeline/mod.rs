//! Pipeline entry points for monitor operations.
//!
//! - `Monitor::run_once`: one fetch → extract → notify → persist cycle
//! - `run_forever`: repeat cycles on a fixed interval

pub mod check;
pub mod schedule;

pub use check::{CheckOutcome, Monitor};
pub use schedule::{run_every, run_forever};
