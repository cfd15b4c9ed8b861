//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Frontier`: pending queue and visited set for a single site
//! - `FrontierState`: serializable snapshot of a frontier, stored in checkpoints
//! - `SitePhase`: per-site crawl state machine

mod frontier;
mod site_phase;

// Re-export main types
pub use frontier::{Frontier, FrontierState};
pub use site_phase::SitePhase;
