//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the lifecycle of a single URL within one run

mod page_state;

// Re-export main types
pub use page_state::PageState;
