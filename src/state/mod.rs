//! State module for crawl results and run lifecycle
//!
//! # Components
//!
//! - `Page`: An admitted page and the page that referred to it
//! - `RunState`: Lifecycle of one crawl run (running, draining, done)
//! - `CompletionReason`: Why a run stopped accepting work

mod page;
mod run_state;

// Re-export main types
pub use page::Page;
pub use run_state::{CompletionReason, RunState};
