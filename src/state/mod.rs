//! State module for tracking scrape progress
//!
//! This module provides the per-symbol lifecycle used by the fetch scheduler
//! and the pacing state that enforces the inter-dispatch delay.
//!
//! # Components
//!
//! - `SymbolState`: Tracks one symbol through `Pending → InFlight → {Delivered, Failed}`
//! - `DispatchState`: Tracks dispatch count and timing for rate limiting

mod dispatch_state;
mod symbol_state;

// Re-export main types
pub use dispatch_state::DispatchState;
pub use symbol_state::SymbolState;
