/// Symbol state definitions for tracking a scrape pass
///
/// This module defines all possible states a symbol can be in while the fetch
/// scheduler works through a batch.
use std::fmt;

/// Represents the current state of a symbol in the scrape process
///
/// There is no retry state: `Failed` is terminal for the run, and a later pass
/// re-attempts the symbol only if it is still missing from the raw page store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolState {
    // ===== Active States =====
    /// Symbol is queued and waiting for a dispatch slot
    Pending,

    /// Symbol's page is currently being fetched
    InFlight,

    // ===== Terminal States =====
    /// Page body was fetched and handed to the sink
    Delivered,

    /// Fetch failed, or the result could not be handed off
    Failed,
}

impl SymbolState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Returns true if this is an active state (symbol may still be processed)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: SymbolState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Delivered)
                | (Self::InFlight, Self::Failed)
        )
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible symbol states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Pending, Self::InFlight, Self::Delivered, Self::Failed]
    }
}

impl fmt::Display for SymbolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
