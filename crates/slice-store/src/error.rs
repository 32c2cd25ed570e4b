//! Error types surfaced by the store

use thiserror::Error;

use crate::store::DispatchPhase;

/// Errors that can occur while dispatching or configuring a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A dispatch was started from a reducer, selector or listener
    #[error("cannot dispatch while the store is {phase}")]
    DispatchInProgress { phase: DispatchPhase },

    /// An effect callback failed; remaining effects of that cycle were skipped
    #[error("effect for action `{action_type}` failed: {source}")]
    Effect {
        action_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid store config: {0}")]
    Config(#[from] toml::de::Error),
}
