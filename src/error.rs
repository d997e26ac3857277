//! Errors raised while building a level or loading configuration
//!
//! The simulation tick itself never fails; everything fallible happens
//! before the first tick.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Level layouts must place exactly one player
    #[error("level {world}-{stage} has no player spawn")]
    MissingPlayerSpawn { world: u32, stage: u32 },

    /// A pipe names a connection that is not a pipe in the same level
    #[error("pipe '{pipe}' is connected to unknown pipe '{connection}'")]
    UnknownPipeConnection { pipe: String, connection: String },

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
