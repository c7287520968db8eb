use thiserror::Error;

/// Errors that can stop a session from starting or a store write from landing.
///
/// Placement exhaustion and unrecognized quest types are not errors: the
/// generator returns fewer entities or a fallback spawn, and a quest it
/// cannot evaluate never completes.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around IO errors (feed file, file-backed store).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON encoding and decoding errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The NPC feed parsed but held no records.
    #[error("npc feed is empty")]
    EmptyFeed,

    /// Two feed records share an id.
    #[error("duplicate npc id: {0}")]
    DuplicateNpc(String),

    /// A feed record does not resolve to a usable NPC.
    #[error("invalid npc record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    /// A new game was requested while one is still running.
    #[error("a session is already running")]
    SessionRunning,
}
