/// Core error type for the relay bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// handle failures consistently. Expected per-operation outcomes (already
/// blocked, nothing to cancel, unknown user) are not errors; they are
/// variants on the operation's result type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
