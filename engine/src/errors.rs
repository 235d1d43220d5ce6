use thiserror::Error;

/// Problems turning maneuver tokens into steps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Empty token at step {index}")]
    EmptyToken { index: usize },

    #[error("Unknown button {part:?} in token {token:?}")]
    UnknownButton { token: String, part: String },

    #[error("Token {token:?} mixes released buttons with pressed or toggled ones")]
    MixedRelease { token: String },
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("Policy model failed: {0}")]
    Model(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Strategy failed: {0}")]
    Strategy(#[from] StrategyError),
}
