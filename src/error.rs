use thiserror::Error;

/// Anything that can go wrong while configuring or running a traffic light.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid traffic light config: {0}")]
    InvalidConfig(String),

    #[error("the cycling task has already been started")]
    AlreadyStarted,

    #[error("failed to spawn the cycling thread")]
    Spawn(#[source] std::io::Error),

    #[error("the cycling thread panicked")]
    CyclePanicked,
}

/// A specialized `Result` type for traffic light operations.
pub type Result<T> = std::result::Result<T, Error>;
