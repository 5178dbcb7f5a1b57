use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Event engine must be started from within a Tokio runtime")]
    NoRuntime,

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,
}

pub type Result<T> = std::result::Result<T, EngineError>;
