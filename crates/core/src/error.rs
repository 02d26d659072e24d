use thiserror::Error;

/// Errors that can occur in the Gomoku engine
#[derive(Error, Debug)]
pub enum GomokuError {
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid board size {0} (expected 5..=25)")]
    InvalidBoardSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Background worker panicked")]
    WorkerPanicked,
}

/// Convenience Result type for Gomoku operations
pub type Result<T> = std::result::Result<T, GomokuError>;
