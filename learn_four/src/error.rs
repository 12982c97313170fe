use crate::board::Mark;
use std::path::PathBuf;

/// Errors that can occur when loading or checking game parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that can occur while saving or loading state tables.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("malformed table: {0}")]
    Shape(String),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("state {state} of the {mark:?} table has no transition for column {column}")]
    MissingTransition {
        mark: Mark,
        state: usize,
        column: usize,
    },

    #[error("state {state} of the {mark:?} table has no legal column")]
    NoLegalAction { mark: Mark, state: usize },

    #[error("the empty board is not present in the first player's table")]
    NoInitialState,

    #[error("training worker for {0:?} panicked")]
    WorkerPanicked(Mark),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_transition_display() {
        let err = TrainingError::MissingTransition {
            mark: Mark::Second,
            state: 7,
            column: 2,
        };
        assert_eq!(
            err.to_string(),
            "state 7 of the Second table has no transition for column 2"
        );
    }

    #[test]
    fn shape_error_display() {
        let err = StorageError::Shape("Q-Tables row 3 has 4 columns".to_string());
        assert_eq!(err.to_string(), "malformed table: Q-Tables row 3 has 4 columns");
    }
}
