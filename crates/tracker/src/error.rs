use storage::StorageError;
use storage::models::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Store error: {0}")]
    Storage(#[from] StorageError),

    #[error("History entry {history_id} created but source event was not deleted: {source}")]
    PartialMove {
        history_id: RecordId,
        #[source]
        source: StorageError,
    },

    #[error("Session is not connected to a group")]
    NotConnected,

    #[error("Calendar export error: {0}")]
    Calendar(String),

    #[error("Image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
