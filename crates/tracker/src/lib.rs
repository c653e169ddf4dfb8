pub mod canonical;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod derive;
pub mod error;
pub mod export;
pub mod membership;
pub mod session;
pub mod state;

pub use config::TrackerConfig;
pub use coordinator::MutationCoordinator;
pub use error::{Result, TrackerError};
pub use membership::Identity;
pub use session::{SessionPhase, SyncSession};
pub use state::{Action, TrackerState};
