pub mod models;
pub mod normalize;

pub use models::{CanonicalDetails, CanonicalEvent, CanonicalHistory, Entry, ParticipantEntry};
pub use normalize::Normalize;
