pub mod error;
pub mod gateway;
pub mod memory;
pub mod models;

pub use error::{Result, StorageError};
pub use gateway::{Feed, StoreGateway, Subscription};
pub use memory::{MemoryStore, StoreOperation};
