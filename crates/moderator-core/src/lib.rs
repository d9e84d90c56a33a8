pub mod analysis;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod replay;
pub mod stats;

// Re-export common error type
pub use error::ModeratorError;
