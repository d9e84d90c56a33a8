//! Application layer: the moderation engine and its collaborators.

pub mod broadcast;
pub mod engine;
pub mod processor;

pub use broadcast::{BroadcastGateway, SubscriberId, Subscription};
pub use engine::{EngineSettings, ModerationEngine};
pub use processor::MessageProcessor;
