//! Interaction with the external text-scoring service.

pub mod classifier;
pub mod gradio_scoring_client;

pub use classifier::ClassifierClient;
pub use gradio_scoring_client::GradioScoringClient;
