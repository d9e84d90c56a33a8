pub mod bootstrap;
pub mod state;

pub use bootstrap::{AppBootstrap, StartupOverrides, bootstrap};
pub use state::AppState;
