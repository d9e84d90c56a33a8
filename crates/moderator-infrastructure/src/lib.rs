pub mod config_service;
pub mod json_history_repository;
pub mod paths;

pub use config_service::ConfigService;
pub use json_history_repository::JsonHistoryRepository;
