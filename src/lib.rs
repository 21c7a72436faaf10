pub mod api_clients;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod portal;
pub mod storage;
pub mod utils;

pub use config::RuntimeConfig;
pub use error::{AppError, AppResult};
pub use portal::PortalState;
