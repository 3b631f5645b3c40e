pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use api::{build_router, AppState};
pub use config::Config;
