//! Configuration schema and loading.

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{ApiConfig, BotConfig, ManagerConfig};
