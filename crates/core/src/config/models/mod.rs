pub mod api_observability;
pub mod app_config;
pub mod database;
pub mod pubsub;

// Re-export main types for easier imports
pub use api_observability::{ApiConfig, ObservabilityConfig};
pub use app_config::AppConfig;
pub use database::{DatabaseConfig, StoreBackend};
pub use pubsub::{PubSubBackend, PubSubConfig, RedisConfig, DEFAULT_DISPATCH_CHANNEL};
