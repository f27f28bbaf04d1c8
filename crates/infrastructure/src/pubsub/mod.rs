//! 分发器实现

mod in_memory_dispatcher;
mod redis_dispatcher;

use std::sync::Arc;

use taskplane_core::{
    config::models::{PubSubBackend, PubSubConfig},
    TaskPlaneResult,
};
use taskplane_domain::Dispatcher;

pub use in_memory_dispatcher::InMemoryDispatcher;
pub use redis_dispatcher::RedisDispatcher;

/// 按配置创建分发器
pub async fn build_dispatcher(config: &PubSubConfig) -> TaskPlaneResult<Arc<dyn Dispatcher>> {
    match config.backend {
        PubSubBackend::Redis => Ok(Arc::new(RedisDispatcher::connect(config).await?)),
        PubSubBackend::Memory => Ok(Arc::new(InMemoryDispatcher::new(config.channel.clone()))),
    }
}
