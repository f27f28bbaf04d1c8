use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use taskplane_core::{config::models::PubSubConfig, TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{DispatchMessage, Dispatcher};
use tracing::{debug, info, instrument, warn};

/// Redis PUBLISH 分发器
///
/// 返回值即 PUBLISH 的订阅者计数。连接断开时由 `ConnectionManager`
/// 负责重连，本身不重试单次发布。
pub struct RedisDispatcher {
    connection: ConnectionManager,
    channel: String,
    publish_timeout: Duration,
}

impl RedisDispatcher {
    pub async fn connect(config: &PubSubConfig) -> TaskPlaneResult<Self> {
        let redis = &config.redis;
        let client = Client::open(redis.build_url()).map_err(|e| {
            TaskPlaneError::MessageQueue(format!("Failed to create Redis client: {e}"))
        })?;

        let connect_timeout = Duration::from_secs(redis.connection_timeout_seconds);
        let connection = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                TaskPlaneError::MessageQueue(format!(
                    "Connecting to Redis at {}:{} timed out",
                    redis.host, redis.port
                ))
            })?
            .map_err(|e| TaskPlaneError::MessageQueue(format!("Failed to connect to Redis: {e}")))?;

        info!(
            "已连接 Redis {}:{}，分发通道: {}",
            redis.host, redis.port, config.channel
        );

        Ok(Self {
            connection,
            channel: config.channel.clone(),
            publish_timeout: Duration::from_millis(config.publish_timeout_ms),
        })
    }

    pub async fn health_check(&self) -> TaskPlaneResult<()> {
        let mut conn = self.connection.clone();
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| TaskPlaneError::MessageQueue(format!("Redis PING failed: {e}")))?;

        if response == "PONG" {
            debug!("Redis connection test successful");
            Ok(())
        } else {
            Err(TaskPlaneError::MessageQueue(format!(
                "Unexpected PING response: {response}"
            )))
        }
    }
}

#[async_trait]
impl Dispatcher for RedisDispatcher {
    #[instrument(skip(self, message), fields(
        channel = %self.channel,
        operation = message.operation(),
        job = message.job_name(),
    ))]
    async fn publish(&self, message: &DispatchMessage) -> TaskPlaneResult<i64> {
        let payload = message.to_payload()?;
        let mut conn = self.connection.clone();

        let subscribers: i64 = tokio::time::timeout(
            self.publish_timeout,
            conn.publish::<_, _, i64>(&self.channel, payload),
        )
        .await
        .map_err(|_| TaskPlaneError::PublishTimeout {
            channel: self.channel.clone(),
            timeout_ms: self.publish_timeout.as_millis() as u64,
        })?
        .map_err(|e| TaskPlaneError::MessageQueue(format!("Redis PUBLISH failed: {e}")))?;

        if subscribers == 0 {
            warn!(
                "通道 {} 没有订阅者，任务 {} 的分发消息已丢失",
                self.channel,
                message.job_name()
            );
        } else {
            debug!("分发消息已送达 {} 个订阅者", subscribers);
        }
        Ok(subscribers)
    }

    fn channel(&self) -> &str {
        &self.channel
    }
}
