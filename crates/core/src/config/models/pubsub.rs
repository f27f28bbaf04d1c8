use serde::{Deserialize, Serialize};

/// 与执行端约定的默认发布/订阅通道
///
/// 通道名是跨进程契约的一部分，执行端订阅同一名称，不可单方面修改。
pub const DEFAULT_DISPATCH_CHANNEL: &str = "task-control-plane_queue";

/// 发布/订阅后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PubSubBackend {
    #[default]
    Redis,
    /// 进程内广播，仅用于嵌入式运行和测试
    Memory,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: i64,
    pub password: Option<String>,
    pub connection_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            connection_timeout_seconds: 10,
        }
    }
}

impl RedisConfig {
    /// Validate Redis configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Redis主机地址不能为空"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!("Redis端口必须大于0"));
        }

        if self.database < 0 {
            return Err(anyhow::anyhow!("Redis数据库索引不能为负数"));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Redis连接超时时间必须大于0"));
        }

        Ok(())
    }

    /// Build Redis connection URL
    pub fn build_url(&self) -> String {
        let auth = if let Some(password) = &self.password {
            format!(":{password}@")
        } else {
            String::new()
        };
        format!(
            "redis://{}{}:{}/{}",
            auth, self.host, self.port, self.database
        )
    }
}

/// 任务分发通道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    #[serde(default)]
    pub backend: PubSubBackend,
    #[serde(default)]
    pub redis: RedisConfig,
    pub channel: String,
    /// 单次发布等待 broker 受理的上限
    pub publish_timeout_ms: u64,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            backend: PubSubBackend::Redis,
            redis: RedisConfig::default(),
            channel: DEFAULT_DISPATCH_CHANNEL.to_string(),
            publish_timeout_ms: 3000,
        }
    }
}

impl PubSubConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.channel.trim().is_empty() {
            return Err(anyhow::anyhow!("分发通道名称不能为空"));
        }

        if self.publish_timeout_ms == 0 {
            return Err(anyhow::anyhow!("发布超时时间必须大于0"));
        }

        if self.backend == PubSubBackend::Redis {
            self.redis.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_without_password() {
        let config = RedisConfig::default();
        assert_eq!(config.build_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_build_url_with_password() {
        let config = RedisConfig {
            password: Some("secret".to_string()),
            database: 1,
            ..Default::default()
        };
        assert_eq!(config.build_url(), "redis://:secret@127.0.0.1:6379/1");
    }

    #[test]
    fn test_pubsub_validation() {
        assert!(PubSubConfig::default().validate().is_ok());

        let empty_channel = PubSubConfig {
            channel: "  ".to_string(),
            ..Default::default()
        };
        assert!(empty_channel.validate().is_err());

        let memory_with_bad_redis = PubSubConfig {
            backend: PubSubBackend::Memory,
            redis: RedisConfig {
                host: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(memory_with_bad_redis.validate().is_ok());
    }
}
