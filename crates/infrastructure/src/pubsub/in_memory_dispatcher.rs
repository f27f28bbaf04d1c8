use async_trait::async_trait;
use taskplane_core::{config::models::DEFAULT_DISPATCH_CHANNEL, TaskPlaneResult};
use taskplane_domain::{DispatchMessage, Dispatcher};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 1024;

/// 进程内分发器
///
/// 与 Redis PUBLISH 语义一致：只投递给发布时已订阅的接收端，
/// 返回接收端数量，无人订阅时消息直接丢弃。
#[derive(Debug)]
pub struct InMemoryDispatcher {
    sender: broadcast::Sender<String>,
    channel: String,
}

impl InMemoryDispatcher {
    pub fn new(channel: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            sender,
            channel: channel.into(),
        }
    }

    /// 订阅负载（UTF-8 JSON 文本）
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DISPATCH_CHANNEL)
    }
}

#[async_trait]
impl Dispatcher for InMemoryDispatcher {
    async fn publish(&self, message: &DispatchMessage) -> TaskPlaneResult<i64> {
        let payload = message.to_payload()?;
        match self.sender.send(payload) {
            Ok(count) => {
                debug!("分发消息已送达 {} 个订阅者", count);
                Ok(count as i64)
            }
            Err(_) => {
                warn!(
                    "通道 {} 没有订阅者，任务 {} 的分发消息已丢失",
                    self.channel,
                    message.job_name()
                );
                Ok(0)
            }
        }
    }

    fn channel(&self) -> &str {
        &self.channel
    }
}
