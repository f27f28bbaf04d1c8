//! Redis 分发器集成测试，需要 Docker：`cargo test -- --ignored`

use futures::StreamExt;
use taskplane_core::config::models::PubSubConfig;
use taskplane_domain::{DispatchMessage, Dispatcher, TaskId};
use taskplane_infrastructure::RedisDispatcher;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;

async fn setup() -> (ContainerAsync<Redis>, PubSubConfig) {
    let container = Redis::default().start().await.unwrap();
    let port = container.get_host_port_ipv4(6379).await.unwrap();

    let mut config = PubSubConfig::default();
    config.redis.host = "127.0.0.1".to_string();
    config.redis.port = port;
    config.channel = "taskplane_test_queue".to_string();
    (container, config)
}

#[tokio::test]
#[ignore]
async fn test_publish_without_subscribers_reports_zero() {
    let (_container, config) = setup().await;
    let dispatcher = RedisDispatcher::connect(&config).await.unwrap();
    dispatcher.health_check().await.unwrap();

    let count = dispatcher
        .publish(&DispatchMessage::run_once(TaskId(1), "Job"))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore]
async fn test_publish_reaches_subscriber() {
    let (_container, config) = setup().await;
    let dispatcher = RedisDispatcher::connect(&config).await.unwrap();

    let client = redis::Client::open(config.redis.build_url()).unwrap();
    let mut pubsub = client.get_async_pubsub().await.unwrap();
    pubsub.subscribe(&config.channel).await.unwrap();

    let count = dispatcher
        .publish(&DispatchMessage::run_once(TaskId(42), "Cleanup"))
        .await
        .unwrap();
    assert_eq!(count, 1);

    let message = pubsub.on_message().next().await.unwrap();
    let payload: String = message.get_payload().unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["operation"], "add_job");
    assert_eq!(value["task"]["exec_strategy"], "once");
    assert_eq!(value["task"]["job_params"]["name"], "42");
}
