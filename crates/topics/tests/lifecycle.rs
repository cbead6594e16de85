use std::time::Duration;

use topicbridge_pubsub::Protocol;
use topicbridge_pubsub_mock::{Call, MockPubSubClient, Operation};
use topicbridge_topic_store::{EndpointType, TopicFilter, TopicId, TopicState, TopicStore};
use topicbridge_topic_store_memory::MemoryTopicStore;
use topicbridge_topics::{Error, TopicManager, TopicManagerOptions, TopicRef};

static WEBHOOK_URL: &str = "https://shop.example.com/topics/webhook";

fn setup() -> (
    TopicManager<MockPubSubClient, MemoryTopicStore>,
    MockPubSubClient,
    MemoryTopicStore,
) {
    let client = MockPubSubClient::new();
    let store = MemoryTopicStore::new();
    let manager = TopicManager::new(
        client.clone(),
        store.clone(),
        TopicManagerOptions {
            general_protocol: Protocol::Https,
            remote_timeout: Duration::from_secs(5),
            webhook_url: WEBHOOK_URL.to_string(),
        },
    );

    (manager, client, store)
}

async fn confirmed_topic(
    manager: &TopicManager<MockPubSubClient, MemoryTopicStore>,
    name: &str,
) -> TopicId {
    let topic = manager.create(name, true).await.unwrap().into_value();
    let _confirmed = manager
        .confirm("token", topic.topic_arn.as_deref().unwrap())
        .await
        .unwrap();

    topic.id.unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_states() {
    let (manager, _, _) = setup();

    let topic = manager.create("orders", false).await.unwrap().into_value();
    let id = topic.id.unwrap();
    assert_eq!(topic.state(), TopicState::Created);

    let topic = manager
        .request_subscription(TopicRef::ById(id), None, None)
        .await
        .unwrap()
        .into_value();
    assert_eq!(topic.state(), TopicState::SubscribeRequested);

    let _confirmed = manager
        .confirm("abc123", topic.topic_arn.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(manager.get(id).await.unwrap().state(), TopicState::Confirmed);

    let topic = manager
        .unsubscribe(TopicRef::ById(id))
        .await
        .unwrap()
        .into_value();
    assert_eq!(topic.state(), TopicState::Created);

    assert!(manager.delete(TopicRef::ById(id)).await.unwrap().is_consistent());
    assert!(matches!(manager.get(id).await, Err(Error::TopicNotFound(_))));
}

#[tokio::test]
async fn test_unsubscribe_then_delete_calls_each_once() {
    let (manager, client, _) = setup();
    let id = confirmed_topic(&manager, "orders").await;

    let _unsubscribed = manager.unsubscribe(TopicRef::ById(id)).await.unwrap();
    let _deleted = manager.delete(TopicRef::ById(id)).await.unwrap();

    assert_eq!(client.count(Operation::Unsubscribe), 1);
    assert_eq!(client.count(Operation::DeleteTopic), 1);
}

#[tokio::test]
async fn test_delete_cascades_unsubscribe() {
    let (manager, client, store) = setup();
    let id = confirmed_topic(&manager, "orders").await;
    let subscription_arn = manager.get(id).await.unwrap().subscription_arn.unwrap();

    let deleted = manager.delete(TopicRef::ById(id)).await.unwrap();

    assert!(deleted.is_consistent());
    assert_eq!(client.count(Operation::Unsubscribe), 1);
    assert!(client.calls().contains(&Call::Unsubscribe { subscription_arn }));
    assert!(client.calls().contains(&Call::DeleteTopic {
        topic_arn: client.topic_arn("orders"),
    }));
    assert_eq!(store.get(id).await.unwrap(), None);
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_record() {
    let (manager, client, store) = setup();
    let id = manager
        .create("orders", false)
        .await
        .unwrap()
        .into_value()
        .id
        .unwrap();
    client.fail(Operation::DeleteTopic);

    let err = manager.delete(TopicRef::ById(id)).await.unwrap_err();

    assert!(err.is_remote());
    assert!(store.get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_local_delete_failure_is_reported_not_raised() {
    let (manager, _, store) = setup();
    let id = manager
        .create("orders", false)
        .await
        .unwrap()
        .into_value()
        .id
        .unwrap();
    store.set_read_only(true);

    let deleted = manager.delete(TopicRef::ById(id)).await.unwrap();

    assert_eq!(deleted.local_error().unwrap().operation(), "delete topic");
}

#[tokio::test]
async fn test_retried_delete_unsubscribes_once() {
    let (manager, client, _) = setup();
    let id = confirmed_topic(&manager, "orders").await;
    client.fail(Operation::DeleteTopic);

    assert!(matches!(
        manager.delete(TopicRef::ById(id)).await,
        Err(Error::Remote {
            operation: "delete topic",
            ..
        })
    ));

    let topic = manager.get(id).await.unwrap();
    assert_eq!(topic.subscription_arn, None);
    assert_eq!(topic.state(), TopicState::Created);

    client.recover(Operation::DeleteTopic);
    let deleted = manager.delete(TopicRef::ById(id)).await.unwrap();

    assert!(deleted.is_consistent());
    assert_eq!(client.count(Operation::Unsubscribe), 1);
    assert_eq!(client.count(Operation::DeleteTopic), 2);
    assert!(matches!(manager.get(id).await, Err(Error::TopicNotFound(_))));
}

#[tokio::test]
async fn test_delete_reports_first_lost_write() {
    let (manager, client, store) = setup();
    let id = confirmed_topic(&manager, "orders").await;
    store.set_read_only(true);

    let deleted = manager.delete(TopicRef::ById(id)).await.unwrap();

    assert_eq!(deleted.local_error().unwrap().operation(), "unsubscribe");
    assert_eq!(client.count(Operation::Unsubscribe), 1);
    assert_eq!(client.count(Operation::DeleteTopic), 1);
}

#[tokio::test]
async fn test_endpoint_type() {
    let (manager, _, _) = setup();
    let own = manager.create("own", false).await.unwrap().into_value();
    let slash = manager.create("slash", false).await.unwrap().into_value();
    let external = manager.create("external", false).await.unwrap().into_value();

    let own = manager
        .request_subscription(TopicRef::Loaded(own), None, Some(WEBHOOK_URL.to_string()))
        .await
        .unwrap()
        .into_value();
    let slash = manager
        .request_subscription(TopicRef::Loaded(slash), None, Some(format!("{WEBHOOK_URL}/")))
        .await
        .unwrap()
        .into_value();
    let external = manager
        .request_subscription(
            TopicRef::Loaded(external),
            Some(Protocol::Http),
            Some("http://partner.example.org/hook".to_string()),
        )
        .await
        .unwrap()
        .into_value();

    assert_eq!(own.endpoint_type, EndpointType::Standard);
    assert_eq!(slash.endpoint_type, EndpointType::Standard);
    assert_eq!(external.endpoint_type, EndpointType::External);
    assert_eq!(external.endpoint.as_deref(), Some("http://partner.example.org/hook"));
}

#[tokio::test]
async fn test_failed_subscribe_leaves_topic_untouched() {
    let (manager, client, store) = setup();
    let topic = manager.create("orders", false).await.unwrap().into_value();
    client.fail(Operation::Subscribe);

    let err = manager
        .request_subscription(TopicRef::ById(topic.id.unwrap()), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Remote { operation: "subscribe", .. }));
    assert_eq!(store.get(topic.id.unwrap()).await.unwrap(), Some(topic));
}

#[tokio::test]
async fn test_bulk_actions_report_per_topic() {
    let (manager, _, _) = setup();
    let orders = manager.create("orders", false).await.unwrap().into_value().id.unwrap();
    let refunds = manager.create("refunds", false).await.unwrap().into_value().id.unwrap();
    let missing = TopicId::generate();

    let report = manager
        .subscribe_many(&[orders, missing, refunds], None, None)
        .await;
    assert_eq!(report.succeeded, vec![orders, refunds]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert!(matches!(report.failed[0].1, Error::TopicNotFound(_)));

    let report = manager.set_active_many(&[orders, refunds], false).await;
    assert!(report.is_complete());

    let inactive = manager
        .list(&TopicFilter {
            is_active: Some(false),
            ..TopicFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 2);

    let report = manager.unsubscribe_many(&[orders, refunds]).await;
    assert!(report.is_complete());

    let report = manager.delete_many(&[orders, refunds]).await;
    assert!(report.is_complete());
    assert!(manager.list(&TopicFilter::default()).await.unwrap().is_empty());
}
