use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use topicbridge_pubsub::Protocol;
use topicbridge_pubsub_mock::{Call, MockPubSubClient, Operation};
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::{Topic, TopicStore};
use topicbridge_topic_store_memory::MemoryTopicStore;
use topicbridge_topics::{
    BroadcastError, Delivery, EventSink, InboundEvent, NOTIFICATION_EVENT,
    NotificationDispatcher, TopicManager, TopicManagerOptions, TopicRef,
};
use tracing_test::traced_test;

#[derive(Clone)]
struct FixedVerifier(bool);

#[async_trait]
impl Verifier for FixedVerifier {
    async fn verify(&self, _raw_message: &[u8]) -> bool {
        self.0
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<InboundEvent>>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<InboundEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    type Error = BroadcastError;

    async fn emit(&self, event: InboundEvent) -> Result<(), Self::Error> {
        self.events.lock().push(event);
        Ok(())
    }
}

struct Harness {
    client: MockPubSubClient,
    dispatcher: NotificationDispatcher<FixedVerifier, MockPubSubClient, MemoryTopicStore, RecordingSink>,
    sink: RecordingSink,
    store: MemoryTopicStore,
}

fn harness(signature_valid: bool) -> Harness {
    let client = MockPubSubClient::with_account("us-east-1", "111");
    let store = MemoryTopicStore::new();
    let sink = RecordingSink::default();
    let manager = TopicManager::new(
        client.clone(),
        store.clone(),
        TopicManagerOptions {
            general_protocol: Protocol::Https,
            remote_timeout: Duration::from_secs(5),
            webhook_url: "https://shop.example.com/topics/webhook".to_string(),
        },
    );

    Harness {
        client,
        dispatcher: NotificationDispatcher::new(FixedVerifier(signature_valid), manager, sink.clone()),
        sink,
        store,
    }
}

fn notification(topic_arn: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "Type": "Notification",
        "MessageId": "22b80b92-fdea-4c2c-8f9d-bdfb0c7bf324",
        "TopicArn": topic_arn,
        "Subject": "new order",
        "Message": "{\"orderId\":42}",
        "Timestamp": "2024-01-01T00:00:00.000Z",
    }))
    .unwrap()
}

#[tokio::test]
async fn test_confirmation_completes_pending_subscription() {
    let h = harness(true);
    let manager = h.dispatcher.manager();
    let topic = manager.create("orders", true).await.unwrap().into_value();
    assert!(topic.subscription_pending);

    let body = serde_json::to_vec(&json!({
        "Type": "SubscriptionConfirmation",
        "Token": "abc123",
        "TopicArn": topic.topic_arn,
        "Message": "You have chosen to subscribe to the topic",
    }))
    .unwrap();

    assert_eq!(h.dispatcher.handle(&body).await, Delivery::Accepted);

    assert!(h.client.calls().contains(&Call::ConfirmSubscription {
        token: "abc123".to_string(),
        topic_arn: h.client.topic_arn("orders"),
    }));

    let confirmed = h.store.get(topic.id.unwrap()).await.unwrap().unwrap();
    assert!(confirmed.is_subscribed());
    assert!(!confirmed.subscription_pending);
}

#[traced_test]
#[tokio::test]
async fn test_confirmation_with_read_only_store_is_accepted() {
    let h = harness(true);
    let topic = h
        .dispatcher
        .manager()
        .create("orders", true)
        .await
        .unwrap()
        .into_value();
    h.store.set_read_only(true);

    let body = serde_json::to_vec(&json!({
        "Type": "SubscriptionConfirmation",
        "Token": "abc123",
        "TopicArn": topic.topic_arn,
    }))
    .unwrap();

    assert_eq!(h.dispatcher.handle(&body).await, Delivery::Accepted);
    assert_eq!(h.client.count(Operation::ConfirmSubscription), 1);
    assert!(logs_contain("remote change not persisted"));

    let stored = h.store.get(topic.id.unwrap()).await.unwrap().unwrap();
    assert!(stored.subscription_pending);
}

#[tokio::test]
async fn test_confirmation_for_untracked_topic() {
    let h = harness(true);

    let confirmed = h
        .dispatcher
        .manager()
        .confirm("abc123", "arn:aws:sns:us-east-1:999:elsewhere")
        .await
        .unwrap();

    assert!(confirmed.is_consistent());
    assert_eq!(h.client.count(Operation::ConfirmSubscription), 1);
}

#[tokio::test]
async fn test_notification_for_active_topic_is_forwarded() {
    let h = harness(true);
    let topic = h
        .dispatcher
        .manager()
        .create("orders", false)
        .await
        .unwrap()
        .into_value();
    let topic_arn = topic.topic_arn.clone().unwrap();

    assert_eq!(
        h.dispatcher.handle(&notification(&topic_arn)).await,
        Delivery::Accepted
    );

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, NOTIFICATION_EVENT);
    assert_eq!(events[0].topic_id, topic.id.unwrap());
    assert_eq!(events[0].topic_arn, topic_arn);
    assert_eq!(events[0].subject.as_deref(), Some("new order"));
    assert_eq!(events[0].payload, json!({"orderId": 42}));
}

#[tokio::test]
async fn test_notification_for_inactive_topic_is_dropped() {
    let h = harness(true);
    let manager = h.dispatcher.manager();
    let topic = manager.create("orders", false).await.unwrap().into_value();
    manager
        .set_active(TopicRef::ById(topic.id.unwrap()), false)
        .await
        .unwrap();

    let delivery = h
        .dispatcher
        .handle(&notification(topic.topic_arn.as_deref().unwrap()))
        .await;

    assert_eq!(delivery, Delivery::Accepted);
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn test_notification_for_unknown_topic_is_dropped() {
    let h = harness(true);
    h.store.save(Topic::new("unrelated")).await.unwrap();

    let delivery = h
        .dispatcher
        .handle(&notification("arn:aws:sns:us-east-1:999:unknown"))
        .await;

    assert_eq!(delivery, Delivery::Accepted);
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_invalid_signature_is_rejected_before_classification() {
    let h = harness(false);
    let topic = h
        .dispatcher
        .manager()
        .create("orders", false)
        .await
        .unwrap()
        .into_value();

    let delivery = h
        .dispatcher
        .handle(&notification(topic.topic_arn.as_deref().unwrap()))
        .await;

    assert_eq!(delivery, Delivery::Rejected);
    assert!(h.sink.events().is_empty());
    assert!(logs_contain("rejected delivery with invalid signature"));
}

#[tokio::test]
#[traced_test]
async fn test_failed_confirmation_is_still_accepted() {
    let h = harness(true);
    h.client.fail(Operation::ConfirmSubscription);

    let body = serde_json::to_vec(&json!({
        "Type": "SubscriptionConfirmation",
        "Token": "abc123",
        "TopicArn": "arn:aws:sns:us-east-1:111:orders",
    }))
    .unwrap();

    assert_eq!(h.dispatcher.handle(&body).await, Delivery::Accepted);
    assert!(logs_contain("could not confirm subscription"));
}

#[tokio::test]
async fn test_unclassified_messages_are_accepted() {
    let h = harness(true);

    let unsubscribe = serde_json::to_vec(&json!({
        "Type": "UnsubscribeConfirmation",
        "Token": "abc123",
        "TopicArn": "arn:aws:sns:us-east-1:111:orders",
    }))
    .unwrap();

    assert_eq!(h.dispatcher.handle(&unsubscribe).await, Delivery::Accepted);
    assert_eq!(h.dispatcher.handle(b"not json").await, Delivery::Accepted);
    assert!(h.client.calls().is_empty());
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn test_confirmation_scenario() {
    let h = harness(true);
    h.dispatcher
        .manager()
        .create("orders", true)
        .await
        .unwrap()
        .into_value();

    let body = br#"{"Type":"SubscriptionConfirmation","Token":"abc123","TopicArn":"arn:aws:sns:us-east-1:111:orders"}"#;

    assert_eq!(h.dispatcher.handle(body).await, Delivery::Accepted);
    assert_eq!(
        h.client.calls().last(),
        Some(&Call::ConfirmSubscription {
            token: "abc123".to_string(),
            topic_arn: "arn:aws:sns:us-east-1:111:orders".to_string(),
        })
    );
}

#[tokio::test]
async fn test_notification_scenario() {
    let h = harness(true);
    h.dispatcher
        .manager()
        .create("orders", false)
        .await
        .unwrap()
        .into_value();

    let body = br#"{"Type":"Notification","TopicArn":"arn:aws:sns:us-east-1:111:orders","Message":"{\"orderId\":42}"}"#;

    assert_eq!(h.dispatcher.handle(body).await, Delivery::Accepted);

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, json!({"orderId": 42}));
    assert_eq!(events[0].message_id, None);
}
