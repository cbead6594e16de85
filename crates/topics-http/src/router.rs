use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use serde_json::json;
use topicbridge_pubsub::PubSubClient;
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::TopicStore;
use topicbridge_topics::EventSink;
use tower_http::trace::TraceLayer;

use crate::TopicsContext;
use crate::handlers::{
    bulk_handler, create_topic_handler, delete_topic_handler, disable_topic_handler,
    enable_topic_handler, get_topic_handler, list_topics_handler, publish_handler,
    subscribe_topic_handler, unsubscribe_topic_handler, webhook_handler,
};

/// Path the provider delivers to. Must match the configured webhook URL.
pub const WEBHOOK_PATH: &str = "/topics/webhook";

/// Builds the router serving the webhook and the topic API.
pub fn router<V, P, S, E>(ctx: TopicsContext<V, P, S, E>) -> Router
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(WEBHOOK_PATH, post(webhook_handler::<V, P, S, E>))
        .route(
            "/topics",
            get(list_topics_handler::<V, P, S, E>).post(create_topic_handler::<V, P, S, E>),
        )
        .route("/topics/publish", post(publish_handler::<V, P, S, E>))
        .route("/topics/bulk/{action}", post(bulk_handler::<V, P, S, E>))
        .route(
            "/topics/{id}",
            get(get_topic_handler::<V, P, S, E>).delete(delete_topic_handler::<V, P, S, E>),
        )
        .route(
            "/topics/{id}/subscribe",
            post(subscribe_topic_handler::<V, P, S, E>),
        )
        .route(
            "/topics/{id}/unsubscribe",
            post(unsubscribe_topic_handler::<V, P, S, E>),
        )
        .route("/topics/{id}/enable", post(enable_topic_handler::<V, P, S, E>))
        .route(
            "/topics/{id}/disable",
            post(disable_topic_handler::<V, P, S, E>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
