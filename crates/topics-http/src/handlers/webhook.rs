use axum::extract::State;
use axum::http::StatusCode;
use bytes::Bytes;
use topicbridge_pubsub::PubSubClient;
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::TopicStore;
use topicbridge_topics::{Delivery, EventSink};

use crate::TopicsContext;

pub(crate) async fn webhook_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    body: Bytes,
) -> StatusCode
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    match ctx.dispatcher.handle(&body).await {
        Delivery::Accepted => StatusCode::OK,
        Delivery::Rejected => StatusCode::FORBIDDEN,
    }
}
