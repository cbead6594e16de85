use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use topicbridge_pubsub::{Protocol, PubSubClient};
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::{TopicFilter, TopicId, TopicStore};
use topicbridge_topics::{EventSink, TopicRef};
use tracing::warn;

use super::TopicView;
use crate::TopicsContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTopicRequest {
    name: String,

    #[serde(default)]
    auto_subscribe: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubscribeRequest {
    #[serde(default)]
    protocol: Option<Protocol>,

    #[serde(default)]
    endpoint: Option<String>,
}

pub(crate) async fn list_topics_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Query(filter): Query<TopicFilter>,
) -> Result<Json<Vec<TopicView>>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    let topics = ctx.manager().list(&filter).await?;

    Ok(Json(topics.into_iter().map(TopicView::from).collect()))
}

pub(crate) async fn create_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Json(request): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<TopicView>), ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("topic name must not be empty"));
    }

    let created = ctx.manager().create(name, request.auto_subscribe).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub(crate) async fn get_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
) -> Result<Json<TopicView>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    Ok(Json(ctx.manager().get(id).await?.into()))
}

pub(crate) async fn delete_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
) -> Result<StatusCode, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    let deleted = ctx.manager().delete(TopicRef::ById(id)).await?;
    if let Some(e) = deleted.local_error() {
        warn!(%id, "{e}");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn subscribe_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
    request: Option<Json<SubscribeRequest>>,
) -> Result<Json<TopicView>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    // A bodyless POST subscribes our own webhook with the default protocol.
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let subscribed = ctx
        .manager()
        .request_subscription(TopicRef::ById(id), request.protocol, request.endpoint)
        .await?;

    Ok(Json(subscribed.into()))
}

pub(crate) async fn unsubscribe_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
) -> Result<Json<TopicView>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    Ok(Json(ctx.manager().unsubscribe(TopicRef::ById(id)).await?.into()))
}

pub(crate) async fn enable_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
) -> Result<Json<TopicView>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    Ok(Json(
        ctx.manager().set_active(TopicRef::ById(id), true).await?.into(),
    ))
}

pub(crate) async fn disable_topic_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(id): Path<TopicId>,
) -> Result<Json<TopicView>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    Ok(Json(
        ctx.manager().set_active(TopicRef::ById(id), false).await?.into(),
    ))
}
