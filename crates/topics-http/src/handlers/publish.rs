use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use topicbridge_pubsub::{PubSubClient, PublishRequest, PublishTarget};
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::{TopicId, TopicStore};
use topicbridge_topics::{Error, EventSink, TopicRef};

use crate::TopicsContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct PublishBody {
    message: String,

    #[serde(default)]
    subject: Option<String>,

    /// Explicit destination.
    #[serde(default)]
    target: Option<PublishTarget>,

    /// Publish to a stored topic instead of an explicit destination.
    #[serde(default)]
    topic_id: Option<TopicId>,

    #[serde(default)]
    message_structure: Option<String>,

    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishResponse {
    message_id: String,
}

pub(crate) async fn publish_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Json(body): Json<PublishBody>,
) -> Result<Json<PublishResponse>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    let target = match (body.topic_id, body.target) {
        (Some(id), None) => {
            let topic = ctx.manager().require(TopicRef::ById(id)).await?;
            let topic_arn = topic.topic_arn.ok_or(Error::TopicNotCreated(topic.name))?;

            PublishTarget::Topic(topic_arn)
        }
        (None, Some(target)) => target,
        _ => {
            return Err(ApiError::bad_request(
                "exactly one of target or topic_id is required",
            ));
        }
    };

    let message_id = ctx
        .manager()
        .publish(PublishRequest {
            message: body.message,
            subject: body.subject,
            target,
            message_structure: body.message_structure,
            attributes: body.attributes,
        })
        .await?;

    Ok(Json(PublishResponse { message_id }))
}
