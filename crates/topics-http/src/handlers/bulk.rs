use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use topicbridge_pubsub::{Protocol, PubSubClient};
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::{TopicId, TopicStore};
use topicbridge_topics::{BulkReport, EventSink};

use crate::TopicsContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct BulkRequest {
    ids: Vec<TopicId>,

    #[serde(default)]
    protocol: Option<Protocol>,

    #[serde(default)]
    endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkFailure {
    id: TopicId,
    error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkResponse {
    succeeded: Vec<TopicId>,
    failed: Vec<BulkFailure>,
}

impl From<BulkReport> for BulkResponse {
    fn from(report: BulkReport) -> Self {
        Self {
            succeeded: report.succeeded,
            failed: report
                .failed
                .into_iter()
                .map(|(id, error)| BulkFailure {
                    id,
                    error: error.to_string(),
                })
                .collect(),
        }
    }
}

pub(crate) async fn bulk_handler<V, P, S, E>(
    State(ctx): State<TopicsContext<V, P, S, E>>,
    Path(action): Path<String>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkResponse>, ApiError>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    let manager = ctx.manager();
    let ids = request.ids.as_slice();

    let report = match action.as_str() {
        "subscribe" => {
            manager
                .subscribe_many(ids, request.protocol, request.endpoint)
                .await
        }
        "unsubscribe" => manager.unsubscribe_many(ids).await,
        "delete" => manager.delete_many(ids).await,
        "enable" => manager.set_active_many(ids, true).await,
        "disable" => manager.set_active_many(ids, false).await,
        other => return Err(ApiError::not_found(format!("unknown bulk action: {other}"))),
    };

    Ok(Json(report.into()))
}
