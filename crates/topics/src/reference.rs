use std::fmt::{Display, Formatter, Result as FmtResult};

use topicbridge_topic_store::{Topic, TopicId, TopicStore};

/// The ways callers can point at a topic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopicRef {
    /// By store identifier.
    ById(TopicId),

    /// By remote topic ARN.
    ByArn(String),

    /// An already loaded (possibly unpersisted) topic.
    Loaded(Topic),
}

impl From<TopicId> for TopicRef {
    fn from(id: TopicId) -> Self {
        Self::ById(id)
    }
}

impl From<Topic> for TopicRef {
    fn from(topic: Topic) -> Self {
        Self::Loaded(topic)
    }
}

impl Display for TopicRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByArn(arn) => f.write_str(arn),
            Self::Loaded(topic) => match topic.id {
                Some(id) => write!(f, "{id}"),
                None => write!(f, "unsaved topic {:?}", topic.name),
            },
        }
    }
}

/// Turns a reference into a topic.
///
/// A loaded topic without an ID is reloaded by `fallback_id` when one is
/// given. Anything that cannot be found resolves to a fresh, unpersisted
/// topic rather than an error.
///
/// # Errors
///
/// Only store read failures are returned.
pub async fn resolve<S>(
    store: &S,
    reference: TopicRef,
    fallback_id: Option<TopicId>,
) -> Result<Topic, S::Error>
where
    S: TopicStore,
{
    let found = match reference {
        TopicRef::Loaded(topic) => match (topic.id, fallback_id) {
            (None, Some(id)) => store.get(id).await?,
            _ => Some(topic),
        },
        TopicRef::ById(id) => store.get(id).await?,
        TopicRef::ByArn(arn) => store.find_by_arn(&arn).await?,
    };

    Ok(found.unwrap_or_default())
}
