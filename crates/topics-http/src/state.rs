use topicbridge_pubsub::PubSubClient;
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::TopicStore;
use topicbridge_topics::{EventSink, NotificationDispatcher, TopicManager};

/// Shared state for every route.
#[derive(Clone)]
pub struct TopicsContext<V, P, S, E>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    /// Handles webhook deliveries.
    pub dispatcher: NotificationDispatcher<V, P, S, E>,
}

impl<V, P, S, E> TopicsContext<V, P, S, E>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    pub(crate) const fn manager(&self) -> &TopicManager<P, S> {
        self.dispatcher.manager()
    }
}
