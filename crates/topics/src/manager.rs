use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use topicbridge_pubsub::{Protocol, PubSubClient, PublishRequest, SubscribeOutcome};
use topicbridge_topic_store::{EndpointType, Topic, TopicFilter, TopicId, TopicStore};
use tracing::{debug, info, warn};

use crate::error::{Error, LocalPersistenceError, Persisted, Result};
use crate::reference::{TopicRef, resolve};

/// Options for the topic manager.
#[derive(Clone, Debug)]
pub struct TopicManagerOptions {
    /// Protocol used when a subscribe request does not name one.
    pub general_protocol: Protocol,

    /// Upper bound for every call to the provider.
    pub remote_timeout: Duration,

    /// Our own webhook URL, the default subscription endpoint.
    pub webhook_url: String,
}

/// Per-topic outcome of a bulk action.
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Topics the action succeeded for.
    pub succeeded: Vec<TopicId>,

    /// Topics the action failed for.
    pub failed: Vec<(TopicId, Error)>,
}

impl BulkReport {
    /// Whether every topic succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives topics through their lifecycle, keeping the store in step with the
/// provider.
#[derive(Clone, Debug)]
pub struct TopicManager<P, S>
where
    P: PubSubClient,
    S: TopicStore,
{
    client: P,
    options: Arc<TopicManagerOptions>,
    store: S,
}

fn same_endpoint(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

impl<P, S> TopicManager<P, S>
where
    P: PubSubClient,
    S: TopicStore,
{
    /// Creates a new manager.
    pub fn new(client: P, store: S, options: TopicManagerOptions) -> Self {
        Self {
            client,
            options: Arc::new(options),
            store,
        }
    }

    /// Our own webhook URL.
    #[must_use]
    pub fn webhook_url(&self) -> &str {
        &self.options.webhook_url
    }

    /// Resolves a reference, never failing on a missing topic.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the store cannot be read.
    pub async fn resolve(&self, reference: TopicRef, fallback_id: Option<TopicId>) -> Result<Topic> {
        resolve(&self.store, reference, fallback_id)
            .await
            .map_err(Error::store)
    }

    /// Resolves a reference to a persisted topic.
    ///
    /// # Errors
    ///
    /// Returns `Error::TopicNotFound` if nothing matches, `Error::Store` if the
    /// store cannot be read.
    pub async fn require(&self, reference: TopicRef) -> Result<Topic> {
        let label = reference.to_string();
        let topic = self.resolve(reference, None).await?;

        if topic.is_persisted() {
            Ok(topic)
        } else {
            Err(Error::TopicNotFound(label))
        }
    }

    /// Loads a topic by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::TopicNotFound` if there is no such topic.
    pub async fn get(&self, id: TopicId) -> Result<Topic> {
        self.require(TopicRef::ById(id)).await
    }

    /// Lists stored topics.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the store cannot be read.
    pub async fn list(&self, filter: &TopicFilter) -> Result<Vec<Topic>> {
        self.store.list(filter).await.map_err(Error::store)
    }

    /// Creates a topic remotely, records it, and optionally subscribes our own
    /// webhook to it.
    ///
    /// # Errors
    ///
    /// Returns an error if creation or the automatic subscribe request fails
    /// at the provider. Nothing is stored when creation fails. A failed
    /// automatic subscribe happens after creation, so the topic stays created
    /// and recorded; it can be subscribed again with `request_subscription`.
    pub async fn create(&self, name: &str, auto_subscribe: bool) -> Result<Persisted<Topic>> {
        let topic_arn = self
            .remote("create topic", self.client.create_topic(name))
            .await?;
        info!(name, %topic_arn, "created topic");

        let created = self
            .persist(
                "create topic",
                Topic {
                    topic_arn: Some(topic_arn),
                    ..Topic::new(name)
                },
            )
            .await;

        if !auto_subscribe {
            return Ok(created);
        }

        let (topic, local_error) = created.into_parts();
        Ok(self
            .subscribe_topic(topic, None, None)
            .await?
            .after(local_error))
    }

    /// Asks the provider to deliver a topic to `endpoint` (our own webhook
    /// by default) over `protocol` (the configured default by default).
    ///
    /// # Errors
    ///
    /// Returns an error if the topic is unknown, not created remotely,
    /// already subscribed, or the provider rejects the request.
    pub async fn request_subscription(
        &self,
        reference: TopicRef,
        protocol: Option<Protocol>,
        endpoint: Option<String>,
    ) -> Result<Persisted<Topic>> {
        let topic = self.require(reference).await?;
        self.subscribe_topic(topic, protocol, endpoint).await
    }

    async fn subscribe_topic(
        &self,
        mut topic: Topic,
        protocol: Option<Protocol>,
        endpoint: Option<String>,
    ) -> Result<Persisted<Topic>> {
        let topic_arn = topic
            .topic_arn
            .clone()
            .ok_or_else(|| Error::TopicNotCreated(topic.name.clone()))?;

        if topic.is_subscribed() {
            return Err(Error::AlreadySubscribed(topic.name));
        }

        let protocol = protocol.unwrap_or(self.options.general_protocol);
        let endpoint = endpoint.unwrap_or_else(|| self.options.webhook_url.clone());
        let endpoint_type = if same_endpoint(&endpoint, &self.options.webhook_url) {
            EndpointType::Standard
        } else {
            EndpointType::External
        };

        let outcome = self
            .remote(
                "subscribe",
                self.client.subscribe(&topic_arn, protocol, &endpoint),
            )
            .await?;

        match outcome {
            SubscribeOutcome::Pending => {
                info!(%topic_arn, %protocol, %endpoint, "subscription awaiting confirmation");
                topic.subscription_pending = true;
            }
            SubscribeOutcome::Confirmed(subscription_arn) => {
                info!(%topic_arn, %subscription_arn, "subscription confirmed");
                topic.subscription_pending = false;
                topic.subscription_arn = Some(subscription_arn);
            }
        }

        topic.endpoint = Some(endpoint);
        topic.endpoint_type = endpoint_type;

        Ok(self.persist("subscribe", topic).await)
    }

    /// Completes a pending subscription. The local record is updated when
    /// one exists; an untracked topic is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the provider rejects the confirmation.
    pub async fn confirm(&self, token: &str, topic_arn: &str) -> Result<Persisted<String>> {
        let subscription_arn = self
            .remote(
                "confirm subscription",
                self.client.confirm_subscription(token, topic_arn),
            )
            .await?;
        info!(topic_arn, %subscription_arn, "confirmed subscription");

        let local_error = match self
            .resolve(TopicRef::ByArn(topic_arn.to_string()), None)
            .await
        {
            Ok(mut topic) if topic.is_persisted() => {
                topic.subscription_arn = Some(subscription_arn.clone());
                topic.subscription_pending = false;

                self.persist("confirm subscription", topic)
                    .await
                    .into_parts()
                    .1
            }
            Ok(_) => {
                debug!(topic_arn, "confirmed subscription for untracked topic");
                None
            }
            Err(e) => {
                warn!(topic_arn, "could not look up confirmed topic: {e}");
                Some(LocalPersistenceError::new("confirm subscription", e))
            }
        };

        Ok(Persisted::new(subscription_arn, local_error))
    }

    /// Removes a topic's subscription remotely and clears it locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic is unknown or the provider rejects the
    /// request.
    pub async fn unsubscribe(&self, reference: TopicRef) -> Result<Persisted<Topic>> {
        let mut topic = self.require(reference).await?;

        if !topic.is_subscribed() && !topic.subscription_pending {
            debug!(name = %topic.name, "topic has no subscription");
            return Ok(Persisted::clean(topic));
        }

        self.unsubscribe_remote(&topic).await?;
        topic.subscription_arn = None;
        topic.subscription_pending = false;

        Ok(self.persist("unsubscribe", topic).await)
    }

    async fn unsubscribe_remote(&self, topic: &Topic) -> Result<()> {
        if let Some(subscription_arn) = &topic.subscription_arn {
            self.remote("unsubscribe", self.client.unsubscribe(subscription_arn))
                .await?;
            info!(%subscription_arn, "unsubscribed");
        }

        Ok(())
    }

    /// Deletes a topic: unsubscribes if needed, deletes it remotely, then
    /// drops the local record.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic is unknown or the provider rejects the
    /// unsubscribe or delete request.
    pub async fn delete(&self, reference: TopicRef) -> Result<Persisted<()>> {
        let mut topic = self.require(reference).await?;
        let mut unsubscribe_error = None;

        if topic.is_subscribed() {
            self.unsubscribe_remote(&topic).await?;
            topic.subscription_arn = None;
            topic.subscription_pending = false;

            // A failed remote delete must not leave a dead subscription behind
            // for the next attempt to unsubscribe again.
            let (cleared, local_error) = self.persist("unsubscribe", topic).await.into_parts();
            topic = cleared;
            unsubscribe_error = local_error;
        }

        if let Some(topic_arn) = &topic.topic_arn {
            self.remote("delete topic", self.client.delete_topic(topic_arn))
                .await?;
            info!(%topic_arn, "deleted topic");
        }

        let local_error = match topic.id {
            Some(id) => match self.store.delete(id).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(%id, "topic deleted remotely but not locally: {e}");
                    Some(LocalPersistenceError::new("delete topic", e))
                }
            },
            None => None,
        };

        Ok(Persisted::new((), local_error).after(unsubscribe_error))
    }

    /// Turns forwarding of inbound notifications on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic is unknown or the store rejects the
    /// write.
    pub async fn set_active(&self, reference: TopicRef, active: bool) -> Result<Topic> {
        let mut topic = self.require(reference).await?;
        topic.is_active = active;

        let topic = self.store.save(topic).await.map_err(Error::store)?;
        info!(name = %topic.name, active, "updated topic");

        Ok(topic)
    }

    /// Publishes a message and returns the provider's message ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the message.
    pub async fn publish(&self, request: PublishRequest) -> Result<String> {
        let target = request.target.arn().to_string();
        let message_id = self
            .remote("publish", self.client.publish(request))
            .await?;
        debug!(%target, %message_id, "published message");

        Ok(message_id)
    }

    /// Requests a subscription for each topic.
    pub async fn subscribe_many(
        &self,
        ids: &[TopicId],
        protocol: Option<Protocol>,
        endpoint: Option<String>,
    ) -> BulkReport {
        self.bulk("subscribe", ids, |id| {
            let endpoint = endpoint.clone();
            async move {
                self.request_subscription(TopicRef::ById(id), protocol, endpoint)
                    .await
                    .map(Persisted::into_parts)
                    .map(|(_, local_error)| local_error)
            }
        })
        .await
    }

    /// Unsubscribes each topic.
    pub async fn unsubscribe_many(&self, ids: &[TopicId]) -> BulkReport {
        self.bulk("unsubscribe", ids, |id| async move {
            self.unsubscribe(TopicRef::ById(id))
                .await
                .map(|persisted| persisted.into_parts().1)
        })
        .await
    }

    /// Deletes each topic.
    pub async fn delete_many(&self, ids: &[TopicId]) -> BulkReport {
        self.bulk("delete", ids, |id| async move {
            self.delete(TopicRef::ById(id))
                .await
                .map(|persisted| persisted.into_parts().1)
        })
        .await
    }

    /// Enables or disables each topic.
    pub async fn set_active_many(&self, ids: &[TopicId], active: bool) -> BulkReport {
        self.bulk("set active", ids, |id| async move {
            self.set_active(TopicRef::ById(id), active)
                .await
                .map(|_| None)
        })
        .await
    }

    async fn bulk<F, Fut>(&self, action: &'static str, ids: &[TopicId], f: F) -> BulkReport
    where
        F: Fn(TopicId) -> Fut,
        Fut: Future<Output = Result<Option<LocalPersistenceError>>>,
    {
        let mut report = BulkReport::default();

        for &id in ids {
            match f(id).await {
                Ok(local_error) => {
                    if let Some(e) = local_error {
                        warn!(%id, action, "{e}");
                    }
                    report.succeeded.push(id);
                }
                Err(e) => {
                    warn!(%id, action, "bulk action failed: {e}");
                    report.failed.push((id, e));
                }
            }
        }

        report
    }

    async fn remote<T, E>(
        &self,
        operation: &'static str,
        future: impl Future<Output = std::result::Result<T, E>>,
    ) -> Result<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        match timeout(self.options.remote_timeout, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::Remote {
                operation,
                source: Box::new(e),
            }),
            Err(_) => Err(Error::Timeout {
                operation,
                after: self.options.remote_timeout,
            }),
        }
    }

    async fn persist(&self, operation: &'static str, topic: Topic) -> Persisted<Topic> {
        match self.store.save(topic.clone()).await {
            Ok(saved) => Persisted::clean(saved),
            Err(e) => {
                warn!(operation, name = %topic.name, "remote change not persisted: {e}");
                Persisted::new(topic, Some(LocalPersistenceError::new(operation, e)))
            }
        }
    }
}
