use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed error from a collaborator (client or store).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The topic is already subscribed.
    #[error("topic {0} is already subscribed")]
    AlreadySubscribed(String),

    /// A call to the provider failed.
    #[error("{operation} failed: {source}")]
    Remote {
        /// The remote operation.
        operation: &'static str,

        /// What the client reported.
        #[source]
        source: BoxError,
    },

    /// Reading the topic store failed while serving a request.
    #[error("topic store error: {0}")]
    Store(#[source] BoxError),

    /// A call to the provider did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The remote operation.
        operation: &'static str,

        /// The configured limit.
        after: Duration,
    },

    /// The topic has no remote counterpart yet.
    #[error("topic {0} has not been created remotely")]
    TopicNotCreated(String),

    /// No topic matches the reference.
    #[error("topic not found: {0}")]
    TopicNotFound(String),
}

impl Error {
    pub(crate) fn store(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(error))
    }

    /// Whether the provider was involved in the failure.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Timeout { .. })
    }
}

/// A store write that failed after the provider had already accepted the
/// change. The provider is authoritative, so this never fails the operation.
#[derive(Debug, Error)]
#[error("{operation}: local topic store not updated: {source}")]
pub struct LocalPersistenceError {
    operation: &'static str,
    #[source]
    source: BoxError,
}

impl LocalPersistenceError {
    pub(crate) fn new(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// The operation whose write was lost.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }
}

/// The value of a remote operation that succeeded, plus the local write
/// failure that followed it, if any.
#[derive(Debug)]
#[must_use]
pub struct Persisted<T> {
    value: T,
    local_error: Option<LocalPersistenceError>,
}

impl<T> Persisted<T> {
    pub(crate) const fn new(value: T, local_error: Option<LocalPersistenceError>) -> Self {
        Self { value, local_error }
    }

    pub(crate) const fn clean(value: T) -> Self {
        Self::new(value, None)
    }

    /// Borrows the value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Discards any local failure and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The local write failure, if any.
    #[must_use]
    pub const fn local_error(&self) -> Option<&LocalPersistenceError> {
        self.local_error.as_ref()
    }

    /// Whether the store reflects the remote change.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.local_error.is_none()
    }

    /// Splits into the value and the local failure.
    pub fn into_parts(self) -> (T, Option<LocalPersistenceError>) {
        (self.value, self.local_error)
    }

    /// Keeps `earlier` as the reported failure when there is one.
    pub(crate) fn after(mut self, earlier: Option<LocalPersistenceError>) -> Self {
        if earlier.is_some() {
            self.local_error = earlier;
        }
        self
    }

    /// Maps the value, keeping the local failure.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        Persisted::new(f(self.value), self.local_error)
    }
}
