//! Keeps locally recorded topics in step with a remote pub/sub provider and
//! turns verified webhook deliveries into internal events.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod dispatcher;
mod error;
mod event;
mod manager;
mod reference;

pub use dispatcher::{Delivery, NotificationDispatcher};
pub use error::{BoxError, Error, LocalPersistenceError, Persisted, Result};
pub use event::{
    BroadcastError, BroadcastEventSink, EventSink, EventSinkError, InboundEvent,
    NOTIFICATION_EVENT,
};
pub use manager::{BulkReport, TopicManager, TopicManagerOptions};
pub use reference::{TopicRef, resolve};
