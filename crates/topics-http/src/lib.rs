//! HTTP surface for topic management: the provider's webhook plus a JSON API
//! for creating, subscribing, toggling and publishing to topics.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod handlers;
mod router;
mod server;
mod state;

pub use error::Error;
pub use router::{WEBHOOK_PATH, router};
pub use server::TopicsHttpServer;
pub use state::TopicsContext;
