//! Model client abstraction, retry and provider routing.

pub mod client;
pub mod retry;
pub mod router;

pub use client::{ModelClient, OutputBuffer, StreamSink};
pub use retry::RetryingClient;
pub use router::{FallbackClient, Provider, ProviderSelection};
