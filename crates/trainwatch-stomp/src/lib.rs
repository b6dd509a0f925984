//! STOMP 1.2 transport: a frame codec plus the durable-subscription
//! connection state machine.
//!
//! This crate knows nothing about rail-specific message shapes; it hands
//! raw destination/body pairs to whatever [`FeedCallbacks`] it is given.
//! Decoding PPM/TD/TM payloads lives in `trainwatch-feed`.

mod codec;
mod error;
mod frame;
mod manager;

pub use codec::StompCodec;
pub use error::StompError;
pub use frame::{StompEvent, StompFrame};
pub use manager::{ConnectConfig, ConnectionState, FeedCallbacks, FeedManager, Subscription};
