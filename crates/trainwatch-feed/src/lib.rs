//! PPM/TD/TM payload decoders and the registry binding STOMP destinations
//! to them.
//!
//! This crate is where rail-specific knowledge lives: `trainwatch-stomp`
//! only knows about frames and destinations, `trainwatch-store` only knows
//! about documents. [`FeedDispatcher`] is the glue — it implements
//! [`trainwatch_stomp::FeedCallbacks`] by routing each destination to the
//! [`FeedDecoder`] registered for it.

mod decoder;
mod dispatcher;
mod error;
mod json;
mod ppm;
mod registry;
mod td;
mod time_util;
mod tm;

pub use decoder::FeedDecoder;
pub use dispatcher::FeedDispatcher;
pub use error::DecodeError;
pub use ppm::PpmDecoder;
pub use registry::{known_feeds, FeedDescriptor, FeedKind};
pub use td::TdDecoder;
pub use tm::TmDecoder;
