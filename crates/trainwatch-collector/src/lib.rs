//! The Collector: known-berth bootstrap plus the wiring that
//! drives a [`trainwatch_stomp::FeedManager`] with a
//! [`trainwatch_feed::FeedDispatcher`] against a shared store.
//!
//! The binary in `src/main.rs` is a thin wrapper around [`bootstrap::run`]
//! and the feed manager's own `run` loop; this library module exists so the
//! wiring can be exercised from tests without a real STOMP broker.

pub mod bootstrap;
