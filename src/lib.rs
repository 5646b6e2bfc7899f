//! # orderflow
//!
//! Transactional order intake with an AMQP-driven processing pipeline.
//!
//! The producer side accepts order-creation requests over HTTP, persists the
//! order and its line items in a single Postgres transaction, and then
//! publishes an `order.created` event to a topic exchange. The consumer side
//! binds a durable queue to that exchange and transitions each order to its
//! processed state, acknowledging a message only after the transition has
//! committed.
//!
//! Delivery is at-least-once end to end: the processing transition is
//! idempotent by construction, so redelivered events converge on the same
//! final state.
//!
//! ## Architecture
//!
//! - [`store`]: durable order state behind the [`store::OrderStore`] trait
//! - [`publisher`]: `order.created` publication behind
//!   [`publisher::EventPublisher`]
//! - [`service`]: producer orchestration (commit, then publish)
//! - [`consumer`] + [`processor`]: durable subscription and the
//!   `NEW` to `PROCESSED` transition
//! - [`server`]: the axum HTTP surface
//!
//! Two binaries wire these together: `orderflow-api` (HTTP producer) and
//! `orderflow-worker` (queue consumer).

pub mod config;
pub mod consumer;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod processor;
pub mod publisher;
pub mod server;
pub mod service;
pub mod store;
pub mod testing;
