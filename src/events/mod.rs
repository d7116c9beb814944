//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the supervisor and the three
//! per-instance loops (output pump, input pump, exit monitor).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (start/stop sequence), output pump (status),
//!   input pump (dropped input), exit monitor (state, exit), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumer**: `Supervisor::subscriber_listener()`, which fans out to the
//!   `SubscriberSet` (observer adapter, `LogWriter`, user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
