//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] extension point, the fan-out
//! [`SubscriberSet`] that drives every subscriber from its own queue, and the
//! built-in subscribers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor / pumps ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                        │
//!                                                        ▼
//!                                                  SubscriberSet::emit
//!                                        ┌───────────────┼───────────────┐
//!                                        ▼               ▼               ▼
//!                               ObserverSubscriber   LogWriter        Custom ...
//!                                        │
//!                          WorkerObserver::on_state_change / on_status_change
//! ```
//!
//! ## Built-in subscribers
//! - [`ObserverSubscriber`] adapts a [`WorkerObserver`] (the host application's callbacks)
//! - [`LogWriter`] renders events as `tracing` records (feature `logging`)

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::{ObserverSubscriber, WorkerObserver};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
