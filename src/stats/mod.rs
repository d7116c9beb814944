//! # Runtime statistics of the current worker instance.
//!
//! - [`LogBuffer`] bounded text log, pruned from the front on line boundaries
//! - [`RuntimeStats`] accepted-share counter, speed string and log, guarded by
//!   one mutex in the supervisor
//! - [`StatsSnapshot`] owned copy handed to readers

mod log_buffer;
mod runtime;

pub use log_buffer::LogBuffer;
pub use runtime::{RuntimeStats, StatsSnapshot};
