//! Scripting boundary of the streamer.
//!
//! Native confirmations reported by the host (checkpoint entry, pickups,
//! object edits, weapon hits) are turned into state transitions on the
//! [`streamer_stream::Streamer`] and then fanned out, as [`ScriptEvent`]s
//! naming dynamic ids, to every registered [`ScriptSink`] in registration
//! order.
//!
//! # Invariants
//! - Scripts only ever see dynamic ids; native slots never cross this boundary.
//! - Confirmations the streamer ignores produce no script event.
//! - Each event follows its own [`Propagation`] policy.

mod dispatch;
mod event;
mod host;

pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher, ScriptSink};
pub use event::{EditResponse, Propagation, ScriptEvent};
pub use host::{BulletHit, Host};

pub fn crate_info() -> &'static str {
    "streamer-callbacks v0.1.0"
}
