//! Developer tooling: read-only inspection of a running streamer.
//!
//! # Invariants
//! - Inspection never mutates streamer state.

mod inspector;

pub use inspector::{ItemInfo, PlayerInfo, StreamerInspector, StreamerSummary};

pub fn crate_info() -> &'static str {
    "streamer-tools v0.1.0"
}
