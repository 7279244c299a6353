//! Adapter implementations of the port traits.
//!
//! - `live`: real disk and network access.
//! - `recording`: wraps live adapters and captures interactions to cassettes.
//! - `replaying`: serves previously captured interactions back in order.

pub mod live;
pub mod recording;
pub mod replaying;
