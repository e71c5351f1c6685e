//! Core conversion pipeline: extraction, time base, observation mapping.
//!
//! Everything here is a pure, single-pass transform. The only sequencing
//! constraint is that extraction runs before mapping; there is no state
//! carried between runs.

pub mod extract;
pub mod observation;
pub mod timebase;

pub use extract::{extract, ChannelData};
pub use observation::{map_to_observations, write_collection, Observation, SignalCode};
pub use timebase::{format_instant, SamplingContext, TimeBase, TimestampPolicy};
