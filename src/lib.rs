//! ECG FHIR Bridge - biosignal recordings to FHIR Observation resources.
//!
//! This library converts raw biosignal recordings (binary time-series
//! containers produced by an acquisition device) into FHIR Observation
//! collections, one timestamped record per sample.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ECG FHIR Bridge                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Container  │──▶│  Extractor  │──▶│   Mapper    │       │
//! │  │  (BSR read) │   │ (channel +  │   │ (timestamps │       │
//! │  │             │   │  sequence)  │   │  + schema)  │       │
//! │  └─────────────┘   └─────────────┘   └──────┬──────┘       │
//! │                                             ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │ HTTP server │◀────────────────────│  JSON file  │       │
//! │  │ (stats API) │                     │ (ordered)   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conversion is a pure, single-pass batch transform: extraction and
//! mapping build the whole collection in memory, then serialization
//! writes it out in one step. Re-running over the same input reproduces
//! the output byte for byte.
//!
//! # Example
//!
//! ```no_run
//! use ecg_fhir_bridge::{
//!     core::{map_to_observations, write_collection, extract, SamplingContext, SignalCode},
//! };
//! use std::path::Path;
//!
//! # fn main() -> ecg_fhir_bridge::Result<()> {
//! let data = extract(Path::new("session.bsr"), "98:D3:21:FC:8B:12", "channel_2", "nSeq")?;
//! let sampling = SamplingContext::new(100.0, "2024-12-23T00:00:00Z".parse().unwrap())?;
//! let observations = map_to_observations(&data, &sampling, "Patient/1", &SignalCode::ecg())?;
//! write_collection(&observations, Path::new("output/fhir_observations.json"))?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod container;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod simulate;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::Config;
pub use container::{Recording, RecordingWriter};
pub use crate::core::{
    extract, map_to_observations, write_collection, ChannelData, Observation, SamplingContext,
    SignalCode, TimeBase, TimestampPolicy,
};
pub use error::{BridgeError, Result};
pub use pipeline::{discover_container, ConversionReport, ConversionRequest};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
