//! Demonstration of the recording-to-FHIR conversion pipeline.
//!
//! This example shows how to:
//! 1. Generate a synthetic ECG recording
//! 2. Extract the channel and its sequence numbers
//! 3. Map the samples to FHIR Observations
//! 4. Write the collection to disk
//!
//! Run with: cargo run --example convert_demo

use ecg_fhir_bridge::{
    core::{extract, map_to_observations, write_collection, SamplingContext, SignalCode},
    simulate,
};

fn main() -> ecg_fhir_bridge::Result<()> {
    println!("ECG FHIR Bridge - Conversion Demo");
    println!("=================================");
    println!();

    let dir = std::env::temp_dir().join("ecg-bridge-demo");
    let recording = dir.join("session.bsr");
    let output = dir.join("fhir_observations.json");

    // Generate ten seconds of synthetic ECG at 100 Hz.
    let device = "98:D3:21:FC:8B:12";
    let n = simulate::write_recording(&recording, device, "channel_2", "nSeq", 100.0, 10.0)?;
    println!("Generated {n} samples into {recording:?}");

    // Extract and map.
    let data = extract(&recording, device, "channel_2", "nSeq")?;
    let sampling = SamplingContext::new(100.0, chrono::Utc::now())?;
    let observations = map_to_observations(&data, &sampling, "Patient/1", &SignalCode::ecg())?;

    println!("Mapped {} observations", observations.len());
    println!(
        "First record: id={} at {} ({} {})",
        observations[0].id,
        observations[0].effective_date_time,
        observations[0].value_quantity.value,
        observations[0].value_quantity.unit,
    );

    // Serialize.
    let bytes = write_collection(&observations, &output)?;
    println!("Wrote {bytes} bytes to {output:?}");

    Ok(())
}
