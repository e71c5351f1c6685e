//! FHIR Observation mapping and serialization.
//!
//! The structs here mirror the target schema field-for-field; nothing is
//! added or renamed on the wire. Each input sample becomes exactly one
//! Observation, in input order, with a deterministic position-derived id,
//! so re-running a conversion over the same input reproduces the output
//! byte for byte.

use crate::core::extract::ChannelData;
use crate::core::timebase::{format_instant, SamplingContext};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Status stamped on every emitted observation.
pub const OBSERVATION_STATUS: &str = "final";

/// FHIR observation-category system URI.
pub const CATEGORY_SYSTEM: &str = "http://hl7.org/fhir/observation-category";

/// Category code for vital-sign observations.
pub const CATEGORY_VITAL_SIGNS: &str = "vital-signs";

/// LOINC code system URI.
pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// UCUM unit system URI.
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// Fixed code and unit descriptor identifying a signal type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalCode {
    /// LOINC code, e.g. `85354-9`.
    pub code: String,
    /// Display name, e.g. `ECG`.
    pub display: String,
    /// UCUM unit, e.g. `mV`.
    pub unit: String,
}

impl SignalCode {
    /// The ECG descriptor used by the original acquisition pipeline.
    pub fn ecg() -> Self {
        Self {
            code: "85354-9".to_string(),
            display: "ECG".to_string(),
            unit: "mV".to_string(),
        }
    }
}

impl Default for SignalCode {
    fn default() -> Self {
        Self::ecg()
    }
}

/// A single coding entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A codeable concept wrapping one or more codings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

/// A reference to another resource, e.g. `Patient/1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

/// A measured quantity with unit metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
    pub system: String,
    pub code: String,
}

/// One emitted observation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub resource_type: String,
    pub id: String,
    pub status: String,
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    pub effective_date_time: String,
    pub value_quantity: Quantity,
}

/// Map aligned channel data into an ordered observation collection.
///
/// One record per sample, in input order; ids are the 0-based positions
/// rendered as decimal strings; values pass through unchanged. Fails with
/// `InvalidParameter` when the channel is empty (the rate is validated
/// when the [`SamplingContext`] is constructed). Duplicate sequence
/// numbers are passed through, producing records that share a timestamp.
pub fn map_to_observations(
    data: &ChannelData,
    sampling: &SamplingContext,
    subject_ref: &str,
    code: &SignalCode,
) -> Result<Vec<Observation>> {
    if data.is_empty() {
        return Err(BridgeError::InvalidParameter(
            "cannot map an empty channel".to_string(),
        ));
    }
    if data.samples.len() != data.indices.len() {
        return Err(BridgeError::Format(format!(
            "samples ({}) and indices ({}) differ in length",
            data.samples.len(),
            data.indices.len()
        )));
    }

    let observations = data
        .samples
        .iter()
        .zip(&data.indices)
        .enumerate()
        .map(|(position, (&value, &index))| Observation {
            resource_type: "Observation".to_string(),
            id: position.to_string(),
            status: OBSERVATION_STATUS.to_string(),
            category: vec![CodeableConcept {
                coding: vec![Coding {
                    system: CATEGORY_SYSTEM.to_string(),
                    code: CATEGORY_VITAL_SIGNS.to_string(),
                    display: None,
                }],
            }],
            code: CodeableConcept {
                coding: vec![Coding {
                    system: LOINC_SYSTEM.to_string(),
                    code: code.code.clone(),
                    display: Some(code.display.clone()),
                }],
            },
            subject: Reference {
                reference: subject_ref.to_string(),
            },
            effective_date_time: format_instant(sampling.instant_for(index, position)),
            value_quantity: Quantity {
                value,
                unit: code.unit.clone(),
                system: UCUM_SYSTEM.to_string(),
                code: code.unit.clone(),
            },
        })
        .collect();

    Ok(observations)
}

/// Serialize the collection and write it to `path`.
///
/// The JSON text is fully rendered in memory before the sink is created,
/// so a failed run never leaves a partial file behind. Parent directories
/// are created as needed. Returns the number of bytes written.
pub fn write_collection(observations: &[Observation], path: &Path) -> Result<u64> {
    let json = serde_json::to_string_pretty(observations)
        .map_err(|e| BridgeError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BridgeError::Io(format!("creating {parent:?}: {e}")))?;
    }
    std::fs::write(path, &json).map_err(|e| BridgeError::Io(format!("writing {path:?}: {e}")))?;

    Ok(json.len() as u64)
}
