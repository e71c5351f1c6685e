//! Writing BSR recordings.
//!
//! The writer collects groups and datasets in memory and streams the
//! container out in one pass. Group and dataset counts are written from
//! the collected structure, so the on-disk directory never needs
//! backpatching.

use crate::container::{ScalarType, FILE_EXTENSION, FORMAT_VERSION, MAGIC};
use crate::error::{BridgeError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Builder for a recording file.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    groups: Vec<GroupBuilder>,
}

/// Datasets accumulated for one group.
#[derive(Debug)]
pub struct GroupBuilder {
    path: String,
    datasets: Vec<(String, ScalarType, Vec<u8>)>,
}

impl RecordingWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the group with the given path.
    pub fn group(&mut self, path: &str) -> &mut GroupBuilder {
        if let Some(idx) = self.groups.iter().position(|g| g.path == path) {
            return &mut self.groups[idx];
        }
        self.groups.push(GroupBuilder {
            path: path.to_string(),
            datasets: Vec::new(),
        });
        self.groups.last_mut().unwrap()
    }

    /// Write the recording to `path`, creating parent directories as
    /// needed. The buffer is flushed before returning.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BridgeError::Io(format!("creating {parent:?}: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| BridgeError::Io(format!("creating {path:?}: {e}")))?;
        let mut out = BufWriter::new(file);

        out.write_all(&MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;
        out.write_all(&(self.groups.len() as u16).to_le_bytes())?;

        for group in &self.groups {
            write_string(&mut out, &group.path)?;
            out.write_all(&(group.datasets.len() as u16).to_le_bytes())?;
            for (name, dtype, data) in &group.datasets {
                write_string(&mut out, name)?;
                out.write_all(&[dtype.code()])?;
                let len = data.len() / dtype.size();
                out.write_all(&(len as u64).to_le_bytes())?;
                out.write_all(data)?;
            }
        }

        out.flush()?;
        Ok(())
    }
}

impl GroupBuilder {
    /// Add an `f64` dataset.
    pub fn dataset_f64(&mut self, name: &str, values: &[f64]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::F64, data)
    }

    /// Add an `f32` dataset.
    pub fn dataset_f32(&mut self, name: &str, values: &[f32]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::F32, data)
    }

    /// Add an `i16` dataset.
    pub fn dataset_i16(&mut self, name: &str, values: &[i16]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::I16, data)
    }

    /// Add an `i64` dataset.
    pub fn dataset_i64(&mut self, name: &str, values: &[i64]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::I64, data)
    }

    /// Add a `u16` dataset.
    pub fn dataset_u16(&mut self, name: &str, values: &[u16]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::U16, data)
    }

    /// Add a `u32` dataset.
    pub fn dataset_u32(&mut self, name: &str, values: &[u32]) -> &mut Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, ScalarType::U32, data)
    }

    fn push(&mut self, name: &str, dtype: ScalarType, data: Vec<u8>) -> &mut Self {
        self.datasets.push((name.to_string(), dtype, data));
        self
    }
}

/// Default recording filename for a device, e.g. `session_AA-BB.bsr`.
pub fn default_filename(device_id: &str) -> String {
    format!("session_{}.{FILE_EXTENSION}", device_id.replace(':', "-"))
}

fn write_string(out: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(BridgeError::InvalidParameter(format!(
            "name too long ({} bytes)",
            bytes.len()
        )));
    }
    out.write_all(&(bytes.len() as u16).to_le_bytes())?;
    out.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Recording;

    #[test]
    fn test_writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("s.bsr");

        let mut writer = RecordingWriter::new();
        writer.group("dev/raw").dataset_f64("channel_2", &[1.5]);
        writer.write_to(&path).unwrap();

        assert!(path.exists());
        let recording = Recording::open(&path).unwrap();
        assert_eq!(recording.groups().len(), 1);
    }

    #[test]
    fn test_group_is_reused_by_path() {
        let mut writer = RecordingWriter::new();
        writer.group("dev/raw").dataset_f64("a", &[1.0]);
        writer.group("dev/raw").dataset_u16("b", &[2]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bsr");
        writer.write_to(&path).unwrap();

        let recording = Recording::open(&path).unwrap();
        let group = recording.group("dev/raw").unwrap();
        assert_eq!(group.datasets().len(), 2);
    }

    #[test]
    fn test_default_filename_escapes_mac_colons() {
        let name = default_filename("98:D3:21:FC:8B:12");
        assert_eq!(name, "session_98-D3-21-FC-8B-12.bsr");
    }
}
