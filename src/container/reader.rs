//! Read-only access to BSR recordings.
//!
//! `Recording::open` parses the whole container up front and releases the
//! file handle before returning, so a successfully opened recording can
//! never hold the file open past any exit path. A recording the size of a
//! typical session fits comfortably in memory; the original acquisition
//! tooling loads full channels the same way.

use crate::container::{ScalarType, FORMAT_VERSION, MAGIC};
use crate::error::{BridgeError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A parsed recording: an ordered list of groups keyed by path.
#[derive(Debug)]
pub struct Recording {
    groups: Vec<Group>,
}

/// A named group of datasets, e.g. `"98:D3:21:FC:8B:12/raw"`.
#[derive(Debug)]
pub struct Group {
    path: String,
    datasets: Vec<Dataset>,
}

/// A one-dimensional numeric dataset.
#[derive(Debug)]
pub struct Dataset {
    name: String,
    dtype: ScalarType,
    data: Vec<u8>,
}

impl Recording {
    /// Open and fully parse a recording.
    ///
    /// Fails with `NotFound` when the file does not exist, `Format` when
    /// the container is structurally invalid (bad magic, unknown version
    /// or dtype, truncated payload), and `Io` for other read failures.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotFound(format!("container file {path:?}"))
            } else {
                BridgeError::Io(format!("opening {path:?}: {e}"))
            }
        })?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        read_exact(&mut reader, &mut magic, path)?;
        if magic != MAGIC {
            return Err(BridgeError::Format(format!(
                "{path:?} is not a BSR recording (bad magic)"
            )));
        }

        let version = read_u16(&mut reader, path)?;
        if version != FORMAT_VERSION {
            return Err(BridgeError::Format(format!(
                "{path:?}: unsupported container version {version}"
            )));
        }

        let group_count = read_u16(&mut reader, path)?;
        let mut groups = Vec::with_capacity(group_count as usize);
        for _ in 0..group_count {
            let group_path = read_string(&mut reader, path)?;
            let dataset_count = read_u16(&mut reader, path)?;
            let mut datasets = Vec::with_capacity(dataset_count as usize);
            for _ in 0..dataset_count {
                let name = read_string(&mut reader, path)?;
                let code = read_u8(&mut reader, path)?;
                let dtype = ScalarType::from_code(code).ok_or_else(|| {
                    BridgeError::Format(format!(
                        "{path:?}: dataset '{group_path}/{name}' has unknown dtype code {code}"
                    ))
                })?;
                let len = read_u64(&mut reader, path)? as usize;
                let byte_len = len.checked_mul(dtype.size()).ok_or_else(|| {
                    BridgeError::Format(format!(
                        "{path:?}: dataset '{group_path}/{name}' length overflows"
                    ))
                })?;
                let mut data = vec![0u8; byte_len];
                read_exact(&mut reader, &mut data, path)?;
                datasets.push(Dataset { name, dtype, data });
            }
            groups.push(Group {
                path: group_path,
                datasets,
            });
        }

        Ok(Self { groups })
    }

    /// Resolve a group by its full path.
    pub fn group(&self, path: &str) -> Result<&Group> {
        self.groups
            .iter()
            .find(|g| g.path == path)
            .ok_or_else(|| BridgeError::NotFound(format!("group '{path}'")))
    }

    /// All groups, in file order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}

impl Group {
    /// Full path of this group.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve a dataset by name.
    pub fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| {
                BridgeError::NotFound(format!("dataset '{name}' in group '{}'", self.path))
            })
    }

    /// All datasets, in file order.
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }
}

impl Dataset {
    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// On-disk element type.
    pub fn dtype(&self) -> ScalarType {
        self.dtype
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.size()
    }

    /// Whether the dataset holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode all elements as `f64`, independent of the stored width.
    pub fn as_f64(&self) -> Vec<f64> {
        let size = self.dtype.size();
        self.data
            .chunks_exact(size)
            .map(|chunk| match self.dtype {
                ScalarType::F32 => f32::from_le_bytes(chunk.try_into().unwrap()) as f64,
                ScalarType::F64 => f64::from_le_bytes(chunk.try_into().unwrap()),
                ScalarType::I16 => i16::from_le_bytes(chunk.try_into().unwrap()) as f64,
                ScalarType::I32 => i32::from_le_bytes(chunk.try_into().unwrap()) as f64,
                ScalarType::I64 => i64::from_le_bytes(chunk.try_into().unwrap()) as f64,
                ScalarType::U16 => u16::from_le_bytes(chunk.try_into().unwrap()) as f64,
                ScalarType::U32 => u32::from_le_bytes(chunk.try_into().unwrap()) as f64,
            })
            .collect()
    }

    /// Decode all elements as `i64`.
    ///
    /// Fails with `Format` for floating-point datasets: sequence numbers
    /// are integers, and silently truncating a float channel would hide an
    /// acquisition error.
    pub fn as_i64(&self) -> Result<Vec<i64>> {
        if !self.dtype.is_integer() {
            return Err(BridgeError::Format(format!(
                "dataset '{}' holds {} values, expected an integer type",
                self.name,
                self.dtype.name()
            )));
        }
        let size = self.dtype.size();
        Ok(self
            .data
            .chunks_exact(size)
            .map(|chunk| match self.dtype {
                ScalarType::I16 => i16::from_le_bytes(chunk.try_into().unwrap()) as i64,
                ScalarType::I32 => i32::from_le_bytes(chunk.try_into().unwrap()) as i64,
                ScalarType::I64 => i64::from_le_bytes(chunk.try_into().unwrap()),
                ScalarType::U16 => u16::from_le_bytes(chunk.try_into().unwrap()) as i64,
                ScalarType::U32 => u32::from_le_bytes(chunk.try_into().unwrap()) as i64,
                ScalarType::F32 | ScalarType::F64 => unreachable!(),
            })
            .collect())
    }
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BridgeError::Format(format!("{path:?}: unexpected end of file"))
        } else {
            BridgeError::Io(format!("reading {path:?}: {e}"))
        }
    })
}

fn read_u8(reader: &mut impl Read, path: &Path) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf, path)?;
    Ok(buf[0])
}

fn read_u16(reader: &mut impl Read, path: &Path) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(reader, &mut buf, path)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read, path: &Path) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, path)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_string(reader: &mut impl Read, path: &Path) -> Result<String> {
    let len = read_u16(reader, path)? as usize;
    let mut buf = vec![0u8; len];
    read_exact(reader, &mut buf, path)?;
    String::from_utf8(buf)
        .map_err(|_| BridgeError::Format(format!("{path:?}: name is not valid UTF-8")))
}
