//! Reader and writer for ASTM E57 files.
//!
//! E57 files can contain multiple scans, each with its own sensor pose and per-point metadata that
//! is described by an XML section. Only the physical file header is parsed here; extracting the scan
//! schema and point data is not implemented, so `probe`, `load` and `save` fail with
//! `CloudIoError::NotImplemented` after validating their inputs.
//!
//! WARNING: E57 files usually store coordinates in double precision, but `PointBuffer` positions
//! and `SensorPose` use 32-bit floats. Point clouds that span large distances with high precision
//! WILL lose precision unless a `point_offset` close to the data is configured.

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    base::check_input_path, narrow_position, CloudHeader, CloudIoError, DataEncoding, FileReader,
    FileWriter, PointBuffer, Result, SensorPose,
};

pub const E57_EXTENSION: &str = "e57";

const E57_SIGNATURE: &[u8; 8] = b"ASTM-E57";
const SUPPORTED_MAJOR_VERSION: u32 = 1;

/// The fixed-size header at the start of every E57 file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E57PhysicalHeader {
    pub major_version: u32,
    pub minor_version: u32,
    pub file_physical_length: u64,
    pub xml_physical_offset: u64,
    pub xml_logical_length: u64,
    pub page_size: u64,
}

impl E57PhysicalHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 48;

    pub fn read_from<R: Read>(mut read: R) -> Result<Self> {
        let mut signature = [0; 8];
        read.read_exact(&mut signature)?;
        if &signature != E57_SIGNATURE {
            return Err(CloudIoError::Format(format!(
                "invalid E57 signature {:?}",
                String::from_utf8_lossy(&signature)
            )));
        }

        let header = Self {
            major_version: read.read_u32::<LittleEndian>()?,
            minor_version: read.read_u32::<LittleEndian>()?,
            file_physical_length: read.read_u64::<LittleEndian>()?,
            xml_physical_offset: read.read_u64::<LittleEndian>()?,
            xml_logical_length: read.read_u64::<LittleEndian>()?,
            page_size: read.read_u64::<LittleEndian>()?,
        };
        if header.major_version != SUPPORTED_MAJOR_VERSION {
            return Err(CloudIoError::Format(format!(
                "unsupported E57 version {}.{}",
                header.major_version, header.minor_version
            )));
        }
        if header.page_size == 0 {
            return Err(CloudIoError::Format("E57 page size is zero".into()));
        }
        if header.xml_physical_offset > header.file_physical_length {
            return Err(CloudIoError::Format(format!(
                "E57 XML section at byte {} starts past the end of the file ({} bytes)",
                header.xml_physical_offset, header.file_physical_length
            )));
        }
        Ok(header)
    }
}

/// Reads the physical header of the E57 file at `path`, which starts `offset` bytes into the file
pub fn read_physical_header(path: &Path, offset: u64) -> Result<E57PhysicalHeader> {
    let mut file = BufReader::new(File::open(path)?);
    file.seek(SeekFrom::Start(offset))?;
    E57PhysicalHeader::read_from(file)
}

/// Configuration of an `E57Reader`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct E57Options {
    /// Index of the scan to read from a file with multiple scans
    pub scan_index: usize,
    /// Number of points to read at once. This only affects performance
    pub read_buffer_size: usize,
    /// Subtracted from all positions before they are narrowed to single precision
    pub point_offset: Vector3<f64>,
}

impl Default for E57Options {
    fn default() -> Self {
        Self {
            scan_index: 0,
            read_buffer_size: 100,
            point_offset: Vector3::zeros(),
        }
    }
}

impl E57Options {
    /// Loads options from a JSON file. Missing entries use their default values
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let options = serde_json::from_reader(BufReader::new(file))?;
        Ok(options)
    }
}

#[derive(Debug, Default, Clone)]
pub struct E57Reader {
    options: E57Options,
}

impl E57Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with the offset that is subtracted from all positions
    pub fn with_point_offset(point_offset: Vector3<f64>) -> Self {
        Self::with_options(E57Options {
            point_offset,
            ..Default::default()
        })
    }

    pub fn with_options(options: E57Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &E57Options {
        &self.options
    }

    pub fn set_point_offset(&mut self, point_offset: Vector3<f64>) {
        self.options.point_offset = point_offset;
    }

    pub fn set_scan_index(&mut self, scan_index: usize) {
        self.options.scan_index = scan_index;
    }

    pub fn set_read_buffer_size(&mut self, read_buffer_size: usize) {
        self.options.read_buffer_size = read_buffer_size;
    }

    /// Converts a double-precision position from the file into the single-precision position stored
    /// in a `PointBuffer`
    pub fn narrow_position(&self, position: &Vector3<f64>) -> Vector3<f32> {
        narrow_position(position, &self.options.point_offset)
    }

    /// Converts a double-precision scan pose into a `SensorPose`, applying the point offset
    pub fn sensor_pose(
        &self,
        origin: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
    ) -> SensorPose {
        SensorPose::from_f64(origin, orientation, &self.options.point_offset)
    }
}

impl FileReader for E57Reader {
    fn probe(&self, path: &Path, _cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader> {
        check_input_path(path, E57_EXTENSION)?;
        let header = read_physical_header(path, offset)?;
        debug!(
            "E57 file {} (version {}.{}, XML section at byte {}), requested scan {}",
            path.display(),
            header.major_version,
            header.minor_version,
            offset.saturating_add(header.xml_physical_offset),
            self.options.scan_index
        );
        Err(CloudIoError::NotImplemented(
            "reading the scan schema of E57 files",
        ))
    }

    fn load(&self, path: &Path, cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader> {
        let mut loaded = PointBuffer::new();
        let header = self.probe(path, &mut loaded, offset)?;
        *cloud = loaded;
        Ok(header)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct E57Writer;

impl E57Writer {
    pub fn new() -> Self {
        Self
    }
}

impl FileWriter for E57Writer {
    fn save(
        &self,
        _path: &Path,
        _cloud: &PointBuffer,
        _pose: &SensorPose,
        _encoding: DataEncoding,
    ) -> Result<()> {
        Err(CloudIoError::NotImplemented("writing E57 files"))
    }
}
