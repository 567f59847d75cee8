use std::path::Path;

use crate::{
    e57::{E57Reader, E57Writer, E57_EXTENSION},
    xyz::{XyzReader, XyzWriter, XYZ_EXTENSION},
    CloudHeader, CloudIoError, DataEncoding, FileReader, FileWriter, PointBuffer, Result,
    SensorPose,
};

/// Supported point cloud file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Xyz,
    E57,
}

impl FileFormat {
    /// Determines the file format from the extension of `path`. Extensions are case-sensitive
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(XYZ_EXTENSION) => Ok(FileFormat::Xyz),
            Some(E57_EXTENSION) => Ok(FileFormat::E57),
            _ => Err(CloudIoError::BadExtension {
                path: path.to_path_buf(),
                expected: "xyz|e57",
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Xyz => XYZ_EXTENSION,
            FileFormat::E57 => E57_EXTENSION,
        }
    }

    pub fn reader(&self) -> Box<dyn FileReader> {
        match self {
            FileFormat::Xyz => Box::new(XyzReader::new()),
            FileFormat::E57 => Box::new(E57Reader::new()),
        }
    }

    pub fn writer(&self) -> Box<dyn FileWriter> {
        match self {
            FileFormat::Xyz => Box::new(XyzWriter::new()),
            FileFormat::E57 => Box::new(E57Writer::new()),
        }
    }
}

/// Reads the point cloud file at `path` with the reader for its file format
pub fn read_cloud(path: &Path) -> Result<(PointBuffer, CloudHeader)> {
    let reader = FileFormat::from_path(path)?.reader();
    let mut cloud = PointBuffer::new();
    let header = reader.load(path, &mut cloud, 0)?;
    Ok((cloud, header))
}

/// Writes `cloud` to `path` with the writer for the file format of `path`
pub fn write_cloud(
    path: &Path,
    cloud: &PointBuffer,
    pose: &SensorPose,
    encoding: DataEncoding,
) -> Result<()> {
    FileFormat::from_path(path)?
        .writer()
        .save(path, cloud, pose, encoding)
}
