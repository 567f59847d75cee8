use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CloudIoError, PointBuffer, Result, SensorPose};

/// Encoding of the point records within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataEncoding {
    Ascii = 0,
    Binary = 1,
}

/// Header information of a point cloud file, as determined by `FileReader::probe`
#[derive(Debug, Clone, PartialEq)]
pub struct CloudHeader {
    /// Acquisition pose of the sensor, or the default pose if the format carries none
    pub pose: SensorPose,
    pub file_version: u32,
    pub encoding: DataEncoding,
    /// Byte offset within the file at which the point records start
    pub data_index: u64,
    /// Number of points in the file (`width * height` of the probed buffer)
    pub record_count: usize,
}

/// Base trait for all point cloud file readers
///
/// Reading happens in two phases: `probe` only reads the header of a file and declares the schema
/// and dimensions of `cloud`, `load` additionally fills `cloud` with the point records. Both
/// operations replace `cloud` only on success. If they fail, `cloud` is left as it was.
///
/// `offset` is the byte offset within the file at which the actual file contents begin. This
/// allows reading files that are embedded in containers with fixed-size headers, e.g. entries of a
/// TAR archive, which are preceded by a 512 byte header
pub trait FileReader {
    fn probe(&self, path: &Path, cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader>;
    fn load(&self, path: &Path, cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader>;
}

/// Base trait for all point cloud file writers
pub trait FileWriter {
    /// Write `cloud` and the sensor `pose` to a new file at `path`. Existing files are truncated
    fn save(
        &self,
        path: &Path,
        cloud: &PointBuffer,
        pose: &SensorPose,
        encoding: DataEncoding,
    ) -> Result<()>;
}

/// Makes sure that `path` exists and has exactly the extension `expected`, so `scan.XYZ` does not
/// match `xyz`. This does not read any file contents
pub(crate) fn check_input_path(path: &Path, expected: &'static str) -> Result<()> {
    if !path.exists() {
        return Err(CloudIoError::NotFound(path.to_path_buf()));
    }
    let has_extension = path
        .extension()
        .map(|ext| ext.to_str() == Some(expected))
        .unwrap_or(false);
    if !has_extension {
        return Err(CloudIoError::BadExtension {
            path: path.to_path_buf(),
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_check_input_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let lower = dir.path().join("scan.xyz");
        std::fs::write(&lower, "1 2 3\n")?;
        check_input_path(&lower, "xyz")?;

        let upper = dir.path().join("scan.XYZ");
        std::fs::write(&upper, "1 2 3\n")?;
        assert!(matches!(
            check_input_path(&upper, "xyz"),
            Err(CloudIoError::BadExtension { expected: "xyz", .. })
        ));

        let wrong = dir.path().join("scan.txt");
        std::fs::write(&wrong, "1 2 3\n")?;
        assert!(matches!(
            check_input_path(&wrong, "xyz"),
            Err(CloudIoError::BadExtension { expected: "xyz", .. })
        ));

        let no_extension = dir.path().join("scan");
        std::fs::write(&no_extension, "1 2 3\n")?;
        assert!(matches!(
            check_input_path(&no_extension, "xyz"),
            Err(CloudIoError::BadExtension { .. })
        ));

        let missing = dir.path().join("missing.xyz");
        assert!(matches!(
            check_input_path(&missing, "xyz"),
            Err(CloudIoError::NotFound(_))
        ));
        Ok(())
    }
}
