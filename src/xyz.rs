use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, ErrorKind, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, trace, warn};

use crate::{
    base::check_input_path, layout::FieldDatatype, CloudHeader, CloudIoError, DataEncoding,
    FileReader, FileWriter, PointBuffer, Result, SensorPose,
};

pub const XYZ_EXTENSION: &str = "xyz";

const COMMENT_MARKER: char = '#';
const POINT_STEP: usize = 12;
const COORDINATE_FIELDS: [&str; 3] = ["x", "y", "z"];

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ' ' | '\t' | '\r' | '\n')
}

/// Splits a line into the three coordinate tokens of a point record. Returns `None` for empty lines,
/// comments and lines that don't have exactly three tokens
fn record_tokens(line: &str) -> Option<[&str; 3]> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return None;
    }
    let mut tokens = line.split(is_separator).filter(|token| !token.is_empty());
    let x = tokens.next()?;
    let y = tokens.next()?;
    let z = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some([x, y, z])
}

/// Tokens that are not valid numbers are read as zero
fn parse_coordinate(token: &str) -> f32 {
    token.parse::<f32>().unwrap_or_else(|_| {
        trace!("Could not parse coordinate `{}`, using 0", token);
        0.0
    })
}

/// Calls `on_record` for each point record in `read`, in file order. Returns the number of records
fn scan_records<R: BufRead, F: FnMut([&str; 3]) -> Result<()>>(
    mut read: R,
    mut on_record: F,
) -> Result<usize> {
    let mut line = Vec::new();
    let mut count = 0;
    loop {
        line.clear();
        if read.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        if let Some(tokens) = record_tokens(&text) {
            on_record(tokens)?;
            count += 1;
        }
    }
    Ok(count)
}

fn open_at(path: &Path, offset: u64) -> Result<BufReader<File>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    Ok(BufReader::new(file))
}

fn xyz_point_buffer() -> Result<PointBuffer> {
    let mut buffer = PointBuffer::new();
    for (idx, name) in COORDINATE_FIELDS.iter().enumerate() {
        buffer.add_field(*name, FieldDatatype::Float32, 1, idx * 4)?;
    }
    Ok(buffer)
}

/// Reader for ASCII files with one `x y z` point per line. Coordinates can be separated by any
/// combination of commas and whitespace, lines starting with `#` are comments. Lines that don't have
/// exactly three coordinates are skipped.
///
/// Points whose coordinates are all zero are considered invalid and are read as `NaN` for all three
/// coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct XyzReader;

impl XyzReader {
    pub fn new() -> Self {
        Self
    }
}

impl FileReader for XyzReader {
    fn probe(&self, path: &Path, cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader> {
        check_input_path(path, XYZ_EXTENSION)?;

        let mut probed = xyz_point_buffer()?;
        let record_count = scan_records(open_at(path, offset)?, |_| Ok(()))?;
        probed.resize_storage(POINT_STEP, record_count, 1)?;
        debug!(
            "Found {} points in XYZ file {}",
            record_count,
            path.display()
        );

        *cloud = probed;
        Ok(CloudHeader {
            pose: SensorPose::default(),
            file_version: 0,
            encoding: DataEncoding::Ascii,
            data_index: offset,
            record_count,
        })
    }

    fn load(&self, path: &Path, cloud: &mut PointBuffer, offset: u64) -> Result<CloudHeader> {
        let mut loaded = PointBuffer::new();
        let header = self.probe(path, &mut loaded, offset)?;

        let capacity = loaded.record_count();
        let mut num_invalid = 0;
        let num_read = {
            let loaded = &mut loaded;
            let num_invalid = &mut num_invalid;
            let mut index = 0;
            scan_records(open_at(path, offset)?, move |tokens| {
                if index >= capacity {
                    return Err(file_changed_error(path));
                }
                let mut position = [
                    parse_coordinate(tokens[0]),
                    parse_coordinate(tokens[1]),
                    parse_coordinate(tokens[2]),
                ];
                if position.iter().all(|coordinate| *coordinate == 0.0) {
                    position = [f32::NAN; 3];
                    *num_invalid += 1;
                }
                for (name, coordinate) in COORDINATE_FIELDS.iter().zip(position.iter()) {
                    loaded.set_value(index, name, 0, *coordinate)?;
                }
                index += 1;
                Ok(())
            })?
        };
        if num_read != capacity {
            return Err(file_changed_error(path));
        }

        if num_invalid > 0 {
            debug!(
                "{} of {} points in {} are invalid",
                num_invalid,
                num_read,
                path.display()
            );
        }
        loaded.set_dense(num_invalid == 0);
        *cloud = loaded;
        Ok(header)
    }
}

fn file_changed_error(path: &Path) -> CloudIoError {
    CloudIoError::Io(std::io::Error::new(
        ErrorKind::InvalidData,
        format!(
            "number of points in {} changed while reading",
            path.display()
        ),
    ))
}

/// Writer for ASCII XYZ files. The `PointBuffer` must have `Float32` fields named `x`, `y` and `z`.
/// Points whose coordinates are all `NaN` are written as `0 0 0`, which `XyzReader` reads back as an
/// invalid point. Points with only some `NaN` coordinates are written as they are
#[derive(Debug, Default, Clone, Copy)]
pub struct XyzWriter;

impl XyzWriter {
    pub fn new() -> Self {
        Self
    }
}

impl FileWriter for XyzWriter {
    fn save(
        &self,
        path: &Path,
        cloud: &PointBuffer,
        pose: &SensorPose,
        encoding: DataEncoding,
    ) -> Result<()> {
        if encoding == DataEncoding::Binary {
            return Err(CloudIoError::NotImplemented("binary encoding of XYZ files"));
        }
        for name in COORDINATE_FIELDS.iter() {
            match cloud.field(name) {
                Some(field) if field.datatype == FieldDatatype::Float32 => {}
                _ => {
                    return Err(CloudIoError::SchemaError(format!(
                        "XYZ files require a Float32 field `{name}`"
                    )))
                }
            }
        }
        if !pose.is_default() {
            warn!(
                "XYZ files can't store a sensor pose, the pose is not written to {}",
                path.display()
            );
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for index in 0..cloud.record_count() {
            let x = cloud.get_value::<f32>(index, "x", 0)?;
            let y = cloud.get_value::<f32>(index, "y", 0)?;
            let z = cloud.get_value::<f32>(index, "z", 0)?;
            if x.is_nan() && y.is_nan() && z.is_nan() {
                writeln!(writer, "0 0 0")?;
            } else {
                writeln!(writer, "{} {} {}", x, y, z)?;
            }
        }
        writer.flush()?;

        debug!(
            "Wrote {} points to XYZ file {}",
            cloud.record_count(),
            path.display()
        );
        Ok(())
    }
}
