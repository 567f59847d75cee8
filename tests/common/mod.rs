use std::{
    fmt::Write as _,
    ops::Range,
    path::{Path, PathBuf},
};

use anyhow::Result;
use cloud_io::{FieldDatatype, PointBuffer};
use rand::{thread_rng, Rng};

pub const POSITION_RANGE: Range<f32> = -1024.0..1024.0;
pub const SEPARATORS: [&str; 4] = [" ", ",", "\t", " , "];

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Creates an empty buffer with the default `x`, `y`, `z` layout of XYZ files and room for `count` points
pub fn xyz_buffer(count: usize) -> Result<PointBuffer> {
    let mut buffer = PointBuffer::new();
    buffer.add_field("x", FieldDatatype::Float32, 1, 0)?;
    buffer.add_field("y", FieldDatatype::Float32, 1, 4)?;
    buffer.add_field("z", FieldDatatype::Float32, 1, 8)?;
    buffer.resize_storage(12, count, 1)?;
    Ok(buffer)
}

pub fn set_position(buffer: &mut PointBuffer, index: usize, position: [f32; 3]) -> Result<()> {
    buffer.set_value(index, "x", 0, position[0])?;
    buffer.set_value(index, "y", 0, position[1])?;
    buffer.set_value(index, "z", 0, position[2])?;
    Ok(())
}

pub fn get_position(buffer: &PointBuffer, index: usize) -> Result<[f32; 3]> {
    Ok([
        buffer.get_value::<f32>(index, "x", 0)?,
        buffer.get_value::<f32>(index, "y", 0)?,
        buffer.get_value::<f32>(index, "z", 0)?,
    ])
}

/// Generate `count` random positions
pub fn gen_random_positions(count: usize) -> Vec<[f32; 3]> {
    let mut rng = thread_rng();
    (0..count)
        .map(|_| {
            [
                rng.gen_range(POSITION_RANGE),
                rng.gen_range(POSITION_RANGE),
                rng.gen_range(POSITION_RANGE),
            ]
        })
        .collect()
}

/// Generate a buffer with `count` random points
pub fn gen_random_points(count: usize) -> Result<PointBuffer> {
    let mut buffer = xyz_buffer(count)?;
    for (index, position) in gen_random_positions(count).into_iter().enumerate() {
        set_position(&mut buffer, index, position)?;
    }
    Ok(buffer)
}

/// Writes `positions` as an XYZ file with randomly chosen separators between the coordinates
pub fn write_xyz_file(dir: &Path, name: &str, positions: &[[f32; 3]]) -> Result<PathBuf> {
    let mut rng = thread_rng();
    let mut contents = String::new();
    for position in positions {
        let separator = SEPARATORS[rng.gen_range(0..SEPARATORS.len())];
        writeln!(
            contents,
            "{}{sep}{}{sep}{}",
            position[0],
            position[1],
            position[2],
            sep = separator
        )?;
    }
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Asserts that the positions in `actual` match `expected`. Points with a `NaN` coordinate in
/// `expected` must be `NaN` in all coordinates in `actual`
pub fn assert_positions_match(expected: &[[f32; 3]], actual: &PointBuffer) -> Result<()> {
    assert_eq!(expected.len(), actual.record_count());
    for (index, expected_position) in expected.iter().enumerate() {
        let actual_position = get_position(actual, index)?;
        if expected_position.iter().any(|c| c.is_nan()) {
            assert!(
                actual_position.iter().all(|c| c.is_nan()),
                "Expected invalid point at index {} but found {:?}",
                index,
                actual_position
            );
        } else {
            assert_eq!(
                *expected_position, actual_position,
                "Point at index {} is different",
                index
            );
        }
    }
    Ok(())
}
