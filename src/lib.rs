//! Interchange layer for point cloud files.
//!
//! Point data is stored in a `PointBuffer`, a self-describing buffer of fixed-size point records.
//! File formats implement the `FileReader` and `FileWriter` traits to fill or serialize such a
//! buffer. Reading is split into a cheap `probe` that determines the schema and number of points,
//! and `load`, which reads the point records.

mod error;
pub use self::error::*;

pub mod layout;
pub use self::layout::{FieldDatatype, FieldSchema, FieldValue};

mod buffer;
pub use self::buffer::*;

mod pose;
pub use self::pose::*;

mod base;
pub use self::base::{CloudHeader, DataEncoding, FileReader, FileWriter};

pub mod e57;
pub mod xyz;

mod format;
pub use self::format::*;
