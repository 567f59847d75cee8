use std::{convert::TryFrom, ops::Range};

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::CloudIoError;

/// Scalar type of a single element of a point field. The discriminants are stable and can be
/// stored in file headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldDatatype {
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Float32 = 7,
    Float64 = 8,
    Int64 = 9,
    UInt64 = 10,
}

impl FieldDatatype {
    /// Size of a single element of this datatype in bytes
    pub fn size(&self) -> usize {
        match self {
            FieldDatatype::Int8 | FieldDatatype::UInt8 => 1,
            FieldDatatype::Int16 | FieldDatatype::UInt16 => 2,
            FieldDatatype::Int32 | FieldDatatype::UInt32 | FieldDatatype::Float32 => 4,
            FieldDatatype::Int64 | FieldDatatype::UInt64 | FieldDatatype::Float64 => 8,
        }
    }
}

impl TryFrom<u8> for FieldDatatype {
    type Error = CloudIoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FieldDatatype::Int8),
            2 => Ok(FieldDatatype::UInt8),
            3 => Ok(FieldDatatype::Int16),
            4 => Ok(FieldDatatype::UInt16),
            5 => Ok(FieldDatatype::Int32),
            6 => Ok(FieldDatatype::UInt32),
            7 => Ok(FieldDatatype::Float32),
            8 => Ok(FieldDatatype::Float64),
            9 => Ok(FieldDatatype::Int64),
            10 => Ok(FieldDatatype::UInt64),
            other => Err(CloudIoError::SchemaError(format!(
                "unknown field datatype code {other}"
            ))),
        }
    }
}

/// Description of one named attribute within a point record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub datatype: FieldDatatype,
    pub count: usize,
    pub offset: usize,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, datatype: FieldDatatype, count: usize, offset: usize) -> Self {
        Self {
            name: name.into(),
            datatype,
            count,
            offset,
        }
    }

    /// Size of all elements of this field in bytes, or `None` if it exceeds `usize::MAX`
    pub fn size(&self) -> Option<usize> {
        self.datatype.size().checked_mul(self.count)
    }

    /// The range of bytes this field occupies within a single point record, or `None` if the end of
    /// the range exceeds `usize::MAX`
    pub fn byte_range_within_point(&self) -> Option<Range<usize>> {
        let end = self.offset.checked_add(self.size()?)?;
        Some(self.offset..end)
    }
}

/// Primitive types that can be stored in a `PointBuffer` field. Values are encoded little-endian
pub trait FieldValue: Copy {
    const DATATYPE: FieldDatatype;

    /// Decode a value from the first `DATATYPE.size()` bytes of `bytes`
    fn read_from(bytes: &[u8]) -> Self;
    /// Encode this value into the first `DATATYPE.size()` bytes of `bytes`
    fn write_to(self, bytes: &mut [u8]);
}

impl FieldValue for i8 {
    const DATATYPE: FieldDatatype = FieldDatatype::Int8;

    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_to(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

impl FieldValue for u8 {
    const DATATYPE: FieldDatatype = FieldDatatype::UInt8;

    fn read_from(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_to(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
}

macro_rules! impl_field_value {
    ($t:ty, $datatype:expr, $read:path, $write:path) => {
        impl FieldValue for $t {
            const DATATYPE: FieldDatatype = $datatype;

            fn read_from(bytes: &[u8]) -> Self {
                $read(bytes)
            }

            fn write_to(self, bytes: &mut [u8]) {
                $write(bytes, self)
            }
        }
    };
}

impl_field_value!(i16, FieldDatatype::Int16, LittleEndian::read_i16, LittleEndian::write_i16);
impl_field_value!(u16, FieldDatatype::UInt16, LittleEndian::read_u16, LittleEndian::write_u16);
impl_field_value!(i32, FieldDatatype::Int32, LittleEndian::read_i32, LittleEndian::write_i32);
impl_field_value!(u32, FieldDatatype::UInt32, LittleEndian::read_u32, LittleEndian::write_u32);
impl_field_value!(i64, FieldDatatype::Int64, LittleEndian::read_i64, LittleEndian::write_i64);
impl_field_value!(u64, FieldDatatype::UInt64, LittleEndian::read_u64, LittleEndian::write_u64);
impl_field_value!(f32, FieldDatatype::Float32, LittleEndian::read_f32, LittleEndian::write_f32);
impl_field_value!(f64, FieldDatatype::Float64, LittleEndian::read_f64, LittleEndian::write_f64);
