use std::ops::Range;

use crate::{
    layout::{FieldDatatype, FieldSchema, FieldValue},
    CloudIoError, Result,
};

/// Record-oriented point storage. Each point is a fixed-size record of `point_step` bytes whose
/// contents are described by the `FieldSchema`s of this buffer. Records are organized as
/// `height` rows of `width` points each; `height == 1` denotes an unorganized point set.
///
/// The size of `data` always equals `width * height * point_step`. All access to the raw bytes
/// through field names or record indices is bounds-checked.
///
/// Coordinates read by the built-in formats are stored as 32-bit floats. Values with large
/// magnitudes lose precision unless an offset is subtracted before they are stored, see
/// `SensorPose::from_f64` and `narrow_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBuffer {
    fields: Vec<FieldSchema>,
    point_step: usize,
    width: usize,
    height: usize,
    is_dense: bool,
    data: Vec<u8>,
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self {
            fields: vec![],
            point_step: 0,
            width: 0,
            height: 1,
            is_dense: true,
            data: vec![],
        }
    }
}

impl PointBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new field to the schema of this buffer. Fields must be added in ascending order of
    /// their offsets without overlapping the previous field. Fails if a field with the same name
    /// exists, or if storage is already allocated and the field does not fit into `point_step`
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        datatype: FieldDatatype,
        count: usize,
        offset: usize,
    ) -> Result<()> {
        let field = FieldSchema::new(name, datatype, count, offset);
        if field.count == 0 {
            return Err(CloudIoError::SchemaError(format!(
                "field `{}` must have at least one element",
                field.name
            )));
        }
        if self.field(&field.name).is_some() {
            return Err(CloudIoError::SchemaError(format!(
                "field `{}` already exists",
                field.name
            )));
        }
        let range = checked_byte_range(&field)?;
        if let Some(previous) = self.fields.last() {
            let previous_range = checked_byte_range(previous)?;
            if range.start < previous_range.end {
                return Err(CloudIoError::SchemaError(format!(
                    "field `{}` (bytes {:?}) must start at or after the end of field `{}` (bytes {:?})",
                    field.name, range, previous.name, previous_range
                )));
            }
        }
        if self.point_step > 0 && range.end > self.point_step {
            return Err(CloudIoError::SchemaError(format!(
                "field `{}` (bytes {:?}) does not fit into a point step of {} bytes",
                field.name, range, self.point_step
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Reallocates the storage to hold `width * height` records of `point_step` bytes. The new
    /// storage is zero-filled and all prior contents are discarded. On error the buffer is left
    /// unchanged
    pub fn resize_storage(&mut self, point_step: usize, width: usize, height: usize) -> Result<()> {
        for field in &self.fields {
            let range = checked_byte_range(field)?;
            if range.end > point_step {
                return Err(CloudIoError::SchemaError(format!(
                    "field `{}` (bytes {:?}) does not fit into a point step of {} bytes",
                    field.name, range, point_step
                )));
            }
        }
        let size_in_bytes = width
            .checked_mul(height)
            .and_then(|count| count.checked_mul(point_step))
            .ok_or_else(|| {
                CloudIoError::SchemaError(format!(
                    "buffer of {width}x{height} points with point step {point_step} is too large"
                ))
            })?;

        self.data = vec![0; size_in_bytes];
        self.point_step = point_step;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.width * self.height
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn point_step(&self) -> usize {
        self.point_step
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of a single row of points in bytes
    pub fn row_step(&self) -> usize {
        self.width * self.point_step
    }

    /// Is this an organized point cloud (e.g. a range image)?
    pub fn is_organized(&self) -> bool {
        self.height > 1
    }

    /// `false` if the buffer might contain invalid (NaN) points
    pub fn is_dense(&self) -> bool {
        self.is_dense
    }

    pub fn set_dense(&mut self, is_dense: bool) {
        self.is_dense = is_dense;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw bytes. The length of the storage can only be changed through
    /// `resize_storage`
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn record_range(&self, index: usize) -> Result<Range<usize>> {
        let count = self.record_count();
        if index >= count {
            return Err(CloudIoError::OutOfBounds { index, len: count });
        }
        let start = index * self.point_step;
        Ok(start..(start + self.point_step))
    }

    /// The raw bytes of the record at `index`
    pub fn record(&self, index: usize) -> Result<&[u8]> {
        let range = self.record_range(index)?;
        let len = self.data.len();
        self.data
            .get(range.clone())
            .ok_or(CloudIoError::OutOfBounds { index: range.end, len })
    }

    pub fn record_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        let range = self.record_range(index)?;
        let len = self.data.len();
        self.data
            .get_mut(range.clone())
            .ok_or(CloudIoError::OutOfBounds { index: range.end, len })
    }

    /// Byte range of element `element` of field `name` within the record at `index`. Checks that the
    /// field has datatype `T`
    fn value_range<T: FieldValue>(
        &self,
        index: usize,
        name: &str,
        element: usize,
    ) -> Result<Range<usize>> {
        let field = self
            .field(name)
            .ok_or_else(|| CloudIoError::SchemaError(format!("no field named `{name}`")))?;
        if field.datatype != T::DATATYPE {
            return Err(CloudIoError::SchemaError(format!(
                "field `{}` has datatype {:?}, but {:?} was requested",
                name,
                field.datatype,
                T::DATATYPE
            )));
        }
        if element >= field.count {
            return Err(CloudIoError::OutOfBounds {
                index: element,
                len: field.count,
            });
        }
        let record = self.record_range(index)?;
        let element_size = field.datatype.size();
        let start = element
            .checked_mul(element_size)
            .and_then(|element_offset| element_offset.checked_add(field.offset))
            .and_then(|offset_in_record| offset_in_record.checked_add(record.start));
        let end = start.and_then(|start| start.checked_add(element_size));
        match (start, end) {
            (Some(start), Some(end)) if end <= record.end && end <= self.data.len() => Ok(start..end),
            _ => Err(CloudIoError::OutOfBounds {
                index: end.unwrap_or(usize::MAX),
                len: self.data.len(),
            }),
        }
    }

    /// Reads element `element` of field `name` of the record at `index`
    pub fn get_value<T: FieldValue>(&self, index: usize, name: &str, element: usize) -> Result<T> {
        let range = self.value_range::<T>(index, name, element)?;
        let len = self.data.len();
        let bytes = self
            .data
            .get(range.clone())
            .ok_or(CloudIoError::OutOfBounds { index: range.end, len })?;
        Ok(T::read_from(bytes))
    }

    pub fn set_value<T: FieldValue>(
        &mut self,
        index: usize,
        name: &str,
        element: usize,
        value: T,
    ) -> Result<()> {
        let range = self.value_range::<T>(index, name, element)?;
        let len = self.data.len();
        let bytes = self
            .data
            .get_mut(range.clone())
            .ok_or(CloudIoError::OutOfBounds { index: range.end, len })?;
        value.write_to(bytes);
        Ok(())
    }
}

fn checked_byte_range(field: &FieldSchema) -> Result<Range<usize>> {
    field.byte_range_within_point().ok_or_else(|| {
        CloudIoError::SchemaError(format!(
            "field `{}` with {} elements at offset {} exceeds the addressable range",
            field.name, field.count, field.offset
        ))
    })
}
