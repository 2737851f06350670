use crate::{
    batch::AttributeBatch,
    color,
    error::PcdError,
    layout::{AttributeSlots, FieldEntry, FieldKind, FieldLayout, FieldType},
};

/// Little-endian scalar encodings a binary field can be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    F32,
    F64,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Scalar {
    fn new(field_type: FieldType, size: usize) -> Option<Self> {
        match (field_type, size) {
            (FieldType::Float, 4) => Some(Scalar::F32),
            (FieldType::Float, 8) => Some(Scalar::F64),
            (FieldType::Unsigned, 1) => Some(Scalar::U8),
            (FieldType::Unsigned, 2) => Some(Scalar::U16),
            (FieldType::Unsigned, 4) => Some(Scalar::U32),
            (FieldType::Unsigned, 8) => Some(Scalar::U64),
            (FieldType::Signed, 1) => Some(Scalar::I8),
            (FieldType::Signed, 2) => Some(Scalar::I16),
            (FieldType::Signed, 4) => Some(Scalar::I32),
            (FieldType::Signed, 8) => Some(Scalar::I64),
            _ => None,
        }
    }
}

/// Where and how to read one binary field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinarySlot {
    /// Byte offset of the field within a row.
    pub offset: usize,
    /// Bytes occupied by one point's value.
    pub stride: usize,
    scalar: Scalar,
}

impl BinarySlot {
    fn resolve(field: &FieldEntry) -> Result<Self, PcdError> {
        let unsupported = |reason: String| PcdError::UnsupportedField {
            name: field.name.clone(),
            reason,
        };

        if field.count != 1 {
            return Err(unsupported(format!("count must be 1, got {}", field.count)));
        }

        // rgb is read as raw bytes regardless of its declared type
        let scalar = if field.kind == FieldKind::Rgb {
            if field.size != 4 {
                return Err(unsupported(format!("size must be 4, got {}", field.size)));
            }
            Scalar::U32
        } else {
            Scalar::new(field.field_type, field.size).ok_or_else(|| {
                unsupported(format!(
                    "cannot read type {}{}",
                    field.field_type.as_char(),
                    field.size
                ))
            })?
        };

        Ok(Self {
            offset: field.offset,
            stride: field.byte_len(),
            scalar,
        })
    }

    #[inline]
    fn bytes<'a>(&self, buf: &'a [u8], pos: usize) -> Result<&'a [u8], PcdError> {
        buf.get(pos..pos + self.stride)
            .ok_or(PcdError::TruncatedData {
                expected: pos + self.stride,
                actual: buf.len(),
            })
    }

    /// Read the value at `pos` as a double.
    #[inline]
    fn read_f64(&self, buf: &[u8], pos: usize) -> Result<f64, PcdError> {
        let b = self.bytes(buf, pos)?;
        Ok(match self.scalar {
            Scalar::F32 => f32::from_le_bytes(array(b)) as f64,
            Scalar::F64 => f64::from_le_bytes(array(b)),
            Scalar::U8 => b[0] as f64,
            Scalar::U16 => u16::from_le_bytes(array(b)) as f64,
            Scalar::U32 => u32::from_le_bytes(array(b)) as f64,
            Scalar::U64 => u64::from_le_bytes(array(b)) as f64,
            Scalar::I8 => b[0] as i8 as f64,
            Scalar::I16 => i16::from_le_bytes(array(b)) as f64,
            Scalar::I32 => i32::from_le_bytes(array(b)) as f64,
            Scalar::I64 => i64::from_le_bytes(array(b)) as f64,
        })
    }

    #[inline]
    fn read_f32(&self, buf: &[u8], pos: usize) -> Result<f32, PcdError> {
        Ok(self.read_f64(buf, pos)? as f32)
    }

    /// Read the B, G, R bytes stored from low to high address.
    #[inline]
    fn read_rgb(&self, buf: &[u8], pos: usize) -> Result<[f32; 3], PcdError> {
        let b = self.bytes(buf, pos)?;
        Ok(color::bytes_to_linear(b[2], b[1], b[0]))
    }
}

/// A component missing from the header decodes as NaN.
#[inline]
fn read_component<F>(
    slot: Option<&BinarySlot>,
    buf: &[u8],
    locate: &F,
) -> Result<f32, PcdError>
where
    F: Fn(&BinarySlot) -> usize,
{
    match slot {
        Some(slot) => slot.read_f32(buf, locate(slot)),
        None => Ok(f32::NAN),
    }
}

#[inline]
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Extracts the decodable attributes of one point from a binary buffer.
///
/// The same reader serves row-major and column-major data: the caller supplies the
/// position of each field's value.
#[derive(Debug)]
pub(crate) struct RowReader {
    slots: AttributeSlots<BinarySlot>,
}

impl RowReader {
    pub fn new(layout: &FieldLayout) -> Result<Self, PcdError> {
        Ok(Self {
            slots: layout.attribute_slots(BinarySlot::resolve)?,
        })
    }

    /// Decode one point, reading each field at `locate(slot)`.
    pub fn read_point<F>(
        &self,
        buf: &[u8],
        locate: F,
        batch: &mut AttributeBatch,
    ) -> Result<(), PcdError>
    where
        F: Fn(&BinarySlot) -> usize,
    {
        if let Some(xyz) = &self.slots.position {
            for slot in xyz {
                batch.position.push(read_component(slot.as_ref(), buf, &locate)?);
            }
        }

        if let Some(slot) = &self.slots.rgb {
            batch.color.extend(slot.read_rgb(buf, locate(slot))?);
        }

        if let Some(nxyz) = &self.slots.normal {
            for slot in nxyz {
                batch.normal.push(read_component(slot.as_ref(), buf, &locate)?);
            }
        }

        if let Some(slot) = &self.slots.intensity {
            batch.intensity.push(slot.read_f32(buf, locate(slot))?);
        }

        if let Some(slot) = &self.slots.label {
            batch.label.push(slot.read_f64(buf, locate(slot))? as i32);
        }

        Ok(())
    }
}
