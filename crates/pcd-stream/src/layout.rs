use crate::{error::PcdError, header::Encoding};

/// The PCD scalar type of a field, as declared by the `TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// `F`: IEEE-754 floating point.
    Float,
    /// `U`: unsigned integer.
    Unsigned,
    /// `I`: signed integer.
    Signed,
}

impl FieldType {
    /// Parse a `TYPE` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "F" | "f" => Some(FieldType::Float),
            "U" | "u" => Some(FieldType::Unsigned),
            "I" | "i" => Some(FieldType::Signed),
            _ => None,
        }
    }

    /// The type character used in PCD headers.
    pub fn as_char(&self) -> char {
        match self {
            FieldType::Float => 'F',
            FieldType::Unsigned => 'U',
            FieldType::Signed => 'I',
        }
    }
}

/// The role a field plays in the decoded attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Position x.
    X,
    /// Position y.
    Y,
    /// Position z.
    Z,
    /// Packed 8-bit RGB color.
    Rgb,
    /// Normal x, also spelled `nx`.
    NormalX,
    /// Normal y, also spelled `ny`.
    NormalY,
    /// Normal z, also spelled `nz`.
    NormalZ,
    /// Scalar intensity.
    Intensity,
    /// Integer label.
    Label,
    /// Any other field, reachable only through [`FieldLayout::offset_of`].
    Other,
}

impl FieldKind {
    /// Classify a field by its name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "x" => FieldKind::X,
            "y" => FieldKind::Y,
            "z" => FieldKind::Z,
            "rgb" => FieldKind::Rgb,
            "normal_x" | "nx" => FieldKind::NormalX,
            "normal_y" | "ny" => FieldKind::NormalY,
            "normal_z" | "nz" => FieldKind::NormalZ,
            "intensity" => FieldKind::Intensity,
            "label" => FieldKind::Label,
            _ => FieldKind::Other,
        }
    }

    /// The type assumed when the header has no `TYPE` line.
    pub fn default_type(&self) -> FieldType {
        match self {
            FieldKind::Rgb => FieldType::Unsigned,
            FieldKind::Label => FieldType::Signed,
            _ => FieldType::Float,
        }
    }
}

/// Describes a single field in a PCD point record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    /// The field name as declared in `FIELDS`.
    pub name: String,
    /// The attribute this field feeds.
    pub kind: FieldKind,
    /// Size of one element in bytes.
    pub size: usize,
    /// Number of elements.
    pub count: usize,
    /// Scalar type of the elements.
    pub field_type: FieldType,
    /// Column index for ASCII data, byte offset within a row for binary data.
    pub offset: usize,
}

impl FieldEntry {
    /// Number of bytes the field occupies in one point record.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.size * self.count
    }
}

/// Field offsets and row size derived once from the header.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    fields: Vec<FieldEntry>,
    row_size: usize,
}

impl FieldLayout {
    /// Compute the layout of a point record.
    ///
    /// For ASCII data a field's offset is its column index. For binary data it is the
    /// running byte sum of `size * count` over the preceding fields, and the final sum is
    /// the row size.
    ///
    /// # Arguments
    ///
    /// * `encoding` - The encoding of the point data.
    /// * `names` - Field names in column order.
    /// * `sizes` - Element size per field.
    /// * `types` - Element type per field.
    /// * `counts` - Element count per field.
    pub fn new(
        encoding: Encoding,
        names: &[String],
        sizes: &[usize],
        types: &[FieldType],
        counts: &[usize],
    ) -> Result<Self, PcdError> {
        if sizes.len() != names.len() || types.len() != names.len() || counts.len() != names.len()
        {
            return Err(PcdError::MalformedHeader(format!(
                "{} fields but {} sizes, {} types and {} counts",
                names.len(),
                sizes.len(),
                types.len(),
                counts.len()
            )));
        }

        let mut fields = Vec::with_capacity(names.len());
        let mut row_size = 0usize;

        for (i, name) in names.iter().enumerate() {
            let field_bytes = sizes[i]
                .checked_mul(counts[i])
                .ok_or_else(|| PcdError::MalformedHeader(format!("field `{name}` is too large")))?;

            let offset = match encoding {
                Encoding::Ascii => i,
                Encoding::Binary | Encoding::BinaryCompressed => row_size,
            };

            row_size = row_size
                .checked_add(field_bytes)
                .ok_or_else(|| PcdError::MalformedHeader("row size overflows".into()))?;

            fields.push(FieldEntry {
                name: name.clone(),
                kind: FieldKind::from_name(name),
                size: sizes[i],
                count: counts[i],
                field_type: types[i],
                offset,
            });
        }

        if encoding != Encoding::Ascii && row_size == 0 {
            return Err(PcdError::MalformedHeader("binary row size is zero".into()));
        }

        Ok(Self { fields, row_size })
    }

    /// The fields in column order.
    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    /// Total bytes per point record. Only meaningful for binary data.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Look up a field by name. With duplicate names the last declaration wins.
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().rev().find(|f| f.name == name)
    }

    /// Offset of a field by name, see [`FieldEntry::offset`].
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.offset)
    }

    fn find(&self, kind: FieldKind) -> Option<&FieldEntry> {
        self.fields.iter().rev().find(|f| f.kind == kind)
    }

    /// Resolve the decodable attributes into decoder-specific slots.
    ///
    /// Position and normal are resolved when at least one of their components is
    /// present; missing components are `None` and decode as NaN.
    pub(crate) fn attribute_slots<T, F>(&self, mut resolve: F) -> Result<AttributeSlots<T>, PcdError>
    where
        F: FnMut(&FieldEntry) -> Result<T, PcdError>,
    {
        let mut triple = |kinds: [FieldKind; 3]| -> Result<Option<[Option<T>; 3]>, PcdError> {
            let found = kinds.map(|k| self.find(k));
            if found.iter().all(Option::is_none) {
                return Ok(None);
            }
            if found.iter().any(Option::is_none) {
                log::warn!("incomplete {:?} triple, missing components decode as NaN", kinds);
            }
            let [a, b, c] = found;
            Ok(Some([
                a.map(&mut resolve).transpose()?,
                b.map(&mut resolve).transpose()?,
                c.map(&mut resolve).transpose()?,
            ]))
        };

        let position = triple([FieldKind::X, FieldKind::Y, FieldKind::Z])?;
        let normal = triple([FieldKind::NormalX, FieldKind::NormalY, FieldKind::NormalZ])?;

        let rgb = self.find(FieldKind::Rgb).map(&mut resolve).transpose()?;
        let intensity = self.find(FieldKind::Intensity).map(&mut resolve).transpose()?;
        let label = self.find(FieldKind::Label).map(&mut resolve).transpose()?;

        Ok(AttributeSlots {
            position,
            normal,
            rgb,
            intensity,
            label,
        })
    }
}

/// Per-attribute read locations, resolved once per decode.
#[derive(Debug)]
pub(crate) struct AttributeSlots<T> {
    pub position: Option<[Option<T>; 3]>,
    pub normal: Option<[Option<T>; 3]>,
    pub rgb: Option<T>,
    pub intensity: Option<T>,
    pub label: Option<T>,
}
