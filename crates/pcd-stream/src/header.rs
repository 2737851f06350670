use std::fmt;

use crate::{
    error::PcdError,
    layout::{FieldKind, FieldLayout, FieldType},
};

/// Default window, in bytes, used when scanning for the end of the header.
pub const DEFAULT_HEADER_CHUNK_SIZE: usize = 200;

/// Encoding of the point data, as declared by the `DATA` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Whitespace separated text, one point per line.
    Ascii,
    /// Row-major little-endian records.
    Binary,
    /// Column-major little-endian records compressed with LZF.
    BinaryCompressed,
}

impl Encoding {
    /// Parse the token following `DATA`.
    pub fn from_token(token: &str) -> Result<Self, PcdError> {
        match token {
            "ascii" => Ok(Encoding::Ascii),
            "binary" => Ok(Encoding::Binary),
            "binary_compressed" => Ok(Encoding::BinaryCompressed),
            other => Err(PcdError::UnsupportedEncoding(other.to_string())),
        }
    }

    /// The token used in PCD headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Binary => "binary",
            Encoding::BinaryCompressed => "binary_compressed",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parsed header of a PCD file.
///
/// A header is built once per buffer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    version: Option<f32>,
    encoding: Encoding,
    fields: Vec<String>,
    size: Vec<usize>,
    types: Vec<FieldType>,
    count: Vec<usize>,
    width: usize,
    height: usize,
    viewpoint: Option<String>,
    points: usize,
    header_len: usize,
    layout: FieldLayout,
}

impl PcdHeader {
    /// Parse the header at the start of `data`.
    ///
    /// # Arguments
    ///
    /// * `data` - The whole PCD buffer.
    ///
    /// # Returns
    ///
    /// The header, or [`PcdError::HeaderNotFound`] if the buffer has no `DATA` line.
    ///
    /// # Example
    ///
    /// ```
    /// use pcd_stream::{Encoding, PcdHeader};
    ///
    /// let data = b"FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nPOINTS 1\nDATA binary\n";
    /// let header = PcdHeader::parse(data).unwrap();
    ///
    /// assert_eq!(header.encoding(), Encoding::Binary);
    /// assert_eq!(header.layout().row_size(), 12);
    /// assert_eq!(header.header_len(), data.len());
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self, PcdError> {
        Self::parse_with_window(data, DEFAULT_HEADER_CHUNK_SIZE)
    }

    /// Parse the header scanning `window` bytes at a time for the `DATA` line.
    pub fn parse_with_window(data: &[u8], window: usize) -> Result<Self, PcdError> {
        if window == 0 {
            return Err(PcdError::InvalidChunkSize(window));
        }

        let data_line = find_data_line(data, window).ok_or(PcdError::HeaderNotFound)?;
        let encoding = Encoding::from_token(&data_line.token)?;
        let text = String::from_utf8_lossy(&data[..data_line.end]);

        let mut raw = RawHeader::default();
        for line in text.split(['\r', '\n']) {
            // everything after '#' is a comment
            let line = line.split('#').next().unwrap_or_default();
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            raw.set(&key.to_ascii_uppercase(), tokens.collect());
        }

        Self::from_raw(raw, encoding, data_line.end)
    }

    fn from_raw(raw: RawHeader, encoding: Encoding, header_len: usize) -> Result<Self, PcdError> {
        let fields = raw
            .fields
            .ok_or_else(|| PcdError::MalformedHeader("missing FIELDS".into()))?;
        if fields.is_empty() {
            return Err(PcdError::MalformedHeader("empty FIELDS".into()));
        }

        let size = match raw.size {
            Some(tokens) => parse_list(&tokens, "SIZE")?,
            None => vec![4; fields.len()],
        };

        let types = match raw.types {
            Some(tokens) => tokens
                .iter()
                .map(|t| {
                    FieldType::from_token(t)
                        .ok_or_else(|| PcdError::MalformedHeader(format!("invalid TYPE `{t}`")))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => fields
                .iter()
                .map(|name| FieldKind::from_name(name).default_type())
                .collect(),
        };

        // If COUNT is omitted every field holds a single element
        let count = match raw.count {
            Some(tokens) => parse_list(&tokens, "COUNT")?,
            None => vec![1; fields.len()],
        };

        let width = raw
            .width
            .map(|t| parse_single(&t, "WIDTH"))
            .transpose()?
            .unwrap_or(0);
        let height = raw
            .height
            .map(|t| parse_single(&t, "HEIGHT"))
            .transpose()?
            .unwrap_or(1);
        let points = match raw.points {
            Some(t) => parse_single(&t, "POINTS")?,
            None => width
                .checked_mul(height)
                .ok_or_else(|| PcdError::MalformedHeader("WIDTH x HEIGHT overflows".into()))?,
        };

        let version = raw.version.and_then(|t| t.first().and_then(|v| v.parse().ok()));
        let viewpoint = raw.viewpoint.map(|t| t.join(" "));

        let layout = FieldLayout::new(encoding, &fields, &size, &types, &count)?;

        Ok(Self {
            version,
            encoding,
            fields,
            size,
            types,
            count,
            width,
            height,
            viewpoint,
            points,
            header_len,
            layout,
        })
    }

    /// The `VERSION` value, if present and numeric.
    pub fn version(&self) -> Option<f32> {
        self.version
    }

    /// The encoding of the point data.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Field names in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Element size in bytes per field.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Element type per field.
    pub fn types(&self) -> &[FieldType] {
        &self.types
    }

    /// Element count per field.
    pub fn count(&self) -> &[usize] {
        &self.count
    }

    /// The `WIDTH` value, 0 if absent.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The `HEIGHT` value, 1 if absent.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw `VIEWPOINT` value.
    pub fn viewpoint(&self) -> Option<&str> {
        self.viewpoint.as_deref()
    }

    /// Declared number of points.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Byte offset where the point data begins.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// The derived field layout.
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }
}

#[derive(Debug, Default)]
struct RawHeader {
    version: Option<Vec<String>>,
    fields: Option<Vec<String>>,
    size: Option<Vec<String>>,
    types: Option<Vec<String>>,
    count: Option<Vec<String>>,
    width: Option<Vec<String>>,
    height: Option<Vec<String>>,
    viewpoint: Option<Vec<String>>,
    points: Option<Vec<String>>,
}

impl RawHeader {
    // the first occurrence of a key wins
    fn set(&mut self, key: &str, tokens: Vec<&str>) {
        let slot = match key {
            "VERSION" => &mut self.version,
            "FIELDS" => &mut self.fields,
            "SIZE" => &mut self.size,
            "TYPE" => &mut self.types,
            "COUNT" => &mut self.count,
            "WIDTH" => &mut self.width,
            "HEIGHT" => &mut self.height,
            "VIEWPOINT" => &mut self.viewpoint,
            "POINTS" => &mut self.points,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(tokens.into_iter().map(String::from).collect());
        }
    }
}

fn parse_list(tokens: &[String], key: &str) -> Result<Vec<usize>, PcdError> {
    tokens
        .iter()
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| PcdError::MalformedHeader(format!("invalid {key} value `{v}`")))
        })
        .collect()
}

fn parse_single(tokens: &[String], key: &str) -> Result<usize, PcdError> {
    let token = tokens
        .first()
        .ok_or_else(|| PcdError::MalformedHeader(format!("{key} has no value")))?;
    token
        .parse::<usize>()
        .map_err(|_| PcdError::MalformedHeader(format!("invalid {key} value `{token}`")))
}

/// Location of the `DATA` line.
#[derive(Debug, PartialEq)]
struct DataLine {
    /// Byte offset just past the line terminator.
    end: usize,
    /// The encoding token.
    token: String,
}

/// Scan `data` in windows of `window` bytes for the first `DATA <token>` line.
///
/// Each byte is searched for a terminator once; a line cut by the window edge is matched
/// once the next window completes it.
fn find_data_line(data: &[u8], window: usize) -> Option<DataLine> {
    let mut line_start = 0;
    let mut search_from = 0;
    let mut scanned = 0;

    while scanned < data.len() {
        scanned = (scanned + window).min(data.len());

        while let Some(rel) = data[search_from..scanned]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            let line_end = search_from + rel;
            let mut next = line_end + 1;
            if data[line_end] == b'\r' && data.get(next) == Some(&b'\n') {
                next += 1;
            }

            if let Some(token) = match_data_line(&data[line_start..line_end]) {
                return Some(DataLine { end: next, token });
            }
            line_start = next;
            search_from = next;
            if search_from >= scanned {
                break;
            }
        }
        // bytes before `scanned` hold no terminator
        search_from = search_from.max(scanned);
    }

    // a DATA line may close the buffer without a terminator
    match_data_line(data.get(line_start..)?).map(|token| DataLine {
        end: data.len(),
        token,
    })
}

/// Match `DATA <token>` with optional trailing blanks, the keyword case-insensitive.
fn match_data_line(line: &[u8]) -> Option<String> {
    let keyword = line.get(..4)?;
    if !keyword.eq_ignore_ascii_case(b"DATA") {
        return None;
    }
    let rest = &line[4..];
    if !rest.first().is_some_and(|b| *b == b' ' || b == &b'\t') {
        return None;
    }
    let rest = std::str::from_utf8(rest).ok()?;
    let mut tokens = rest.split_whitespace();
    let token = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(token.to_string())
}
