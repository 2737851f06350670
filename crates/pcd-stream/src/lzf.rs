/// Error types for the LZF decompressor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LzfError {
    /// A literal run extends past the end of the compressed input.
    #[error("Literal run of {run} bytes at input offset {offset} exceeds the input")]
    TruncatedLiteral {
        /// Offset of the control byte in the compressed input.
        offset: usize,
        /// Number of literal bytes announced by the control byte.
        run: usize,
    },

    /// A back-reference is missing its length or offset byte.
    #[error("Back-reference at input offset {offset} is truncated")]
    TruncatedBackReference {
        /// Offset of the control byte in the compressed input.
        offset: usize,
    },

    /// A back-reference points before the start of the output.
    #[error("Back-reference distance {distance} exceeds the {produced} bytes decoded so far")]
    ReferenceOutOfRange {
        /// Distance from the current output position.
        distance: usize,
        /// Number of bytes decoded when the reference was found.
        produced: usize,
    },

    /// A run would write past the declared output length.
    #[error("Output buffer of {capacity} bytes is not large enough")]
    OutputOverflow {
        /// The declared output length.
        capacity: usize,
    },

    /// The declared output length is more than the input could ever expand to.
    #[error("{input_len} compressed bytes cannot expand to {output_len} bytes")]
    ImplausibleLength {
        /// Size of the compressed input.
        input_len: usize,
        /// The declared output length.
        output_len: usize,
    },

    /// The input ended before the declared output length was reached.
    #[error("Decompressed {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// The declared output length.
        expected: usize,
        /// The number of bytes actually produced.
        actual: usize,
    },
}

/// Largest output-to-input ratio of a valid stream: a 3-byte back-reference copies 264 bytes.
pub const MAX_EXPANSION: usize = 88;

/// Decompress an LZF stream into a buffer of exactly `output_len` bytes.
///
/// The stream is a sequence of control bytes. A control byte below 32 starts a literal
/// run of `ctrl + 1` bytes copied verbatim from the input. Any other control byte starts
/// a back-reference: the upper three bits hold the copy length minus two (with 7 meaning
/// "add the next input byte"), the lower five bits and the following byte hold the
/// distance minus one back into the output produced so far.
///
/// # Arguments
///
/// * `input` - The compressed bytes.
/// * `output_len` - The exact size of the decompressed data.
///
/// # Returns
///
/// The decompressed bytes, or an [`LzfError`] if the stream is corrupt. The output buffer
/// is allocated once and never grown; nothing is read past either buffer. An
/// `output_len` above `input.len() * MAX_EXPANSION` is rejected before allocating.
///
/// # Example
///
/// ```
/// use pcd_stream::lzf;
///
/// // literal "ab", then copy 4 bytes starting 2 bytes back
/// let compressed = [0x01, b'a', b'b', 0x40, 0x01];
/// let data = lzf::decompress(&compressed, 6).unwrap();
/// assert_eq!(data, b"ababab");
/// ```
pub fn decompress(input: &[u8], output_len: usize) -> Result<Vec<u8>, LzfError> {
    if output_len > input.len().saturating_mul(MAX_EXPANSION) {
        return Err(LzfError::ImplausibleLength {
            input_len: input.len(),
            output_len,
        });
    }

    let mut output = vec![0u8; output_len];
    let mut ip = 0;
    let mut op = 0;

    while ip < input.len() {
        let start = ip;
        let ctrl = input[ip] as usize;
        ip += 1;

        if ctrl < (1 << 5) {
            let run = ctrl + 1;
            let src = input
                .get(ip..ip + run)
                .ok_or(LzfError::TruncatedLiteral { offset: start, run })?;
            let dst = output
                .get_mut(op..op + run)
                .ok_or(LzfError::OutputOverflow {
                    capacity: output_len,
                })?;
            dst.copy_from_slice(src);
            ip += run;
            op += run;
            continue;
        }

        let mut len = ctrl >> 5;
        if len == 7 {
            let extra = *input
                .get(ip)
                .ok_or(LzfError::TruncatedBackReference { offset: start })?;
            len += extra as usize;
            ip += 1;
        }

        let low = *input
            .get(ip)
            .ok_or(LzfError::TruncatedBackReference { offset: start })?;
        ip += 1;

        let distance = ((ctrl & 0x1f) << 8) + low as usize + 1;
        if distance > op {
            return Err(LzfError::ReferenceOutOfRange {
                distance,
                produced: op,
            });
        }

        let run = len + 2;
        if op + run > output_len {
            return Err(LzfError::OutputOverflow {
                capacity: output_len,
            });
        }

        let reference = op - distance;
        if distance >= run {
            output.copy_within(reference..reference + run, op);
        } else {
            // overlapping copy repeats the last `distance` bytes
            for k in 0..run {
                output[op + k] = output[reference + k];
            }
        }
        op += run;
    }

    if op != output_len {
        return Err(LzfError::LengthMismatch {
            expected: output_len,
            actual: op,
        });
    }

    Ok(output)
}
