use std::path::Path;

use crate::{
    batch::{AttributeBatch, BatchSink},
    decoder::{DecodeOptions, DecodeSummary, PcdDecoder},
    error::PcdError,
};

fn read_file(path: &Path) -> Result<Vec<u8>, PcdError> {
    let Some(file_ext) = path.extension() else {
        return Err(PcdError::InvalidFileExtension("".into()));
    };

    if !file_ext.eq_ignore_ascii_case("pcd") {
        return Err(PcdError::InvalidFileExtension(
            file_ext.to_string_lossy().to_string(),
        ));
    }

    let data = std::fs::read(path)?;
    log::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Read a PCD file and merge all of its points.
///
/// # Arguments
///
/// * `path` - Path to a `.pcd` file.
/// * `options` - Decoder configuration.
///
/// # Returns
///
/// An [`AttributeBatch`] with every decoded attribute. Attributes absent from the file
/// are empty.
pub fn read_pcd(path: impl AsRef<Path>, options: DecodeOptions) -> Result<AttributeBatch, PcdError> {
    let data = read_file(path.as_ref())?;
    PcdDecoder::new(options).decode_all(&data)
}

/// Read a PCD file, emitting batches into `sink` as they are decoded.
pub fn read_pcd_with_sink<S: BatchSink + ?Sized>(
    path: impl AsRef<Path>,
    options: DecodeOptions,
    sink: &mut S,
) -> Result<DecodeSummary, PcdError> {
    let data = read_file(path.as_ref())?;
    PcdDecoder::new(options).decode(&data, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn rejects_wrong_extension() {
        let file = Builder::new().suffix(".ply").tempfile().unwrap();
        match read_pcd(file.path(), DecodeOptions::default()) {
            Err(PcdError::InvalidFileExtension(ext)) => assert_eq!(ext, "ply"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_pcd(dir.path().join("missing.pcd"), DecodeOptions::default());
        assert!(matches!(result, Err(PcdError::Io(_))));
    }

    #[test]
    fn reads_ascii_file() {
        let mut file = Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(b"FIELDS x y z intensity\nPOINTS 2\nDATA ascii\n1 2 3 4\n5 6 7 8\n")
            .unwrap();

        let batch = read_pcd(file.path(), DecodeOptions::default()).unwrap();
        assert_eq!(batch.position, vec![1.0, 2.0, 3.0, 5.0, 6.0, 7.0]);
        assert_eq!(batch.intensity, vec![4.0, 8.0]);

        let mut loaded = Vec::new();
        let summary = read_pcd_with_sink(
            file.path(),
            DecodeOptions::default().with_chunk_size(8),
            &mut |b: AttributeBatch| loaded.push(b.loaded),
        )
        .unwrap();
        assert_eq!(summary.decoded_points, 2);
        assert!(loaded.len() > 1);
    }
}
