mod common;

use common::lzf_compress;
use pcd_stream::lzf::{self, LzfError};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn corpus() -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut corpus = vec![
        vec![],
        vec![42],
        b"abc".to_vec(),
        // literal runs only
        (0..=255u8).collect(),
        // short back-references
        b"abcabcabcabcXYZabcabc".repeat(3),
        // long back-references: length codes past 7 and the 264-byte cap
        vec![0u8; 1000],
        [1u8, 2, 3, 4].repeat(500),
    ];

    // random bytes over a small alphabet produce a mix of literals and matches
    for len in [10, 100, 1000, 10_000] {
        corpus.push((0..len).map(|_| rng.random_range(0..4u8)).collect());
    }
    for len in [50, 5000] {
        corpus.push((0..len).map(|_| rng.random::<u8>()).collect());
    }

    // distant repeats exercise the full 13-bit distance range
    let block: Vec<u8> = (0..8000).map(|_| rng.random::<u8>()).collect();
    corpus.push([block.clone(), block].concat());

    corpus
}

#[test]
fn round_trip() {
    for input in corpus() {
        let compressed = lzf_compress(&input);
        let output = lzf::decompress(&compressed, input.len()).unwrap();
        assert_eq!(output, input, "input of {} bytes", input.len());
    }
}

#[test]
fn reference_compressor_uses_back_references() {
    let input = vec![7u8; 1000];
    let compressed = lzf_compress(&input);
    assert!(compressed.len() < 20);
    assert!(compressed.iter().skip(2).any(|&b| b >> 5 == 7));
}

#[test]
fn rejects_truncated_stream() {
    for input in corpus().into_iter().filter(|i| i.len() > 10) {
        let compressed = lzf_compress(&input);
        for cut in [1, compressed.len() / 2, compressed.len() - 1] {
            let result = lzf::decompress(&compressed[..cut], input.len());
            assert!(result.is_err(), "cut at {cut} of {}", compressed.len());
        }
    }
}

#[test]
fn rejects_out_of_range_reference() {
    // 3 literal bytes, then a reference 100 bytes back
    let stream = [0x02, 1, 2, 3, 0x20, 99];
    assert_eq!(
        lzf::decompress(&stream, 6),
        Err(LzfError::ReferenceOutOfRange {
            distance: 100,
            produced: 3
        })
    );
}

#[test]
fn never_writes_past_output_len() {
    let input = [5u8, 6, 7, 8].repeat(100);
    let compressed = lzf_compress(&input);
    for short in [0, 1, input.len() / 2, input.len() - 1] {
        let result = lzf::decompress(&compressed, short);
        assert!(matches!(result, Err(LzfError::OutputOverflow { .. })));
    }
    let result = lzf::decompress(&compressed, input.len() + 1);
    assert!(matches!(result, Err(LzfError::LengthMismatch { .. })));
}
