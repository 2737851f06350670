#![allow(dead_code)]

use std::collections::HashMap;

use pcd_stream::{AttributeBatch, BatchSink, DecodeSummary};

const MAX_LITERAL: usize = 32;
const MAX_DISTANCE: usize = 1 << 13;
const MAX_MATCH: usize = 7 + 255 + 2;

/// Greedy LZF compressor used as the reference encoder in tests.
pub fn lzf_compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut literals: Vec<u8> = Vec::new();
    let mut table: HashMap<[u8; 3], usize> = HashMap::new();
    let mut i = 0;

    let flush = |literals: &mut Vec<u8>, out: &mut Vec<u8>| {
        for run in literals.chunks(MAX_LITERAL) {
            out.push((run.len() - 1) as u8);
            out.extend_from_slice(run);
        }
        literals.clear();
    };

    while i < input.len() {
        if i + 2 < input.len() {
            let key = [input[i], input[i + 1], input[i + 2]];
            if let Some(&candidate) = table.get(&key) {
                let distance = i - candidate - 1;
                if distance < MAX_DISTANCE {
                    let max = MAX_MATCH.min(input.len() - i);
                    let mut len = 0;
                    while len < max && input[candidate + len] == input[i + len] {
                        len += 1;
                    }

                    flush(&mut literals, &mut out);
                    let code = len - 2;
                    if code < 7 {
                        out.push(((code << 5) | (distance >> 8)) as u8);
                    } else {
                        out.push(((7 << 5) | (distance >> 8)) as u8);
                        out.push((code - 7) as u8);
                    }
                    out.push((distance & 0xff) as u8);

                    for k in i..i + len {
                        if k + 2 < input.len() {
                            table.insert([input[k], input[k + 1], input[k + 2]], k);
                        }
                    }
                    i += len;
                    continue;
                }
            }
            table.insert(key, i);
        }
        literals.push(input[i]);
        i += 1;
    }

    flush(&mut literals, &mut out);
    out
}

/// Attributes of one synthetic point.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub xyz: [f32; 3],
    pub rgb: [u8; 3],
    pub normal: [f32; 3],
    pub intensity: f32,
    pub label: i32,
}

pub fn points(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let f = i as f32;
            Point {
                xyz: [f * 0.5, -f, f * 1.25 + 0.125],
                rgb: [(i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 29 % 256) as u8],
                normal: [0.0, (f * 0.1).sin(), (f * 0.1).cos()],
                intensity: f / 4.0,
                label: i as i32 - 10,
            }
        })
        .collect()
}

const FIELDS: &str = "FIELDS x y z rgb normal_x normal_y normal_z intensity label
SIZE 4 4 4 4 4 4 4 4 4
TYPE F F F U F F F F I
COUNT 1 1 1 1 1 1 1 1 1
";

fn header(n: usize, encoding: &str) -> String {
    format!(
        "# .PCD v0.7 - Point Cloud Data file format\nVERSION 0.7\n{FIELDS}WIDTH {n}\nHEIGHT 1\nVIEWPOINT 0 0 0 1 0 0 0\nPOINTS {n}\nDATA {encoding}\n"
    )
}

fn packed(rgb: [u8; 3]) -> u32 {
    (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
}

pub fn ascii_file(points: &[Point]) -> Vec<u8> {
    let mut text = header(points.len(), "ascii");
    for p in points {
        text.push_str(&format!(
            "{} {} {} {} {} {} {} {} {}\n",
            p.xyz[0],
            p.xyz[1],
            p.xyz[2],
            packed(p.rgb),
            p.normal[0],
            p.normal[1],
            p.normal[2],
            p.intensity,
            p.label
        ));
    }
    text.into_bytes()
}

fn row(p: &Point) -> Vec<u8> {
    let mut row = Vec::with_capacity(36);
    for v in p.xyz {
        row.extend_from_slice(&v.to_le_bytes());
    }
    row.extend_from_slice(&packed(p.rgb).to_le_bytes());
    for v in p.normal {
        row.extend_from_slice(&v.to_le_bytes());
    }
    row.extend_from_slice(&p.intensity.to_le_bytes());
    row.extend_from_slice(&p.label.to_le_bytes());
    row
}

pub fn binary_file(points: &[Point]) -> Vec<u8> {
    let mut data = header(points.len(), "binary").into_bytes();
    for p in points {
        data.extend(row(p));
    }
    data
}

pub fn compressed_file(points: &[Point]) -> Vec<u8> {
    // transpose rows into one column per field
    let rows: Vec<Vec<u8>> = points.iter().map(row).collect();
    let mut raw = Vec::with_capacity(rows.len() * 36);
    for field in 0..9 {
        for r in &rows {
            raw.extend_from_slice(&r[field * 4..field * 4 + 4]);
        }
    }

    let compressed = lzf_compress(&raw);
    let mut data = header(points.len(), "binary_compressed").into_bytes();
    data.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    data.extend_from_slice(&(raw.len() as u32).to_le_bytes());
    data.extend_from_slice(&compressed);
    data
}

/// Records every batch and how many times completion was signalled.
#[derive(Default)]
pub struct Recorder {
    pub batches: Vec<AttributeBatch>,
    pub completions: usize,
}

impl BatchSink for Recorder {
    fn on_batch(&mut self, batch: AttributeBatch) {
        self.batches.push(batch);
    }

    fn on_complete(&mut self, _summary: &DecodeSummary) {
        self.completions += 1;
    }
}

impl Recorder {
    pub fn merged(&self) -> AttributeBatch {
        let mut merged = AttributeBatch::default();
        for batch in &self.batches {
            merged.append(batch.clone());
        }
        merged
    }
}
