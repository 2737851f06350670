use argh::FromArgs;
use serde::Serialize;
use std::{path::PathBuf, sync::mpsc, thread};

use pcd_stream::{
    AttributeBatch, BatchCollector, BatchSink, DecodeOptions, DecodeSummary, PcdDecoder,
    ProgressAggregator,
};

#[derive(FromArgs)]
/// Decode PCD files and print a summary of their contents
struct Args {
    /// paths to the PCD files
    #[argh(positional)]
    paths: Vec<PathBuf>,

    /// bytes of point data decoded per batch
    #[argh(option, default = "pcd_stream::DEFAULT_CHUNK_SIZE")]
    chunk_size: usize,

    /// print the report as JSON
    #[argh(switch)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    path: PathBuf,
    encoding: String,
    declared_points: usize,
    decoded_points: usize,
    batches: usize,
    attributes: Vec<&'static str>,
    min_bound: Option<[f32; 3]>,
    max_bound: Option<[f32; 3]>,
}

struct Progress {
    index: usize,
    loaded: usize,
    total: usize,
}

/// Forwards progress to the main thread and keeps the merged attributes.
struct ProgressSink {
    index: usize,
    tx: mpsc::Sender<Progress>,
    collector: BatchCollector,
}

impl BatchSink for ProgressSink {
    fn on_batch(&mut self, batch: AttributeBatch) {
        // the receiver only goes away once every decode has returned
        let _ = self.tx.send(Progress {
            index: self.index,
            loaded: batch.loaded,
            total: batch.total,
        });
        self.collector.on_batch(batch);
    }

    fn on_complete(&mut self, summary: &DecodeSummary) {
        self.collector.on_complete(summary);
    }
}

fn bounds(position: &[f32]) -> Option<([f32; 3], [f32; 3])> {
    let mut points = position.chunks_exact(3);
    let first = points.next()?;
    let init = ([first[0], first[1], first[2]], [first[0], first[1], first[2]]);
    Some(points.fold(init, |(mut min, mut max), p| {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
        (min, max)
    }))
}

fn decode_file(
    index: usize,
    path: PathBuf,
    decoder: &PcdDecoder,
    tx: mpsc::Sender<Progress>,
) -> Result<Report, Box<dyn std::error::Error + Send + Sync>> {
    let data = std::fs::read(&path)?;
    let mut sink = ProgressSink {
        index,
        tx,
        collector: BatchCollector::new(),
    };
    let summary = decoder.decode(&data, &mut sink)?;
    let merged = sink.collector.into_batch();

    let attributes = [
        ("position", merged.position.is_empty()),
        ("normal", merged.normal.is_empty()),
        ("color", merged.color.is_empty()),
        ("intensity", merged.intensity.is_empty()),
        ("label", merged.label.is_empty()),
    ]
    .into_iter()
    .filter(|(_, empty)| !empty)
    .map(|(name, _)| name)
    .collect();

    let (min_bound, max_bound) = match bounds(&merged.position) {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    Ok(Report {
        path,
        encoding: summary.encoding.to_string(),
        declared_points: summary.declared_points,
        decoded_points: summary.decoded_points,
        batches: summary.batches,
        attributes,
        min_bound,
        max_bound,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.paths.is_empty() {
        return Err("no PCD files given".into());
    }

    let decoder = PcdDecoder::new(DecodeOptions::default().with_chunk_size(args.chunk_size));
    let (tx, rx) = mpsc::channel();

    // one decode per thread, progress reported back over the channel
    let results = thread::scope(|s| {
        let handles = args
            .paths
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, path)| {
                let tx = tx.clone();
                let decoder = &decoder;
                s.spawn(move || decode_file(index, path, decoder, tx))
            })
            .collect::<Vec<_>>();
        drop(tx);

        let mut aggregator = ProgressAggregator::new(handles.len());
        for progress in rx {
            let overall = aggregator.update(progress.index, progress.loaded, progress.total);
            log::info!(
                "progress {:.1}% ({:.2}/{} files)",
                overall * 100.0,
                aggregator.overall_loaded(),
                aggregator.num_sources()
            );
        }

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| "decode thread panicked".to_string()))
            .collect::<Vec<_>>()
    });

    let mut reports = Vec::new();
    for (path, result) in args.paths.iter().zip(results) {
        match result? {
            Ok(report) => reports.push(report),
            Err(e) => log::error!("failed to decode {}: {e}", path.display()),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{}", report.path.display());
        println!("  encoding: {}", report.encoding);
        println!(
            "  points: #{} decoded, #{} declared in {} batches",
            report.decoded_points, report.declared_points, report.batches
        );
        println!("  attributes: {}", report.attributes.join(", "));
        if let (Some(min), Some(max)) = (report.min_bound, report.max_bound) {
            println!("  bounds: {min:?} .. {max:?}");
        }
    }

    Ok(())
}
