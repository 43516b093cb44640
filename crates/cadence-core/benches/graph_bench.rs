//! Criterion benchmarks for track rendering (`cadence-core::graph`).
//!
//! Each benchmark renders consecutive windows of a ten-second stereo source
//! so streaming nodes stay on their continuation path. Three axes:
//!
//! - **Node** - one node on top of a source chain, per node kind
//! - **Window sweep** - a full track chain across window sizes
//! - **Composer** - several tracks mixed to the master
//!
//! Run with: `cargo bench -p cadence-core -- render/`
#![allow(missing_docs)]

use std::sync::Arc;

use cadence_core::{
    AudioBuffer, AudioGraph, ClipNode, Composer, DelayNode, EqualizerBand, EqualizerNode, GainNode, GraphBuilder,
    KeyFrameSampler, MemorySource, ResampleNode, ShiftNode, SoundSource, SourceNode, SpeedNode, Time, TimeRange,
    TimeStretchNode, Track,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const PROJECT_RATE: u32 = 48000;
const SOURCE_SECONDS: usize = 10;
const WINDOW_FRAMES: usize = 1024;
const WINDOW_SIZES: &[usize] = &[256, 1024, 4096, 16384];

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn source(sample_rate: u32) -> Arc<dyn SoundSource> {
    let frames = SOURCE_SECONDS * sample_rate as usize;
    let left: Vec<f32> = (0..frames)
        .map(|n| libm::sinf(core::f32::consts::TAU * 440.0 * n as f32 / sample_rate as f32) * 0.5)
        .collect();
    let right: Vec<f32> = left.iter().map(|s| s * 0.8).collect();
    Arc::new(MemorySource::new(AudioBuffer::from_channels(vec![left, right], sample_rate)))
}

fn chain(source: &Arc<dyn SoundSource>) -> GraphBuilder {
    GraphBuilder::new(SourceNode::new(Arc::clone(source))).then(ResampleNode::new(PROJECT_RATE))
}

fn full_track(source: &Arc<dyn SoundSource>) -> AudioGraph {
    chain(source)
        .then(ShiftNode::new(Time::from_millis(250)))
        .then(SpeedNode::new(110.0))
        .then(EqualizerNode::new(vec![
            EqualizerBand::peak(250.0, -3.0, 0.7),
            EqualizerBand::peak(3000.0, 4.0, 1.2),
        ]))
        .then(DelayNode::default())
        .then(GainNode::new(80.0))
        .then(ClipNode::new(Time::ZERO, Time::from_secs(SOURCE_SECONDS as i64)))
        .build()
}

/// Consecutive windows over the first eight seconds, wrapping around.
struct Windows {
    frames: usize,
    next: i64,
}

impl Windows {
    fn new(frames: usize) -> Self {
        Self { frames, next: 0 }
    }

    fn advance(&mut self) -> TimeRange {
        let limit = 8 * i64::from(PROJECT_RATE);
        if self.next + self.frames as i64 > limit {
            self.next = 0;
        }
        let range = TimeRange::from_frames(self.next, self.frames, PROJECT_RATE);
        self.next += self.frames as i64;
        range
    }
}

fn run(graph: &mut AudioGraph, windows: &mut Windows) {
    let out = graph.render(windows.advance(), PROJECT_RATE, &KeyFrameSampler).unwrap();
    black_box(out);
}

// ---------------------------------------------------------------------------
// Per-node benchmarks, 1024-frame windows
// ---------------------------------------------------------------------------

fn bench_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/node");
    let native = source(PROJECT_RATE);
    let foreign = source(44100);

    let cases: Vec<(&str, AudioGraph)> = vec![
        ("source", chain(&native).build()),
        ("resample_44100", chain(&foreign).build()),
        ("gain", chain(&native).then(GainNode::new(50.0)).build()),
        ("delay", chain(&native).then(DelayNode::default()).build()),
        (
            "equalizer_3",
            chain(&native)
                .then(EqualizerNode::new(vec![
                    EqualizerBand::peak(100.0, 3.0, 0.7),
                    EqualizerBand::peak(1000.0, -6.0, 1.0),
                    EqualizerBand::peak(8000.0, 2.0, 2.0),
                ]))
                .build(),
        ),
        ("speed_150", chain(&native).then(SpeedNode::new(150.0)).build()),
        ("time_stretch_150", chain(&native).then(TimeStretchNode::new(150.0)).build()),
    ];

    for (name, mut graph) in cases {
        let mut windows = Windows::new(WINDOW_FRAMES);
        group.bench_function(name, |b| b.iter(|| run(&mut graph, &mut windows)));
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Window size sweep - full track chain
// ---------------------------------------------------------------------------

fn bench_window_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/window_sweep");
    let pcm = source(44100);

    for &frames in WINDOW_SIZES {
        let mut graph = full_track(&pcm);
        let mut windows = Windows::new(frames);
        group.bench_with_input(BenchmarkId::new("full_track", frames), &frames, |b, _| {
            b.iter(|| run(&mut graph, &mut windows));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Composer - four tracks to master
// ---------------------------------------------------------------------------

fn bench_composer(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/composer");
    let pcm = source(44100);
    let extent = TimeRange::new(Time::ZERO, Time::from_secs(SOURCE_SECONDS as i64));

    let mut composer = Composer::new(PROJECT_RATE);
    for index in 0..4 {
        composer.add_track(Track::new(format!("track {index}"), full_track(&pcm), extent));
    }
    let mut windows = Windows::new(WINDOW_FRAMES);
    group.bench_function("tracks_4", |b| {
        b.iter(|| {
            let out = composer.render(windows.advance(), &KeyFrameSampler).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_nodes, bench_window_sweep, bench_composer);
criterion_main!(benches);
