//! Integration tests for the cadence-core render graph.
//!
//! Builds real node chains over in-memory sources and checks them with
//! signal-level measurements: sample counts, impulse trains, zero crossings
//! for dominant frequency, and reconstruction error after resampling.

use std::sync::Arc;

use cadence_core::{
    AudioBuffer, AudioGraph, AudioNode, ClipNode, Composer, DelayNode, DelayParams, EqualizerBand, EqualizerNode,
    GainNode, GraphBuilder, GraphError, KeyFrameSampler, MemorySource, MixerNode, ProcessContext, ResampleNode,
    ShiftNode, SoundSource, SourceNode, SpeedNode, Time, TimeRange, TimeStretchNode, Track, rms,
};

const TAU: f32 = core::f32::consts::TAU;

fn sine_source(freq: f32, sample_rate: u32, seconds: f32, channels: usize) -> Arc<dyn SoundSource> {
    let frames = (seconds * sample_rate as f32) as usize;
    let samples: Vec<f32> = (0..frames)
        .map(|n| libm::sinf(TAU * freq * n as f32 / sample_rate as f32))
        .collect();
    let buffer = AudioBuffer::from_channels(vec![samples; channels], sample_rate);
    Arc::new(MemorySource::new(buffer).with_name("sine"))
}

fn impulse_source(sample_rate: u32, frames: usize) -> Arc<dyn SoundSource> {
    let mut samples = vec![0.0; frames];
    samples[0] = 1.0;
    Arc::new(MemorySource::new(AudioBuffer::from_channels(vec![samples], sample_rate)))
}

fn render(graph: &mut AudioGraph, range: TimeRange, sample_rate: u32) -> AudioBuffer {
    graph.render(range, sample_rate, &KeyFrameSampler).expect("render failed")
}

fn zero_crossings(samples: &[f32]) -> usize {
    samples.windows(2).filter(|w| (w[0] < 0.0) != (w[1] < 0.0)).count()
}

fn source_chain(source: &Arc<dyn SoundSource>, rate: u32) -> GraphBuilder {
    GraphBuilder::new(SourceNode::new(Arc::clone(source))).then(ResampleNode::new(rate))
}

// ============================================================================
// 1. Sample-count contract
// ============================================================================

#[test]
fn every_node_returns_the_requested_length() {
    const RATE: u32 = 48000;
    let source = sine_source(440.0, 44100, 2.0, 2);
    let windows = [(0.0, 0.1), (0.0333, 0.0171), (0.5, 0.25), (1.2, 0.0)];
    let builders: [fn(&Arc<dyn SoundSource>) -> AudioGraph; 8] = [
        |s| source_chain(s, RATE).build(),
        |s| source_chain(s, RATE).then(ShiftNode::new(Time::from_millis(7))).build(),
        |s| source_chain(s, RATE).then(GainNode::new(50.0)).build(),
        |s| source_chain(s, RATE).then(DelayNode::default()).build(),
        |s| {
            source_chain(s, RATE)
                .then(EqualizerNode::new(vec![EqualizerBand::peak(1000.0, 6.0, 1.0)]))
                .build()
        },
        |s| source_chain(s, RATE).then(SpeedNode::new(137.0)).build(),
        |s| source_chain(s, RATE).then(TimeStretchNode::new(80.0)).build(),
        |s| source_chain(s, RATE).then(ClipNode::new(Time::ZERO, Time::from_secs(10))).build(),
    ];
    for build in builders {
        let mut graph = build(&source);
        for (start, duration) in windows {
            let range = TimeRange::from_secs_f64(start, duration);
            let out = render(&mut graph, range, RATE);
            assert_eq!(out.sample_rate(), RATE, "{}", graph.describe());
            assert_eq!(out.sample_count(), range.sample_count(RATE), "{}", graph.describe());
        }
    }
}

// ============================================================================
// 2. Clip and mixer
// ============================================================================

#[test]
fn clip_window_matches_shifted_input() {
    let source = sine_source(300.0, 48000, 1.0, 1);
    let mut plain = source_chain(&source, 48000).build();
    let mut clipped = source_chain(&source, 48000)
        .then(ClipNode::new(Time::from_secs(2), Time::from_millis(500)))
        .build();

    let out = render(&mut clipped, TimeRange::from_secs_f64(2.1, 0.05), 48000);
    let expected = render(&mut plain, TimeRange::from_secs_f64(0.1, 0.05), 48000);
    assert_eq!(out, expected);
    assert!(rms(out.channel(0)) > 0.5);

    let err = clipped
        .render(TimeRange::from_secs_f64(0.0, 1.0), 48000, &KeyFrameSampler)
        .unwrap_err();
    assert!(matches!(err, GraphError::DisjointRange { .. }));
}

#[test]
fn mixer_is_linear() {
    let source = sine_source(500.0, 48000, 0.5, 2);
    let range = TimeRange::from_secs_f64(0.0, 0.1);
    let single = render(&mut source_chain(&source, 48000).build(), range, 48000);

    let mut doubled = MixerNode::new(vec![1.0, 1.0]);
    doubled.add_input(source_chain(&source, 48000).build().into_root());
    doubled.add_input(source_chain(&source, 48000).build().into_root());
    let sum = render(&mut AudioGraph::new(Box::new(doubled)), range, 48000);
    for ch in 0..2 {
        for (s, x) in sum.channel(ch).iter().zip(single.channel(ch)) {
            assert_eq!(*s, 2.0 * x);
        }
    }

    let mut first_only = MixerNode::new(vec![1.0, 0.0]);
    first_only.add_input(source_chain(&source, 48000).build().into_root());
    first_only.add_input(source_chain(&sine_source(900.0, 48000, 0.5, 2), 48000).build().into_root());
    assert_eq!(render(&mut AudioGraph::new(Box::new(first_only)), range, 48000), single);
}

// ============================================================================
// 3. Gain, equalizer identity
// ============================================================================

#[test]
fn unity_gain_and_empty_equalizer_are_identities() {
    let source = sine_source(440.0, 48000, 0.5, 2);
    let range = TimeRange::from_secs_f64(0.2, 0.1);
    let reference = render(&mut source_chain(&source, 48000).build(), range, 48000);

    let mut gain = source_chain(&source, 48000).then(GainNode::new(100.0)).build();
    assert_eq!(render(&mut gain, range, 48000), reference);

    let mut eq = source_chain(&source, 48000).then(EqualizerNode::new(Vec::new())).build();
    assert_eq!(render(&mut eq, range, 48000), reference);
}

// ============================================================================
// 4. Delay
// ============================================================================

fn delay_graph(delay_ms: f32) -> AudioGraph {
    GraphBuilder::new(SourceNode::new(impulse_source(1000, 1000)))
        .then(ResampleNode::new(1000))
        .then(DelayNode::new(DelayParams {
            delay_ms,
            feedback: 50.0,
            dry: 100.0,
            wet: 100.0,
        }))
        .build()
}

#[test]
fn delay_produces_impulse_train() {
    let mut graph = delay_graph(25.0);
    let out = render(&mut graph, TimeRange::from_secs_f64(0.0, 0.1), 1000);
    let samples = out.channel(0);
    let expected = [(0, 1.0), (25, 1.0), (50, 0.5), (75, 0.25)];
    for (index, value) in expected {
        assert_eq!(samples[index], value, "sample {index}");
    }
    let nonzero = samples.iter().filter(|s| **s != 0.0).count();
    assert_eq!(nonzero, expected.len());
}

#[test]
fn delay_seek_discards_tail() {
    let mut graph = delay_graph(25.0);
    render(&mut graph, TimeRange::from_secs_f64(0.0, 0.01), 1000);
    render(&mut graph, TimeRange::from_secs_f64(0.01, 0.01), 1000);
    // Jump back: the impulse replays without anything leaked from before.
    let out = render(&mut graph, TimeRange::from_secs_f64(0.0, 0.03), 1000);
    assert_eq!(out.channel(0)[0], 1.0);
    assert_eq!(out.channel(0)[25], 1.0);
    assert_eq!(out.channel(0).iter().filter(|s| **s != 0.0).count(), 2);
}

// ============================================================================
// 5. Resampling
// ============================================================================

#[test]
fn resample_at_source_rate_is_untouched() {
    let source = sine_source(440.0, 44100, 0.5, 1);
    let mut direct = SourceNode::new(Arc::clone(&source));
    let mut graph = source_chain(&source, 44100).build();
    let range = TimeRange::from_secs_f64(0.1, 0.1);
    let sampler = KeyFrameSampler;
    let expected = direct.process(&ProcessContext::new(range, 44100, &sampler)).unwrap();
    assert_eq!(render(&mut graph, range, 44100), expected);
}

#[test]
fn resample_round_trip_reconstructs_signal() {
    let source = sine_source(1000.0, 48000, 1.0, 1);
    let mut graph = GraphBuilder::new(SourceNode::new(Arc::clone(&source)))
        .then(ResampleNode::new(44100))
        .then(ResampleNode::new(48000))
        .build();
    let range = TimeRange::from_secs_f64(0.25, 0.25);
    let out = render(&mut graph, range, 48000);
    let mut direct = source_chain(&source, 48000).build();
    let expected = render(&mut direct, range, 48000);
    let mut worst = 0.0_f32;
    for (a, b) in out.channel(0).iter().zip(expected.channel(0)) {
        worst = worst.max((a - b).abs());
    }
    assert!(worst < 0.02, "max error {worst}");
}

// ============================================================================
// 6. Speed vs time stretch
// ============================================================================

#[test]
fn speed_shifts_pitch_and_stretch_preserves_it() {
    let rate = 16000;
    let source = sine_source(440.0, rate, 3.0, 1);
    let range = TimeRange::from_secs_f64(0.0, 1.0);

    let mut speed = source_chain(&source, rate).then(SpeedNode::new(200.0)).build();
    let fast = render(&mut speed, range, rate);
    assert_eq!(fast.sample_count(), 16000);
    let crossings = zero_crossings(fast.channel(0)) as f32;
    assert!((crossings - 1760.0).abs() < 20.0, "speed crossings {crossings}");

    let mut stretch = source_chain(&source, rate).then(TimeStretchNode::new(200.0)).build();
    let stretched = render(&mut stretch, range, rate);
    assert_eq!(stretched.sample_count(), 16000);
    let crossings = zero_crossings(stretched.channel(0)) as f32;
    assert!((crossings - 880.0).abs() < 30.0, "stretch crossings {crossings}");
}

// ============================================================================
// 7. Whole timeline
// ============================================================================

#[test]
fn composer_renders_positioned_tracks() {
    let rate = 48000;
    let voice = sine_source(440.0, 44100, 2.0, 1);
    let music = sine_source(220.0, 48000, 2.0, 2);

    let voice_graph = source_chain(&voice, rate)
        .then(ShiftNode::new(Time::from_millis(500)))
        .then(GainNode::new(50.0))
        .then(ClipNode::new(Time::from_secs(1), Time::from_secs(1)))
        .build();
    let music_graph = source_chain(&music, rate)
        .then(ClipNode::new(Time::ZERO, Time::from_millis(1500)))
        .build();

    let mut composer = Composer::new(rate);
    composer.add_track(Track::new(
        "voice",
        voice_graph,
        TimeRange::new(Time::from_secs(1), Time::from_secs(1)),
    ));
    composer.add_track(Track::new("music", music_graph, TimeRange::new(Time::ZERO, Time::from_millis(1500))));
    assert_eq!(composer.duration(), Time::from_secs(2));

    let mut rendered = Vec::new();
    for block in 0..8 {
        let window = TimeRange::from_secs_f64(f64::from(block) * 0.25, 0.25);
        let out = composer.render(window, &KeyFrameSampler).unwrap();
        assert_eq!(out.channel_count(), 2);
        rendered.extend_from_slice(out.channel(0));
    }
    assert_eq!(rendered.len(), 96000);
    // Music alone, both, voice alone.
    let music_only = rms(&rendered[12000..36000]);
    let both = rms(&rendered[60000..70000]);
    let voice_only = rms(&rendered[80000..94000]);
    assert!((music_only - 0.707).abs() < 0.02, "{music_only}");
    assert!((voice_only - 0.354).abs() < 0.02, "{voice_only}");
    assert!(both > voice_only);
    composer.dispose();
}
