//! Cadence Core - pull-based audio rendering graph for timeline editors
//!
//! This crate turns a timeline of audio clips into sample buffers on demand.
//! Callers ask for a time window at a sample rate; the graph pulls exactly
//! the material that window needs from its sources, through clipping,
//! repositioning, resampling, speed changes, filtering and effects.
//!
//! # Core Abstractions
//!
//! ## Time and Buffers
//!
//! - [`Time`] / [`TimeRange`] - Nanosecond timeline positions and windows
//! - [`AudioBuffer`] - Per-channel float sample storage with a sample rate
//! - [`ProcessContext`] - One render request (window, rate, animation sampler)
//!
//! ## Graph
//!
//! - [`AudioNode`] - The node contract: produce a buffer for a context
//! - [`GraphBuilder`] / [`AudioGraph`] - Chain nodes into a renderable tree
//! - [`Composer`] - Mix track graphs into a limited stereo master
//!
//! ## Animation
//!
//! - [`Property`] - A parameter value with an optional keyframe curve
//! - [`AnimationSampler`] - Evaluates properties per sample ([`KeyFrameSampler`] is the stock one)
//!
//! ## DSP Primitives
//!
//! - [`FeedbackDelay`] / [`DelayLine`] - Multi-channel feedback delay
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`SincResampler`] - Streaming windowed-sinc resampler with a variable ratio
//! - [`Wsola`] - Pitch-preserving time stretching
//! - [`SpeedIntegrator`] - Output-time to source-time mapping under animated speed
//!
//! ## Plugins and Sources
//!
//! - [`SoundSource`] - Decoded PCM provider read by [`SourceNode`]
//! - [`AudioEffect`] / [`SoundEffect`] - Native and legacy effect plugin contracts
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cadence_core::{
//!     AudioBuffer, DelayNode, DelayParams, GainNode, GraphBuilder, KeyFrameSampler, MemorySource,
//!     ResampleNode, SourceNode, TimeRange,
//! };
//!
//! let pcm = AudioBuffer::from_channels(vec![vec![0.5; 22050], vec![0.5; 22050]], 22050);
//! let mut graph = GraphBuilder::new(SourceNode::new(Arc::new(MemorySource::new(pcm))))
//!     .then(ResampleNode::new(48000))
//!     .then(DelayNode::new(DelayParams::default()))
//!     .then(GainNode::new(80.0))
//!     .build();
//!
//! // Render in contiguous windows so the delay tail carries over.
//! for block in 0..4 {
//!     let window = TimeRange::from_secs_f64(block as f64 * 0.25, 0.25);
//!     let out = graph.render(window, 48000, &KeyFrameSampler).unwrap();
//!     assert_eq!(out.sample_count(), 12000);
//! }
//! ```
//!
//! # Logging
//!
//! With the `tracing` feature, state transitions (seek resets, DSP state
//! allocation, resampler re-seeding, effect processor creation, skipped
//! tracks) are reported at debug level.

pub mod animation;
pub mod biquad;
pub mod buffer;
pub mod context;
pub mod delay;
pub mod effect;
pub mod graph;
pub mod integrator;
pub mod math;
pub mod resample;
pub mod source;
pub mod time;
pub mod wsola;

// Re-export main types at crate root
pub use animation::{AnimationSampler, Easing, KeyFrame, KeyFrameAnimation, KeyFrameSampler, Property};
pub use biquad::{
    Biquad, Coefficients, FilterType, bandpass_coefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, notch_coefficients, peaking_eq_coefficients,
};
pub use buffer::AudioBuffer;
pub use context::ProcessContext;
pub use delay::{DelayLine, DelayParams, FeedbackDelay, MAX_DELAY_MS};
pub use effect::{
    AudioEffect, AudioEffectProcessor, SoundEffect, SoundProcessor, from_stereo_frames, to_stereo_frames,
};
pub use graph::{
    AudioGraph, AudioNode, BoxedNode, ClipNode, Composer, DelayNode, EffectNode, EqualizerBand, EqualizerNode,
    GainNode, GraphBuilder, GraphEffectNode, GraphError, MAX_STRETCH_PERCENT, MIN_STRETCH_PERCENT, MixerNode,
    ResampleNode, ShiftNode, SourceNode, SpeedNode, TimeStretchNode, Track,
};
pub use integrator::{MAX_SPEED, MIN_SPEED, SpeedIntegrator, clamp_speed, speed_from_percent};
pub use math::{
    add_with_gain, apply_gain, apply_limiter, apply_soft_clipper, db_to_linear, fade_in, fade_out, flush_denormal,
    linear_to_db, multiply_buffers, normalize, peak, rms,
};
pub use resample::SincResampler;
pub use source::{BoxError, MemorySource, Pcm, SoundSource};
pub use time::{Time, TimeRange};
pub use wsola::{Wsola, WsolaConfig};
