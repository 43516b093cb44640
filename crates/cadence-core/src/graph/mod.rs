//! Pull-based, time-indexed render graph.
//!
//! A graph is a tree of [`AudioNode`]s. Rendering asks the terminal node for
//! a time window at a sample rate; every node asks its inputs for whatever
//! window and rate it needs, transforms what they return and hands back a
//! buffer covering exactly the requested window. Nothing runs ahead of a
//! request and there is no scheduler: evaluation is a plain recursive walk.
//!
//! # Time axes
//!
//! Each node works on its own time axis. [`ClipNode`] maps the start of its
//! window to time zero of its input, [`ShiftNode`] translates, and the
//! clock-warping nodes ([`SpeedNode`], [`TimeStretchNode`]) map output time
//! onto source time. A typical track is built leaf first:
//!
//! ```text
//! Source -> Resample -> Shift(offset) -> Speed | TimeStretch
//!        -> Equalizer -> Delay -> effects -> Gain -> Clip(start, duration)
//! ```
//!
//! # State and seeking
//!
//! Stateful nodes (delay, equalizer, resampling, stretching, effects)
//! expect requests with non-decreasing start times. A request that starts
//! earlier than the previous one is a seek: state is cleared and the stream
//! restarts at the new position instead of failing.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cadence_core::{
//!     AudioBuffer, ClipNode, Composer, GraphBuilder, KeyFrameSampler, MemorySource, ResampleNode,
//!     SourceNode, Time, TimeRange, Track,
//! };
//!
//! let pcm = AudioBuffer::from_channels(vec![vec![0.25; 48000]], 48000);
//! let start = Time::from_secs(1);
//! let duration = Time::from_millis(500);
//! let graph = GraphBuilder::new(SourceNode::new(Arc::new(MemorySource::new(pcm))))
//!     .then(ResampleNode::new(48000))
//!     .then(ClipNode::new(start, duration))
//!     .build();
//!
//! let mut composer = Composer::new(48000);
//! composer.add_track(Track::new("voice", graph, TimeRange::new(start, duration)));
//! let master = composer.render(TimeRange::from_secs_f64(0.0, 2.0), &KeyFrameSampler).unwrap();
//! assert_eq!(master.channel_count(), 2);
//! assert_eq!(master.channel(0)[48000], 0.25);
//! ```

mod builder;
mod composer;
mod error;
mod node;
mod nodes;
mod stream;

#[cfg(test)]
pub(crate) mod test_util;

pub use builder::{AudioGraph, GraphBuilder};
pub use composer::{Composer, LIMITER_RATIO, LIMITER_THRESHOLD, MASTER_CHANNELS, Track};
pub use error::GraphError;
pub use node::{AudioNode, BoxedNode};
pub use nodes::{
    ClipNode, DelayNode, EffectNode, EqualizerBand, EqualizerNode, GainNode, GraphEffectNode, MAX_STRETCH_PERCENT,
    MIN_STRETCH_PERCENT, MixerNode, ResampleNode, ShiftNode, SourceNode, SpeedNode, TimeStretchNode,
};
