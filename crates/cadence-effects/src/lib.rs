//! Cadence Effects - built-in effect plugins
//!
//! Effects here implement the plugin contracts from `cadence-core` and are
//! hosted by its bridge nodes like any third-party plugin:
//!
//! - [`DelayEffect`] - Feedback delay as a native [`AudioEffect`](cadence_core::AudioEffect),
//!   hosted by [`GraphEffectNode`](cadence_core::GraphEffectNode)
//! - [`PanEffect`] - Constant-power stereo pan as a legacy
//!   [`SoundEffect`](cadence_core::SoundEffect), hosted by [`EffectNode`](cadence_core::EffectNode)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cadence_core::{
//!     AudioBuffer, EffectNode, GraphBuilder, GraphEffectNode, KeyFrameSampler, MemorySource, ResampleNode,
//!     SourceNode, TimeRange,
//! };
//! use cadence_effects::{DelayEffect, PanEffect};
//!
//! let pcm = AudioBuffer::from_channels(vec![vec![0.5; 48000]], 48000);
//! let mut graph = GraphBuilder::new(SourceNode::new(Arc::new(MemorySource::new(pcm))))
//!     .then(ResampleNode::new(48000))
//!     .then(GraphEffectNode::new(Arc::new(DelayEffect::new().with_delay_ms(120.0))))
//!     .then(EffectNode::new(Arc::new(PanEffect::new(-40.0))))
//!     .build();
//!
//! let out = graph.render(TimeRange::from_secs_f64(0.0, 0.5), 48000, &KeyFrameSampler).unwrap();
//! assert_eq!(out.channel_count(), 2);
//! ```

pub mod delay;
pub mod pan;

// Re-export main types at crate root
pub use delay::DelayEffect;
pub use pan::{PanEffect, pan_gains};
