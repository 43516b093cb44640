//! Project files for the cadence timeline.
//!
//! A project is a TOML file listing tracks: a source file, where it sits on
//! the timeline, and the processing applied to it. This crate parses,
//! validates and compiles projects into a [`cadence_core::Composer`].
//!
//! # Features
//!
//! - **Project format**: serde-backed TOML with animatable parameters
//! - **Validation**: every range and conflict reported in one pass
//! - **Compilation**: one render graph per track, in a fixed chain order
//! - **Effects**: the `delay` and `pan` effect types and their parameters
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use cadence_config::{ProjectConfig, TrackConfig};
//! use cadence_core::{AudioBuffer, KeyFrameSampler, MemorySource, SoundSource, TimeRange};
//!
//! let project = ProjectConfig::from_toml(
//!     r#"
//!     sample_rate = 8000
//!
//!     [[tracks]]
//!     source = "tone.wav"
//!     start = 0.5
//!     gain = 50.0
//!     "#,
//! )
//! .unwrap();
//!
//! let mut composer = project
//!     .build(Path::new("."), |_: &Path| {
//!         let tone = AudioBuffer::from_channels(vec![vec![0.2; 8000]], 8000);
//!         Ok(Arc::new(MemorySource::new(tone)) as Arc<dyn SoundSource>)
//!     })
//!     .unwrap();
//!
//! let out = composer.render(TimeRange::from_secs_f64(0.0, 1.0), &KeyFrameSampler).unwrap();
//! assert_eq!(out.channel_count(), 2);
//! assert_eq!(out.sample_count(), 8000);
//! ```

mod animated;
mod compile;
mod effects;
mod error;
mod project;

/// Range and conflict checks for projects.
pub mod validation;

pub use animated::{AnimatedValue, EasingConfig, KeyFrameConfig};
pub use compile::{CompiledTrack, compile_track, resolve_source};
pub use effects::{EFFECT_TYPES, ParamSpec, create_effect_node, effect_params};
pub use error::ConfigError;
pub use project::{BandConfig, BandType, DelayConfig, EffectConfig, ProjectConfig, TrackConfig};
pub use validation::{ValidationError, ValidationResult, validate_project, validate_track_config};
