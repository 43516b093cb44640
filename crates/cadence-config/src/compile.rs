//! Turning a validated project into render graphs.
//!
//! Each track becomes one chain, leaf first:
//!
//! ```text
//! Source -> Resample(project rate) -> Shift(+offset) -> Speed | TimeStretch
//!        -> Equalizer -> Delay -> Effects... -> Gain -> Clip(start, duration)
//! ```
//!
//! Stages a track does not configure are left out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_core::{
    AudioGraph, BoxError, ClipNode, Composer, DelayNode, DelayParams, EqualizerBand, EqualizerNode, GainNode,
    GraphBuilder, MAX_SPEED, MAX_STRETCH_PERCENT, MIN_SPEED, MIN_STRETCH_PERCENT, ResampleNode, ShiftNode,
    SoundSource, SourceNode, SpeedNode, Time, TimeRange, TimeStretchNode, Track,
};

use crate::effects::create_effect_node;
use crate::error::ConfigError;
use crate::project::{DelayConfig, ProjectConfig, TrackConfig};
use crate::validation::{ValidationError, validate_track_config};

/// A compiled track: its graph and where it sits on the timeline.
#[derive(Debug)]
pub struct CompiledTrack {
    /// Display name.
    pub name: String,
    /// Render graph, terminated by the clip.
    pub graph: AudioGraph,
    /// Timeline span of the clip.
    pub extent: TimeRange,
}

impl From<CompiledTrack> for Track {
    fn from(track: CompiledTrack) -> Self {
        Track::new(track.name, track.graph, track.extent)
    }
}

/// Resolves a track's source path against the project directory.
pub fn resolve_source(base_dir: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        base_dir.join(source)
    }
}

/// Source time consumed per second of clip at the track's base speed.
fn base_speed(track: &TrackConfig) -> f64 {
    if let Some(stretch) = track.time_stretch {
        f64::from(stretch.clamp(MIN_STRETCH_PERCENT, MAX_STRETCH_PERCENT)) / 100.0
    } else if let Some(speed) = &track.speed {
        (f64::from(speed.base_value()) / 100.0).clamp(MIN_SPEED, MAX_SPEED)
    } else {
        1.0
    }
}

fn delay_node(config: &DelayConfig) -> DelayNode {
    let mut node = DelayNode::new(DelayParams {
        delay_ms: config.delay_ms.base_value(),
        feedback: config.feedback.base_value(),
        dry: config.dry.base_value(),
        wet: config.wet.base_value(),
    });
    *node.delay_time_mut() = config.delay_ms.to_property();
    *node.feedback_mut() = config.feedback.to_property();
    *node.dry_mix_mut() = config.dry.to_property();
    *node.wet_mix_mut() = config.wet.to_property();
    node
}

/// Builds the graph of one track over an already loaded `source`.
///
/// Without an explicit duration the clip runs to the end of the source at
/// the track's base speed (animated speed curves are not integrated here).
pub fn compile_track(
    track: &TrackConfig,
    source: Arc<dyn SoundSource>,
    sample_rate: u32,
) -> Result<CompiledTrack, ConfigError> {
    validate_track_config(track, sample_rate)?;
    let name = track.display_name();

    let duration = Time::from_secs_f64(match track.duration {
        Some(duration) => duration,
        None => (source.duration().as_secs_f64() - track.offset) / base_speed(track),
    });
    if duration <= Time::ZERO {
        return Err(ValidationError::Conflict {
            field: name,
            reason: format!(
                "offset {}s leaves nothing of a {:.3}s source",
                track.offset,
                source.duration().as_secs_f64()
            ),
        }
        .into());
    }
    let extent = TimeRange::new(Time::from_secs_f64(track.start), duration);

    let source_rate = source.sample_rate();
    let offset = Time::from_secs_f64(track.offset);
    let mut builder = GraphBuilder::new(SourceNode::new(source))
        .then(ResampleNode::new(sample_rate).with_source_rate(source_rate))
        .then_maybe((offset != Time::ZERO).then(|| ShiftNode::new(offset)));

    if let Some(speed) = &track.speed {
        builder = builder.then(SpeedNode::new(speed.to_property()));
    } else if let Some(stretch) = track.time_stretch {
        builder = builder.then(TimeStretchNode::new(stretch));
    }

    if !track.equalizer.is_empty() {
        let bands = track
            .equalizer
            .iter()
            .map(|band| {
                EqualizerBand::new(
                    band.band_type.into(),
                    band.frequency.to_property(),
                    band.gain.to_property(),
                    band.q.to_property(),
                )
            })
            .collect();
        builder = builder.then(EqualizerNode::new(bands));
    }

    builder = builder.then_maybe(track.delay.as_ref().map(delay_node));

    for effect in &track.effects {
        builder = builder.then_boxed(create_effect_node(effect)?);
    }

    let graph = builder
        .then(GainNode::new(track.gain.to_property()))
        .then(ClipNode::new(extent.start(), extent.duration()))
        .build();

    tracing::debug!(track = %name, %extent, "compiled track:\n{}", graph.describe());
    Ok(CompiledTrack { name, graph, extent })
}

impl ProjectConfig {
    /// Validates the project and compiles every unmuted track into a
    /// [`Composer`].
    ///
    /// `base_dir` is the directory relative source paths are resolved
    /// against; `loader` opens each resolved path.
    pub fn build<F>(&self, base_dir: &Path, mut loader: F) -> Result<Composer, ConfigError>
    where
        F: FnMut(&Path) -> Result<Arc<dyn SoundSource>, BoxError>,
    {
        self.validate()?;
        let mut composer = Composer::new(self.sample_rate);
        for track in self.tracks.iter().filter(|t| !t.muted) {
            let path = resolve_source(base_dir, &track.source);
            let source = loader(&path).map_err(|source| ConfigError::Source {
                path: path.clone(),
                source,
            })?;
            let compiled = compile_track(track, source, self.sample_rate)?;
            tracing::info!(
                track = %compiled.name,
                start = compiled.extent.start().as_secs_f64(),
                duration = compiled.extent.duration().as_secs_f64(),
                "added track"
            );
            composer.add_track(compiled.into());
        }
        Ok(composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animated::AnimatedValue;
    use crate::project::{BandConfig, BandType, EffectConfig};
    use cadence_core::{AudioBuffer, KeyFrameSampler, MemorySource};

    fn tone(seconds: usize, rate: u32) -> Arc<dyn SoundSource> {
        let frames = seconds * rate as usize;
        Arc::new(MemorySource::new(AudioBuffer::from_channels(vec![vec![0.5; frames]], rate)))
    }

    #[test]
    fn test_chain_order_follows_track_settings() {
        let mut track = TrackConfig::new("a.wav").with_start(1.0);
        track.offset = 0.5;
        track.speed = Some(AnimatedValue::Constant(200.0));
        track.equalizer.push(BandConfig {
            band_type: BandType::LowPass,
            frequency: AnimatedValue::Constant(2000.0),
            gain: AnimatedValue::Constant(0.0),
            q: AnimatedValue::Constant(0.7),
        });
        track.delay = Some(DelayConfig::default());
        track.effects.push(EffectConfig::new("pan"));

        let compiled = compile_track(&track, tone(4, 44100), 48000).unwrap();
        let dump = compiled.graph.describe();
        let names: Vec<&str> = dump
            .lines()
            .map(|l| l.trim_start().split('(').next().unwrap_or(""))
            .collect();
        assert_eq!(
            names,
            [
                "ClipNode",
                "GainNode",
                "EffectNode",
                "DelayNode",
                "EqualizerNode",
                "SpeedNode",
                "ShiftNode",
                "ResampleNode",
                "SourceNode"
            ]
        );
        // 3.5 s of source left, played at double speed.
        assert_eq!(compiled.extent, TimeRange::new(Time::from_secs(1), Time::from_millis(1750)));
    }

    #[test]
    fn test_offset_past_the_end_is_rejected() {
        let mut track = TrackConfig::new("a.wav");
        track.offset = 5.0;
        let err = compile_track(&track, tone(2, 8000), 8000).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ValidationError::Conflict { .. })));
    }

    #[test]
    fn test_offset_at_the_exact_end_is_rejected() {
        let mut track = TrackConfig::new("a.wav");
        track.offset = 2.0;
        let err = compile_track(&track, tone(2, 8000), 8000).unwrap_err();
        assert!(err.to_string().contains("leaves nothing"), "{err}");
    }

    #[test]
    fn test_build_reports_offset_past_the_end_instead_of_panicking() {
        let mut track = TrackConfig::new("short.wav").with_start(3.0);
        track.offset = 10.0;
        let project = ProjectConfig::default().with_track(track);
        let err = project.build(Path::new("."), |_: &Path| Ok(tone(1, 48000))).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ValidationError::Conflict { .. })));
    }

    #[test]
    fn test_build_skips_muted_tracks_and_resolves_paths() {
        let mut muted = TrackConfig::new("b.wav");
        muted.muted = true;
        let project = ProjectConfig::default()
            .with_track(TrackConfig::new("a.wav").with_duration(1.0))
            .with_track(muted);

        let mut loaded = Vec::new();
        let mut composer = project
            .build(Path::new("/projects/demo"), |path: &Path| {
                loaded.push(path.to_path_buf());
                Ok(tone(2, 48000))
            })
            .unwrap();
        assert_eq!(loaded, [PathBuf::from("/projects/demo/a.wav")]);
        assert_eq!(composer.tracks().len(), 1);
        assert_eq!(composer.duration(), Time::from_secs(1));

        let out = composer
            .render(TimeRange::from_secs_f64(0.25, 0.1), &KeyFrameSampler)
            .unwrap();
        assert!(out.channel(0).iter().all(|s| (*s - 0.5).abs() < 1e-3));
    }

    #[test]
    fn test_loader_failure_names_the_path() {
        let project = ProjectConfig::default().with_track(TrackConfig::new("gone.wav"));
        let err = project
            .build(Path::new("dir"), |_: &Path| Err("no such file".into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to load source 'dir/gone.wav': no such file");
    }
}
