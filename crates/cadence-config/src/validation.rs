//! Project validation.
//!
//! [`validate_project`] checks every track and reports all problems at
//! once, so a user can fix a project file in one pass.
//!
//! # Example
//!
//! ```rust
//! use cadence_config::{ProjectConfig, TrackConfig, ValidationError, validate_project};
//!
//! let mut track = TrackConfig::new("voice.wav");
//! track.time_stretch = Some(800.0);
//! let project = ProjectConfig::default().with_track(track);
//!
//! let err = validate_project(&project).unwrap_err();
//! assert!(matches!(err, ValidationError::OutOfRange { .. }));
//! ```

use cadence_core::{MAX_STRETCH_PERCENT, MIN_STRETCH_PERCENT};
use thiserror::Error;

use crate::animated::AnimatedValue;
use crate::effects::effect_params;
use crate::project::{ProjectConfig, TrackConfig};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown effect type.
    #[error("{field}: unknown effect type: {effect}")]
    UnknownEffect {
        /// Location in the project.
        field: String,
        /// The unrecognized type.
        effect: String,
    },

    /// Unknown parameter name.
    #[error("{field}: unknown parameter '{param}' for effect '{effect}'")]
    UnknownParameter {
        /// Location in the project.
        field: String,
        /// Name of the effect.
        effect: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Value out of range.
    #[error("{field}: value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Location in the project.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Settings that cannot be combined.
    #[error("{field}: {reason}")]
    Conflict {
        /// Location in the project.
        field: String,
        /// What clashes.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Lowest accepted project sample rate.
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest accepted project sample rate.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Track speed limits in percent.
const SPEED_RANGE: (f64, f64) = (1.0, 10_000.0);

#[derive(Default)]
struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn range(&mut self, field: impl Into<String>, value: f64, min: f64, max: f64) {
        if !(value.is_finite() && value >= min && value <= max) {
            self.errors.push(ValidationError::OutOfRange {
                field: field.into(),
                value,
                min,
                max,
            });
        }
    }

    fn animated(&mut self, field: &str, value: &AnimatedValue, min: f64, max: f64) {
        for v in value.values() {
            self.range(field, f64::from(v), min, max);
        }
        for t in value.times() {
            self.range(format!("{field}.keyframes.time"), t, 0.0, f64::MAX);
        }
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

/// Validate a whole project.
pub fn validate_project(project: &ProjectConfig) -> ValidationResult<()> {
    let mut c = Collector::default();
    c.range(
        "sample_rate",
        f64::from(project.sample_rate),
        f64::from(MIN_SAMPLE_RATE),
        f64::from(MAX_SAMPLE_RATE),
    );
    c.range("channels", f64::from(project.channels), 1.0, 2.0);
    let nyquist = f64::from(project.sample_rate) / 2.0;
    for (index, track) in project.tracks.iter().enumerate() {
        validate_track(&mut c, &format!("tracks[{index}]"), track, nyquist);
    }
    c.finish()
}

/// Validate a single track on its own.
pub fn validate_track_config(track: &TrackConfig, sample_rate: u32) -> ValidationResult<()> {
    let mut c = Collector::default();
    validate_track(&mut c, "track", track, f64::from(sample_rate) / 2.0);
    c.finish()
}

fn validate_track(c: &mut Collector, at: &str, track: &TrackConfig, nyquist: f64) {
    c.range(format!("{at}.start"), track.start, 0.0, f64::MAX);
    c.range(format!("{at}.offset"), track.offset, 0.0, f64::MAX);
    if let Some(duration) = track.duration {
        c.range(format!("{at}.duration"), duration, f64::MIN_POSITIVE, f64::MAX);
    }
    c.animated(&format!("{at}.gain"), &track.gain, 0.0, 10_000.0);

    if let Some(speed) = &track.speed {
        c.animated(&format!("{at}.speed"), speed, SPEED_RANGE.0, SPEED_RANGE.1);
    }
    if let Some(stretch) = track.time_stretch {
        c.range(
            format!("{at}.time_stretch"),
            f64::from(stretch),
            f64::from(MIN_STRETCH_PERCENT),
            f64::from(MAX_STRETCH_PERCENT),
        );
    }
    if track.speed.is_some() && track.time_stretch.is_some() {
        c.errors.push(ValidationError::Conflict {
            field: at.to_string(),
            reason: "speed and time_stretch cannot both be set".into(),
        });
    }

    if let Some(delay) = &track.delay {
        c.animated(&format!("{at}.delay.delay_ms"), &delay.delay_ms, 0.0, 5000.0);
        c.animated(&format!("{at}.delay.feedback"), &delay.feedback, 0.0, 100.0);
        c.animated(&format!("{at}.delay.dry"), &delay.dry, 0.0, 400.0);
        c.animated(&format!("{at}.delay.wet"), &delay.wet, 0.0, 400.0);
    }

    for (i, band) in track.equalizer.iter().enumerate() {
        let band_at = format!("{at}.equalizer[{i}]");
        c.animated(&format!("{band_at}.frequency"), &band.frequency, 10.0, nyquist);
        c.animated(&format!("{band_at}.gain"), &band.gain, -60.0, 60.0);
        c.animated(&format!("{band_at}.q"), &band.q, 0.1, 100.0);
    }

    for (i, effect) in track.effects.iter().enumerate() {
        let effect_at = format!("{at}.effects[{i}]");
        let Some(specs) = effect_params(effect.kind()) else {
            c.errors.push(ValidationError::UnknownEffect {
                field: effect_at,
                effect: effect.kind().to_string(),
            });
            continue;
        };
        for (name, &value) in &effect.params {
            match specs.iter().find(|p| p.name == name) {
                Some(spec) => c.range(
                    format!("{effect_at}.{name}"),
                    f64::from(value),
                    f64::from(spec.min),
                    f64::from(spec.max),
                ),
                None => c.errors.push(ValidationError::UnknownParameter {
                    field: effect_at.clone(),
                    effect: effect.kind().to_string(),
                    param: name.clone(),
                }),
            }
        }
    }
}

impl ProjectConfig {
    /// Validate the project. See [`validate_project`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_project(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animated::KeyFrameConfig;
    use crate::project::{BandConfig, BandType, EffectConfig};

    fn project(track: TrackConfig) -> ProjectConfig {
        ProjectConfig::default().with_track(track)
    }

    #[test]
    fn test_default_track_is_valid() {
        assert_eq!(validate_project(&project(TrackConfig::new("a.wav"))), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut track = TrackConfig::new("a.wav").with_start(-1.0);
        track.speed = Some(AnimatedValue::Constant(150.0));
        track.time_stretch = Some(150.0);
        track.equalizer.push(BandConfig {
            band_type: BandType::Peak,
            frequency: AnimatedValue::Constant(30_000.0),
            gain: AnimatedValue::Constant(3.0),
            q: AnimatedValue::Constant(1.0),
        });
        let err = validate_project(&project(track)).unwrap_err();
        let ValidationError::Multiple(errors) = err else {
            panic!("expected several errors, got {err}");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Conflict { .. })));
        assert!(errors.iter().any(|e| e.to_string().starts_with("tracks[0].start")));
        assert!(errors.iter().any(|e| e.to_string().starts_with("tracks[0].equalizer[0].frequency")));
    }

    #[test]
    fn test_keyframe_values_are_checked() {
        let mut track = TrackConfig::new("a.wav");
        track.gain = AnimatedValue::Animated {
            value: 100.0,
            keyframes: vec![KeyFrameConfig {
                time: -2.0,
                value: -5.0,
                easing: Default::default(),
            }],
        };
        let err = validate_project(&project(track)).unwrap_err();
        assert!(matches!(err, ValidationError::Multiple(ref e) if e.len() == 2));
    }

    #[test]
    fn test_effect_params_are_checked() {
        let track = TrackConfig::new("a.wav")
            .with_effect(EffectConfig::new("pan").with_param("pan", 150.0))
            .with_effect(EffectConfig::new("delay").with_param("mix", 1.0))
            .with_effect(EffectConfig::new("chorus"));
        let err = validate_project(&project(track)).unwrap_err();
        let ValidationError::Multiple(errors) = err else {
            panic!("expected several errors");
        };
        assert!(matches!(errors[0], ValidationError::OutOfRange { .. }));
        assert!(matches!(errors[1], ValidationError::UnknownParameter { ref param, .. } if param == "mix"));
        assert!(matches!(errors[2], ValidationError::UnknownEffect { ref effect, .. } if effect == "chorus"));
    }

    #[test]
    fn test_time_stretch_bounds() {
        let mut track = TrackConfig::new("a.wav");
        track.time_stretch = Some(MAX_STRETCH_PERCENT);
        assert_eq!(validate_project(&project(track.clone())), Ok(()));

        track.time_stretch = Some(MIN_STRETCH_PERCENT - 1.0);
        let err = validate_project(&project(track)).unwrap_err();
        assert!(err.to_string().starts_with("tracks[0].time_stretch"));
    }

    #[test]
    fn test_sample_rate_and_channels() {
        let bad = ProjectConfig {
            sample_rate: 100,
            channels: 6,
            tracks: Vec::new(),
        };
        assert!(matches!(validate_project(&bad), Err(ValidationError::Multiple(ref e)) if e.len() == 2));
    }
}
