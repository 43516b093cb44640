//! Effect types that can appear in a track's effect list.

use std::sync::Arc;

use cadence_core::{BoxedNode, DelayParams, EffectNode, GraphEffectNode};
use cadence_effects::{DelayEffect, PanEffect};

use crate::error::ConfigError;
use crate::project::EffectConfig;

/// Range and default of one effect parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name as written in project files.
    pub name: &'static str,
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
    /// Value used when the parameter is omitted.
    pub default: f32,
}

const DELAY_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "delay_ms",
        min: 0.0,
        max: 5000.0,
        default: 200.0,
    },
    ParamSpec {
        name: "feedback",
        min: 0.0,
        max: 100.0,
        default: 50.0,
    },
    ParamSpec {
        name: "dry",
        min: 0.0,
        max: 400.0,
        default: 60.0,
    },
    ParamSpec {
        name: "wet",
        min: 0.0,
        max: 400.0,
        default: 40.0,
    },
];

const PAN_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "pan",
    min: -100.0,
    max: 100.0,
    default: 0.0,
}];

/// Effect type names accepted in `[[tracks.effects]]`.
pub const EFFECT_TYPES: &[&str] = &["delay", "pan"];

/// Parameters of an effect type, or `None` for unknown types.
pub fn effect_params(kind: &str) -> Option<&'static [ParamSpec]> {
    match kind {
        "delay" => Some(DELAY_PARAMS),
        "pan" => Some(PAN_PARAMS),
        _ => None,
    }
}

fn param(config: &EffectConfig, specs: &[ParamSpec], name: &str) -> f32 {
    let default = specs.iter().find(|p| p.name == name).map_or(0.0, |p| p.default);
    config.get_param(name).unwrap_or(default)
}

/// Creates the bridge node hosting the configured effect.
///
/// `delay` becomes a native effect in a [`GraphEffectNode`]; `pan` is a
/// legacy PCM effect in an [`EffectNode`].
pub fn create_effect_node(config: &EffectConfig) -> Result<BoxedNode, ConfigError> {
    let kind = config.kind();
    let enabled = !config.is_bypassed();
    let node: BoxedNode = match kind {
        "delay" => {
            let params = DelayParams {
                delay_ms: param(config, DELAY_PARAMS, "delay_ms"),
                feedback: param(config, DELAY_PARAMS, "feedback"),
                dry: param(config, DELAY_PARAMS, "dry"),
                wet: param(config, DELAY_PARAMS, "wet"),
            };
            let effect = DelayEffect::from_params(params).with_enabled(enabled);
            Box::new(GraphEffectNode::new(Arc::new(effect)))
        }
        "pan" => {
            let effect = PanEffect::new(param(config, PAN_PARAMS, "pan")).with_enabled(enabled);
            Box::new(EffectNode::new(Arc::new(effect)))
        }
        other => return Err(ConfigError::UnknownEffect(other.to_string())),
    };
    Ok(node)
}
