use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::effect::{
    AudioEffect, AudioEffectProcessor, SoundEffect, SoundProcessor, from_stereo_frames, to_stereo_frames,
};
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, SeekDetector, expect_format, single_input};
use crate::time::TimeRange;

/// Hosts a legacy [`SoundEffect`].
///
/// The input is converted to interleaved stereo frames, processed in place
/// and converted back, so the output is always stereo. A disabled effect
/// passes the input through unchanged. The processor is created on first
/// use and recreated when the effect or the sample rate changes, or on a
/// seek (legacy processors cannot be reset).
pub struct EffectNode {
    effect: Arc<dyn SoundEffect>,
    processor: Option<Box<dyn SoundProcessor>>,
    processor_rate: u32,
    seek: SeekDetector,
    inputs: Vec<BoxedNode>,
}

impl EffectNode {
    /// Hosts `effect`.
    pub fn new(effect: Arc<dyn SoundEffect>) -> Self {
        Self {
            effect,
            processor: None,
            processor_rate: 0,
            seek: SeekDetector::default(),
            inputs: Vec::new(),
        }
    }

    /// The hosted effect.
    pub fn effect(&self) -> &Arc<dyn SoundEffect> {
        &self.effect
    }

    /// Replaces the hosted effect; a new processor is created on the next
    /// call.
    pub fn set_effect(&mut self, effect: Arc<dyn SoundEffect>) {
        if !Arc::ptr_eq(&self.effect, &effect) {
            self.effect = effect;
            self.processor = None;
        }
    }
}

impl AudioNode for EffectNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let input = single_input(self.name(), &mut self.inputs)?;
        let buffer = input.process(context)?;
        let rate = context.sample_rate();
        expect_format("EffectNode", &buffer, rate, context.sample_count())?;

        let seek = self.seek.observe(context.time_range().start());
        if !self.effect.is_enabled() {
            return Ok(buffer);
        }
        if seek || self.processor_rate != rate {
            self.processor = None;
        }
        let effect = &self.effect;
        let processor = self.processor.get_or_insert_with(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(effect = effect.name(), rate, "EffectNode: creating processor");
            effect.create_processor()
        });
        self.processor_rate = rate;

        let mut frames = to_stereo_frames(&buffer);
        processor
            .process(&mut frames, context.time_range(), rate)
            .map_err(|source| GraphError::Effect {
                node: "EffectNode",
                effect: effect.name().to_owned(),
                source,
            })?;
        Ok(from_stereo_frames(&frames, rate))
    }

    fn name(&self) -> &'static str {
        "EffectNode"
    }

    fn describe(&self) -> String {
        let state = if self.effect.is_enabled() { "" } else { ", disabled" };
        format!("EffectNode('{}'{state})", self.effect.name())
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }

    fn release(&mut self) {
        self.processor = None;
        self.seek.forget();
    }
}

/// Hosts a native [`AudioEffect`].
///
/// The processor sees the input buffer, a silent output buffer of the same
/// format and the full context. It is created on first use, recreated when
/// the effect or sample rate changes, prepared whenever the range or rate
/// differs from the previous call, and reset on a seek.
pub struct GraphEffectNode {
    effect: Arc<dyn AudioEffect>,
    processor: Option<Box<dyn AudioEffectProcessor>>,
    processor_rate: u32,
    prepared: Option<(TimeRange, u32)>,
    seek: SeekDetector,
    inputs: Vec<BoxedNode>,
}

impl GraphEffectNode {
    /// Hosts `effect`.
    pub fn new(effect: Arc<dyn AudioEffect>) -> Self {
        Self {
            effect,
            processor: None,
            processor_rate: 0,
            prepared: None,
            seek: SeekDetector::default(),
            inputs: Vec::new(),
        }
    }

    /// The hosted effect.
    pub fn effect(&self) -> &Arc<dyn AudioEffect> {
        &self.effect
    }

    /// Replaces the hosted effect; a new processor is created on the next
    /// call.
    pub fn set_effect(&mut self, effect: Arc<dyn AudioEffect>) {
        if !Arc::ptr_eq(&self.effect, &effect) {
            self.effect = effect;
            self.processor = None;
            self.prepared = None;
        }
    }
}

impl AudioNode for GraphEffectNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let input = single_input(self.name(), &mut self.inputs)?;
        let buffer = input.process(context)?;
        let rate = context.sample_rate();
        expect_format("GraphEffectNode", &buffer, rate, context.sample_count())?;

        let seek = self.seek.observe(context.time_range().start());
        if !self.effect.is_enabled() {
            return Ok(buffer);
        }
        if self.processor_rate != rate {
            self.processor = None;
            self.prepared = None;
        }
        let effect = &self.effect;
        let mut created = false;
        let processor = self.processor.get_or_insert_with(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(effect = effect.name(), rate, "GraphEffectNode: creating processor");
            created = true;
            effect.create_processor()
        });
        self.processor_rate = rate;
        if seek && !created {
            #[cfg(feature = "tracing")]
            tracing::debug!(effect = effect.name(), "GraphEffectNode: seek, resetting processor");
            processor.reset();
        }
        let range = context.time_range();
        if self.prepared != Some((range, rate)) {
            processor.prepare(range, rate);
            self.prepared = Some((range, rate));
        }

        let mut output = AudioBuffer::new(buffer.channel_count(), rate, buffer.sample_count());
        processor
            .process(&buffer, &mut output, context)
            .map_err(|source| GraphError::Effect {
                node: "GraphEffectNode",
                effect: effect.name().to_owned(),
                source,
            })?;
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "GraphEffectNode"
    }

    fn describe(&self) -> String {
        let state = if self.effect.is_enabled() { "" } else { ", disabled" };
        format!("GraphEffectNode('{}'{state})", self.effect.name())
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }

    fn release(&mut self) {
        self.processor = None;
        self.prepared = None;
        self.seek.forget();
    }
}
