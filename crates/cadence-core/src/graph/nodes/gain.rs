use crate::animation::Property;
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, expect_format, single_input};
use crate::math::{apply_gain, multiply_buffers};
use crate::time::Time;

/// Samples per animation chunk.
const CHUNK: usize = 1024;

/// Scales its input by a gain given in percent (100 = unity).
pub struct GainNode {
    gain: Property,
    inputs: Vec<BoxedNode>,
}

impl GainNode {
    /// Creates a gain node.
    pub fn new(gain: impl Into<Property>) -> Self {
        Self {
            gain: gain.into(),
            inputs: Vec::new(),
        }
    }

    /// The gain property, in percent.
    pub fn gain(&self) -> &Property {
        &self.gain
    }

    /// Mutable gain property.
    pub fn gain_mut(&mut self) -> &mut Property {
        &mut self.gain
    }
}

impl AudioNode for GainNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let input = single_input(self.name(), &mut self.inputs)?;
        let mut buffer = input.process(context)?;
        expect_format("GainNode", &buffer, context.sample_rate(), context.sample_count())?;

        let sampler = context.sampler();
        if !sampler.is_animated(&self.gain) {
            let gain = self.gain.value() / 100.0;
            if (gain - 1.0).abs() > 1e-6 {
                for channel in buffer.channels_mut() {
                    apply_gain(channel, gain);
                }
            }
            return Ok(buffer);
        }

        let rate = context.sample_rate();
        let range = context.time_range();
        let frames = buffer.sample_count();
        let mut gains = [0.0_f32; CHUNK];
        let mut offset = 0;
        while offset < frames {
            let len = CHUNK.min(frames - offset);
            let chunk_range = range.add_start(Time::from_frames(offset as i64, rate));
            sampler.sample_buffer(&self.gain, chunk_range, rate, &mut gains[..len]);
            for g in &mut gains[..len] {
                *g /= 100.0;
            }
            for channel in buffer.channels_mut() {
                multiply_buffers(&gains[..len], &mut channel[offset..offset + len]);
            }
            offset += len;
        }
        Ok(buffer)
    }

    fn name(&self) -> &'static str {
        "GainNode"
    }

    fn describe(&self) -> String {
        if self.gain.animation().is_some() {
            format!("GainNode({}%, animated)", self.gain.value())
        } else {
            format!("GainNode({}%)", self.gain.value())
        }
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}
