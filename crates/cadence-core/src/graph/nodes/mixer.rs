use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, expect_format};
use crate::math::add_with_gain;

/// Weighted sum of one or more inputs.
///
/// Every input is processed with the same context and must return the same
/// format. Inputs without a configured gain are mixed at unity.
pub struct MixerNode {
    gains: Vec<f32>,
    inputs: Vec<BoxedNode>,
}

impl MixerNode {
    /// Creates a mixer with per-input linear gains.
    pub fn new(gains: Vec<f32>) -> Self {
        Self {
            gains,
            inputs: Vec::new(),
        }
    }

    /// Linear gain applied to input `index`.
    pub fn gain(&self, index: usize) -> f32 {
        self.gains.get(index).copied().unwrap_or(1.0)
    }

    /// Sets the gain of input `index`, growing the gain list with unity
    /// entries as needed.
    pub fn set_gain(&mut self, index: usize, gain: f32) {
        if self.gains.len() <= index {
            self.gains.resize(index + 1, 1.0);
        }
        self.gains[index] = gain;
    }
}

impl AudioNode for MixerNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        if self.inputs.is_empty() {
            return Err(GraphError::InputArity {
                node: self.name(),
                expected: "at least 1",
                found: 0,
            });
        }

        let rate = context.sample_rate();
        let frames = context.sample_count();
        let mut out: Option<AudioBuffer> = None;
        for (index, input) in self.inputs.iter_mut().enumerate() {
            let gain = self.gains.get(index).copied().unwrap_or(1.0);
            let buffer = input.process(context)?;
            expect_format("MixerNode", &buffer, rate, frames)?;
            match out.as_mut() {
                None => {
                    let mut first = AudioBuffer::new(buffer.channel_count(), rate, frames);
                    for ch in 0..buffer.channel_count() {
                        add_with_gain(buffer.channel(ch), first.channel_mut(ch), gain);
                    }
                    out = Some(first);
                }
                Some(acc) => {
                    if acc.channel_count() != buffer.channel_count() {
                        return Err(GraphError::format_mismatch(
                            "MixerNode",
                            format!(
                                "input {index} has {} channels, input 0 has {}",
                                buffer.channel_count(),
                                acc.channel_count()
                            ),
                        ));
                    }
                    for ch in 0..buffer.channel_count() {
                        add_with_gain(buffer.channel(ch), acc.channel_mut(ch), gain);
                    }
                }
            }
        }
        Ok(out.unwrap_or_else(|| AudioBuffer::new(0, rate, frames)))
    }

    fn name(&self) -> &'static str {
        "MixerNode"
    }

    fn describe(&self) -> String {
        format!("MixerNode(gains={:?})", self.gains)
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}
