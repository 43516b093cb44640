//! Synthetic input nodes for unit tests.

use std::sync::{Arc, Mutex};

use crate::animation::KeyFrameSampler;
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::time::TimeRange;

use super::error::GraphError;
use super::node::{AudioNode, BoxedNode};

/// Renders `node` for `range` with the stock sampler.
pub(crate) fn render(node: &mut dyn AudioNode, range: TimeRange, sample_rate: u32) -> AudioBuffer {
    let sampler = KeyFrameSampler;
    node.process(&ProcessContext::new(range, sample_rate, &sampler))
        .expect("render failed")
}

/// Every sample equals its absolute frame index at the requested rate.
pub(crate) struct Ramp {
    channels: usize,
    inputs: Vec<BoxedNode>,
}

impl Ramp {
    pub(crate) fn new(channels: usize) -> Self {
        Self {
            channels,
            inputs: Vec::new(),
        }
    }
}

impl AudioNode for Ramp {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let start = context.start_frame();
        let mut out = AudioBuffer::new(self.channels, context.sample_rate(), context.sample_count());
        for channel in out.channels_mut() {
            for (i, s) in channel.iter_mut().enumerate() {
                *s = (start + i as i64) as f32;
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Ramp"
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

/// Constant signal.
pub(crate) struct Constant {
    channels: usize,
    value: f32,
    inputs: Vec<BoxedNode>,
}

impl Constant {
    pub(crate) fn new(channels: usize, value: f32) -> Self {
        Self {
            channels,
            value,
            inputs: Vec::new(),
        }
    }
}

impl AudioNode for Constant {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let mut out = AudioBuffer::new(self.channels, context.sample_rate(), context.sample_count());
        for channel in out.channels_mut() {
            channel.fill(self.value);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Constant"
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

/// Unit impulse at absolute frame `at` (once per stream position).
pub(crate) struct Impulse {
    at: i64,
    inputs: Vec<BoxedNode>,
}

impl Impulse {
    pub(crate) fn new(at: i64) -> Self {
        Self {
            at,
            inputs: Vec::new(),
        }
    }
}

impl AudioNode for Impulse {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let start = context.start_frame();
        let frames = context.sample_count();
        let mut out = AudioBuffer::new(1, context.sample_rate(), frames);
        let offset = self.at - start;
        if (0..frames as i64).contains(&offset) {
            out.channel_mut(0)[offset as usize] = 1.0;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Impulse"
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

/// Sine at `frequency` Hz, phase-continuous on the absolute frame grid.
pub(crate) struct Sine {
    frequency: f64,
    channels: usize,
    inputs: Vec<BoxedNode>,
}

impl Sine {
    pub(crate) fn new(frequency: f64, channels: usize) -> Self {
        Self {
            frequency,
            channels,
            inputs: Vec::new(),
        }
    }
}

impl AudioNode for Sine {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let rate = f64::from(context.sample_rate());
        let start = context.start_frame();
        let mut out = AudioBuffer::new(self.channels, context.sample_rate(), context.sample_count());
        for channel in out.channels_mut() {
            for (i, s) in channel.iter_mut().enumerate() {
                let t = (start + i as i64) as f64 / rate;
                *s = (2.0 * std::f64::consts::PI * self.frequency * t).sin() as f32;
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Sine"
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

/// Passes its input through and records every requested range.
pub(crate) struct Recorder {
    log: Arc<Mutex<Vec<(TimeRange, u32)>>>,
    inputs: Vec<BoxedNode>,
}

impl Recorder {
    pub(crate) fn new(input: BoxedNode) -> (Self, Arc<Mutex<Vec<(TimeRange, u32)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
                inputs: vec![input],
            },
            log,
        )
    }
}

impl AudioNode for Recorder {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        self.log
            .lock()
            .expect("recorder lock")
            .push((context.time_range(), context.sample_rate()));
        self.inputs[0].process(context)
    }

    fn name(&self) -> &'static str {
        "Recorder"
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

/// Counts zero crossings (sign changes).
pub(crate) fn zero_crossings(samples: &[f32]) -> usize {
    samples
        .windows(2)
        .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
        .count()
}
