use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, expect_format, single_input};
use crate::time::{Time, TimeRange};

/// Restricts its input to the window `[start, start + duration)`.
///
/// The window's start maps to time zero of the input. Output outside the
/// window is silence. Requests that do not touch the window at all are a
/// contract error.
pub struct ClipNode {
    start: Time,
    duration: Time,
    inputs: Vec<BoxedNode>,
}

impl ClipNode {
    /// Creates a clip window.
    pub fn new(start: Time, duration: Time) -> Self {
        Self {
            start,
            duration: duration.max(Time::ZERO),
            inputs: Vec::new(),
        }
    }

    /// The visible window on this node's output axis.
    pub fn visible_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.duration)
    }
}

impl AudioNode for ClipNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let clip = self.visible_range();
        let requested = context.time_range();
        let range = requested
            .intersect(&clip)
            .ok_or(GraphError::DisjointRange { requested, clip })?;

        let rate = context.sample_rate();
        let frames = context.sample_count();
        let input = single_input(self.name(), &mut self.inputs)?;

        let child_ctx = context.with_time_range(range.subtract_start(self.start));
        let child = input.process(&child_ctx)?;
        expect_format("ClipNode", &child, rate, child_ctx.sample_count())?;

        let mut out = AudioBuffer::new(child.channel_count(), rate, frames);
        let pad_before = (range.start() - requested.start()).to_frames(rate).max(0) as usize;
        out.copy_from(&child, 0, pad_before, child.sample_count());
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "ClipNode"
    }

    fn describe(&self) -> String {
        format!("ClipNode(start={}, duration={})", self.start, self.duration)
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}
