use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, single_input};
use crate::time::Time;

/// Translates the time axis: a request for `t` reads the input at
/// `t + shift`.
pub struct ShiftNode {
    shift: Time,
    inputs: Vec<BoxedNode>,
}

impl ShiftNode {
    /// Creates a shift of `shift`.
    pub fn new(shift: Time) -> Self {
        Self {
            shift,
            inputs: Vec::new(),
        }
    }

    /// Current shift.
    pub fn shift(&self) -> Time {
        self.shift
    }

    /// Changes the shift.
    pub fn set_shift(&mut self, shift: Time) {
        self.shift = shift;
    }
}

impl AudioNode for ShiftNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let shift = self.shift;
        let input = single_input(self.name(), &mut self.inputs)?;
        input.process(&context.with_time_range(context.time_range().add_start(shift)))
    }

    fn name(&self) -> &'static str {
        "ShiftNode"
    }

    fn describe(&self) -> String {
        format!("ShiftNode({})", self.shift)
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::KeyFrameSampler;
    use crate::graph::test_util::Ramp;
    use crate::time::TimeRange;

    #[test]
    fn test_reads_shifted_input() {
        let mut node = ShiftNode::new(Time::from_millis(-10));
        node.add_input(Box::new(Ramp::new(1)));
        let sampler = KeyFrameSampler;
        let range = TimeRange::new(Time::from_millis(30), Time::from_millis(3));
        let ctx = ProcessContext::new(range, 1000, &sampler);
        let out = node.process(&ctx).unwrap();
        assert_eq!(out.channel(0), &[20.0, 21.0, 22.0]);
    }
}
