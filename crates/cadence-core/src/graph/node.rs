//! The [`AudioNode`] contract.

use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;

use super::error::GraphError;

/// Owned child node.
pub type BoxedNode = Box<dyn AudioNode>;

/// A unit of the render graph.
///
/// A node owns an ordered list of inputs and produces one buffer per call to
/// [`process`](Self::process). The returned buffer must hold exactly
/// `context.sample_count()` frames at `context.sample_rate()`; the only
/// nodes that deviate are [`SourceNode`](super::SourceNode) (native rate of
/// its source) and [`ResampleNode`](super::ResampleNode) (its target rate).
///
/// Nodes are built once and processed many times. Stateful nodes compare the
/// incoming range start against the previous one: an earlier start is a seek
/// and clears their DSP state.
pub trait AudioNode: Send {
    /// Produces the samples for `context`.
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError>;

    /// Short node kind, e.g. `"GainNode"`.
    fn name(&self) -> &'static str;

    /// The node and its parameters on one line, for graph dumps.
    fn describe(&self) -> String {
        self.name().to_owned()
    }

    /// Attached inputs, in order.
    fn inputs(&self) -> &[BoxedNode];

    /// Mutable access to the attached inputs.
    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode>;

    /// Appends an input.
    fn add_input(&mut self, input: BoxedNode) {
        self.inputs_mut().push(input);
    }

    /// Releases this node's own DSP state (delay lines, filter history,
    /// resampler buffers). Inputs are untouched. Calling it twice is a no-op.
    fn release(&mut self) {}

    /// Releases this node's state and then, depth-first, that of every input.
    fn dispose(&mut self) {
        self.release();
        for input in self.inputs_mut() {
            input.dispose();
        }
    }
}

/// Returns the single input of a node, or an arity error.
pub(crate) fn single_input<'a>(
    node: &'static str,
    inputs: &'a mut [BoxedNode],
) -> Result<&'a mut BoxedNode, GraphError> {
    GraphError::expect_single(node, inputs.len())?;
    Ok(&mut inputs[0])
}

/// Checks that `buffer` is at `sample_rate` with `frames` frames.
pub(crate) fn expect_format(
    node: &'static str,
    buffer: &AudioBuffer,
    sample_rate: u32,
    frames: usize,
) -> Result<(), GraphError> {
    if buffer.sample_rate() != sample_rate {
        return Err(GraphError::format_mismatch(
            node,
            format!("expected {sample_rate} Hz input, got {} Hz", buffer.sample_rate()),
        ));
    }
    if buffer.sample_count() != frames {
        return Err(GraphError::format_mismatch(
            node,
            format!("expected {frames} frames, got {}", buffer.sample_count()),
        ));
    }
    Ok(())
}

/// Writes an indented tree of `node` and its inputs into `out`.
pub(crate) fn describe_tree(node: &dyn AudioNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.describe());
    out.push('\n');
    for input in node.inputs() {
        describe_tree(&**input, depth + 1, out);
    }
}

/// Tracks the previous request start of a stateful node.
///
/// [`observe`](Self::observe) returns true when the new start is earlier
/// than the previous one, i.e. when state must be cleared.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SeekDetector {
    last_start: Option<crate::time::Time>,
}

impl SeekDetector {
    pub(crate) fn observe(&mut self, start: crate::time::Time) -> bool {
        let seek = self.last_start.is_some_and(|last| start < last);
        self.last_start = Some(start);
        seek
    }

    pub(crate) fn forget(&mut self) {
        self.last_start = None;
    }
}
