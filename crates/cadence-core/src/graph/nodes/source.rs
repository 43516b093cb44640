use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode};
use crate::source::SoundSource;

/// Leaf node reading PCM from a [`SoundSource`].
///
/// Produces buffers at the source's native sample rate, with the source's
/// channel count. Time zero is the first frame of the material; anything
/// before it or past its end is silence.
pub struct SourceNode {
    source: Arc<dyn SoundSource>,
    inputs: Vec<BoxedNode>,
}

impl SourceNode {
    /// Creates a node reading from `source`.
    pub fn new(source: Arc<dyn SoundSource>) -> Self {
        Self {
            source,
            inputs: Vec::new(),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &Arc<dyn SoundSource> {
        &self.source
    }
}

impl AudioNode for SourceNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        if !self.inputs.is_empty() {
            return Err(GraphError::InputArity {
                node: self.name(),
                expected: "0",
                found: self.inputs.len(),
            });
        }

        let rate = self.source.sample_rate();
        let range = context.time_range();
        let frames = range.sample_count(rate);
        let start = range.start_frame(rate);
        let mut out = AudioBuffer::new(self.source.channel_count(), rate, frames);

        let skip = if start < 0 {
            usize::try_from(start.unsigned_abs()).map_or(frames, |s| s.min(frames))
        } else {
            0
        };
        if skip >= frames {
            return Ok(out);
        }
        let read_start = start.max(0) as u64;
        let pcm = self
            .source
            .read(read_start, frames - skip)
            .map_err(|source| GraphError::Source {
                source_name: self.source.name().to_owned(),
                source,
            })?;
        if let Some(pcm) = pcm {
            pcm.write_into(&mut out, skip);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "SourceNode"
    }

    fn describe(&self) -> String {
        format!(
            "SourceNode('{}', {} Hz, {} ch, {})",
            self.source.name(),
            self.source.sample_rate(),
            self.source.channel_count(),
            self.source.duration()
        )
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }
}
