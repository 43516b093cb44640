//! Assembling node chains into renderable graphs.

use crate::animation::AnimationSampler;
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::time::TimeRange;

use super::error::GraphError;
use super::node::{AudioNode, BoxedNode, describe_tree};

/// Builds a chain of single-input nodes, leaf first.
///
/// Each [`then`](Self::then) attaches the current tree as the only input of
/// the new node, which becomes the new root.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use cadence_core::{
///     AudioBuffer, GainNode, GraphBuilder, KeyFrameSampler, MemorySource, ResampleNode, SourceNode,
///     TimeRange,
/// };
///
/// let source = MemorySource::new(AudioBuffer::from_channels(vec![vec![0.5; 44100]], 44100));
/// let mut graph = GraphBuilder::new(SourceNode::new(Arc::new(source)))
///     .then(ResampleNode::new(48000))
///     .then(GainNode::new(50.0))
///     .build();
///
/// let out = graph.render(TimeRange::from_secs_f64(0.0, 0.5), 48000, &KeyFrameSampler).unwrap();
/// assert_eq!(out.sample_count(), 24000);
/// ```
pub struct GraphBuilder {
    root: BoxedNode,
}

impl GraphBuilder {
    /// Starts a chain at `leaf`.
    pub fn new(leaf: impl AudioNode + 'static) -> Self {
        Self { root: Box::new(leaf) }
    }

    /// Starts a chain at an already boxed node.
    pub fn from_boxed(leaf: BoxedNode) -> Self {
        Self { root: leaf }
    }

    /// Puts `node` on top of the chain.
    #[must_use]
    pub fn then(self, node: impl AudioNode + 'static) -> Self {
        self.then_boxed(Box::new(node))
    }

    /// Puts an already boxed node on top of the chain.
    #[must_use]
    pub fn then_boxed(self, mut node: BoxedNode) -> Self {
        node.add_input(self.root);
        Self { root: node }
    }

    /// Applies `node` only when it is `Some`.
    #[must_use]
    pub fn then_maybe<N: AudioNode + 'static>(self, node: Option<N>) -> Self {
        match node {
            Some(node) => self.then(node),
            None => self,
        }
    }

    /// Finishes the chain.
    pub fn build(self) -> AudioGraph {
        AudioGraph::new(self.root)
    }
}

/// An owned node tree with a single terminal node.
pub struct AudioGraph {
    root: BoxedNode,
}

impl AudioGraph {
    /// Wraps `root`.
    pub fn new(root: BoxedNode) -> Self {
        Self { root }
    }

    /// Renders `range` at `sample_rate`.
    pub fn render(
        &mut self,
        range: TimeRange,
        sample_rate: u32,
        sampler: &dyn AnimationSampler,
    ) -> Result<AudioBuffer, GraphError> {
        self.root.process(&ProcessContext::new(range, sample_rate, sampler))
    }

    /// The terminal node.
    pub fn root(&self) -> &dyn AudioNode {
        &*self.root
    }

    /// Mutable access to the terminal node.
    pub fn root_mut(&mut self) -> &mut dyn AudioNode {
        &mut *self.root
    }

    /// Indented dump of the node tree, terminal node first.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_tree(&*self.root, 0, &mut out);
        out
    }

    /// Releases the DSP state of every node.
    pub fn dispose(&mut self) {
        self.root.dispose();
    }

    /// Unwraps the terminal node.
    pub fn into_root(self) -> BoxedNode {
        self.root
    }
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph").field("root", &self.root.name()).finish()
    }
}
