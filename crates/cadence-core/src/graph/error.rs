//! Errors raised while evaluating the graph.

use thiserror::Error;

use crate::source::BoxError;
use crate::time::TimeRange;

/// Errors that abort a render.
///
/// Contract violations (arity, formats, disjoint clips) mean the graph was
/// built or driven incorrectly. `Source` and `Effect` wrap failures of the
/// external collaborators. Numeric edge cases never surface here; nodes
/// clamp them.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node has the wrong number of inputs.
    #[error("{node} expects {expected} input(s), found {found}")]
    InputArity {
        /// Node kind.
        node: &'static str,
        /// Human-readable requirement, e.g. "1" or "at least 1".
        expected: &'static str,
        /// Inputs actually attached.
        found: usize,
    },

    /// An input produced a buffer in an unexpected format.
    #[error("{node}: input format mismatch: {detail}")]
    FormatMismatch {
        /// Node kind.
        node: &'static str,
        /// What disagreed.
        detail: String,
    },

    /// A clip was asked for a range outside its visible extent.
    #[error("requested range {requested} does not intersect clip {clip}")]
    DisjointRange {
        /// Range the caller asked for.
        requested: TimeRange,
        /// Visible range of the clip.
        clip: TimeRange,
    },

    /// The sound source failed to deliver PCM.
    #[error("source '{source_name}' failed: {source}")]
    Source {
        /// Source identification.
        source_name: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// A hosted effect failed.
    #[error("effect '{effect}' failed in {node}: {source}")]
    Effect {
        /// Hosting node kind.
        node: &'static str,
        /// Effect name.
        effect: String,
        /// Error raised by the effect.
        #[source]
        source: BoxError,
    },

    /// A parameter is outside what the node can honor.
    #[error("invalid parameter '{param}' for {node}: {reason}")]
    InvalidParameter {
        /// Node kind.
        node: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl GraphError {
    /// Checks that exactly one input is attached.
    pub fn expect_single(node: &'static str, found: usize) -> Result<(), GraphError> {
        if found == 1 {
            Ok(())
        } else {
            Err(GraphError::InputArity {
                node,
                expected: "1",
                found,
            })
        }
    }

    /// Create a format mismatch error.
    pub fn format_mismatch(node: &'static str, detail: impl Into<String>) -> Self {
        GraphError::FormatMismatch {
            node,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    #[test]
    fn test_messages_name_the_node() {
        let err = GraphError::expect_single("ClipNode", 0).unwrap_err();
        assert_eq!(err.to_string(), "ClipNode expects 1 input(s), found 0");

        let err = GraphError::DisjointRange {
            requested: TimeRange::new(Time::ZERO, Time::from_secs(1)),
            clip: TimeRange::new(Time::from_secs(5), Time::from_secs(1)),
        };
        assert!(err.to_string().contains("does not intersect"));
    }

    #[test]
    fn test_effect_errors_chain_their_source() {
        let err = GraphError::Effect {
            node: "GraphEffectNode",
            effect: "delay".into(),
            source: "boom".into(),
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
