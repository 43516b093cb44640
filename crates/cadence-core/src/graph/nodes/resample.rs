use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, expect_format, single_input};
use crate::graph::stream::{InputCursor, split_position};
use crate::resample::SincResampler;

/// Converts its input to a fixed target sample rate.
///
/// This node decides the rate it *produces* (the target) regardless of the
/// context, and asks its input for whatever rate the input delivers: the
/// configured source-rate hint, else the last rate the input returned, else
/// the target itself. When the input already runs at the target rate its
/// buffer is returned as-is.
///
/// Otherwise a streaming [`SincResampler`] is driven from an input cursor,
/// so consecutive requests continue the stream without re-reading input.
/// The resampler is rebuilt when the input rate or channel count changes,
/// and re-seeded when a request does not continue the previous one.
pub struct ResampleNode {
    target_rate: u32,
    source_rate: Option<u32>,
    observed_rate: Option<u32>,
    stream: Option<ResampleStream>,
    inputs: Vec<BoxedNode>,
}

struct ResampleStream {
    resampler: SincResampler,
    cursor: InputCursor,
    input_rate: u32,
    next_out_frame: i64,
}

/// Why a resampling attempt must restart with a fresh stream.
enum Restart {
    Rate(u32),
    Channels,
}

impl ResampleNode {
    /// Creates a resampler producing `target_rate` Hz.
    pub fn new(target_rate: u32) -> Self {
        Self {
            target_rate: target_rate.max(1),
            source_rate: None,
            observed_rate: None,
            stream: None,
            inputs: Vec::new(),
        }
    }

    /// Tells the node which rate its input produces, skipping the rate query on the
    /// first call.
    pub fn with_source_rate(mut self, sample_rate: u32) -> Self {
        self.source_rate = Some(sample_rate);
        self
    }

    /// Output sample rate.
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Input rate the node will request next.
    fn input_rate_guess(&self) -> u32 {
        self.observed_rate.or(self.source_rate).unwrap_or(self.target_rate)
    }

    fn resample(&mut self, context: &ProcessContext<'_>, input_rate: u32) -> Result<Result<AudioBuffer, Restart>, GraphError> {
        let target = self.target_rate;
        let out_context = context.with_sample_rate(target);
        let frames = out_context.sample_count();
        let start = out_context.start_frame();
        let input = single_input("ResampleNode", &mut self.inputs)?;

        let continues = self
            .stream
            .as_ref()
            .is_some_and(|s| s.input_rate == input_rate && s.next_out_frame == start);
        if !continues {
            let ratio = f64::from(input_rate) / f64::from(target);
            let (frame, phase) = split_position(start as f64 * ratio);
            let mut resampler = SincResampler::new(ratio);
            resampler.reset(phase);
            let cursor = InputCursor::new(frame, input_rate);
            let lead = cursor.fetch_lead(input, &out_context, resampler.lookbehind())?;
            if lead.sample_rate() != input_rate {
                return Ok(Err(Restart::Rate(lead.sample_rate())));
            }
            resampler.preload(&lead);
            #[cfg(feature = "tracing")]
            tracing::debug!(from = input_rate, to = target, frame, "ResampleNode: seeding resampler");
            self.stream = Some(ResampleStream {
                resampler,
                cursor,
                input_rate,
                next_out_frame: start,
            });
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(Ok(AudioBuffer::new(0, target, frames)));
        };

        let mut out = AudioBuffer::new(stream.resampler.channel_count(), target, frames);
        let mut produced = 0;
        while produced < frames {
            let need = stream.resampler.frames_needed(frames - produced);
            if need > 0 {
                let chunk = stream.cursor.fetch_raw(input, &out_context, need)?;
                if chunk.sample_rate() != input_rate {
                    return Ok(Err(Restart::Rate(chunk.sample_rate())));
                }
                if chunk.channel_count() != stream.resampler.channel_count() {
                    return Ok(Err(Restart::Channels));
                }
                stream.resampler.push(&chunk);
            }
            let n = stream.resampler.pull(&mut out, produced, frames - produced);
            produced += n;
            if n == 0 && need == 0 {
                break;
            }
        }
        stream.next_out_frame = start + frames as i64;
        Ok(Ok(out))
    }
}

impl AudioNode for ResampleNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let target = self.target_rate;
        let frames = context.with_sample_rate(target).sample_count();
        let mut input_rate = self.input_rate_guess();

        if input_rate == target {
            let input = single_input(self.name(), &mut self.inputs)?;
            let buffer = input.process(&context.with_sample_rate(target))?;
            if buffer.sample_rate() == target {
                self.observed_rate = Some(target);
                self.stream = None;
                expect_format("ResampleNode", &buffer, target, frames)?;
                return Ok(buffer);
            }
            input_rate = buffer.sample_rate();
            self.observed_rate = Some(input_rate);
        }

        for _ in 0..2 {
            match self.resample(context, input_rate)? {
                Ok(buffer) => return Ok(buffer),
                Err(restart) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        old_rate = input_rate,
                        "ResampleNode: input format changed, recreating resampler"
                    );
                    self.stream = None;
                    if let Restart::Rate(rate) = restart {
                        input_rate = rate;
                        self.observed_rate = Some(rate);
                    }
                    if input_rate == target {
                        // The input now matches: take the pass-through path.
                        return self.process(context);
                    }
                }
            }
        }
        Err(GraphError::format_mismatch(
            "ResampleNode",
            format!("input format kept changing while resampling to {target} Hz"),
        ))
    }

    fn name(&self) -> &'static str {
        "ResampleNode"
    }

    fn describe(&self) -> String {
        match self.source_rate {
            Some(rate) => format!("ResampleNode({rate} Hz -> {} Hz)", self.target_rate),
            None => format!("ResampleNode(target {} Hz)", self.target_rate),
        }
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }

    fn release(&mut self) {
        self.stream = None;
    }
}
