use std::sync::Arc;

use crate::animation::{KeyFrameAnimation, Property};
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, single_input};
use crate::graph::stream::{InputCursor, split_position};
use crate::integrator::{SpeedIntegrator, speed_from_percent};
use crate::resample::SincResampler;
use crate::time::Time;

/// Output frames per resampler ratio update.
const BLOCK: usize = 256;

/// Variable-rate playback: consumes input at `speed` times the output rate,
/// shifting pitch with it.
///
/// The speed property is in percent (100 = normal) and clamped to
/// 1 %–10 000 %. A constant speed maps output time `t` to source time
/// `t * speed`; an animated one maps it through the integral of the speed
/// curve (see [`SpeedIntegrator`]). The input is streamed through a
/// [`SincResampler`] whose ratio is updated every [`BLOCK`] output frames
/// to the block's average speed.
///
/// Output that the resampler cannot produce is padded by repeating the last
/// produced frame, never with silence.
pub struct SpeedNode {
    speed: Property,
    integrator: SpeedIntegrator,
    stream: Option<SpeedStream>,
    inputs: Vec<BoxedNode>,
}

struct SpeedStream {
    resampler: SincResampler,
    cursor: InputCursor,
    sample_rate: u32,
    curve: SpeedCurve,
    next_out_frame: i64,
    last: Vec<f32>,
}

/// What the stream was seeded for.
#[derive(Clone)]
enum SpeedCurve {
    Constant(f64),
    Animated(Arc<KeyFrameAnimation>),
}

impl PartialEq for SpeedCurve {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => a == b,
            (Self::Animated(a), Self::Animated(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl SpeedNode {
    /// Creates a speed node. `speed` is in percent.
    pub fn new(speed: impl Into<Property>) -> Self {
        Self {
            speed: speed.into(),
            integrator: SpeedIntegrator::new(),
            stream: None,
            inputs: Vec::new(),
        }
    }

    /// Speed property, in percent.
    pub fn speed(&self) -> &Property {
        &self.speed
    }

    /// Mutable speed property.
    pub fn speed_mut(&mut self) -> &mut Property {
        &mut self.speed
    }

    /// Source time reached at output time `time`.
    pub fn source_time(&mut self, time: Time) -> Time {
        self.integrator.source_time(&self.speed, time)
    }
}

impl AudioNode for SpeedNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let sampler = context.sampler();
        let animated = sampler.is_animated(&self.speed);
        let constant = speed_from_percent(self.speed.value());
        let input = single_input(self.name(), &mut self.inputs)?;

        let frames = context.sample_count();
        if (!animated && (constant - 1.0).abs() < 1e-6) || frames == 0 {
            self.stream = None;
            return input.process(context);
        }

        let rate = context.sample_rate();
        let start = context.start_frame();
        let curve = match (animated, self.speed.animation()) {
            (true, Some(animation)) => SpeedCurve::Animated(Arc::clone(animation)),
            _ => SpeedCurve::Constant(constant),
        };

        let mut speeds = vec![0.0_f32; frames];
        if animated {
            sampler.sample_buffer(&self.speed, context.time_range(), rate, &mut speeds);
        } else {
            speeds.fill(self.speed.value());
        }

        let continues = self
            .stream
            .as_ref()
            .is_some_and(|s| s.sample_rate == rate && s.next_out_frame == start && s.curve == curve);
        if !continues {
            let position = match curve {
                SpeedCurve::Animated(_) => self
                    .integrator
                    .source_time(&self.speed, context.time_range().start())
                    .to_frames_f64(rate),
                SpeedCurve::Constant(speed) => start as f64 * speed,
            };
            let (frame, phase) = split_position(position);
            let mut resampler = SincResampler::new(speed_from_percent(speeds[0]));
            resampler.reset(phase);
            let cursor = InputCursor::new(frame, rate);
            let lead = cursor.fetch_lead(input, context, resampler.lookbehind())?;
            resampler.preload(&lead);
            #[cfg(feature = "tracing")]
            tracing::debug!(frame, rate, "SpeedNode: seeding stream");
            self.stream = Some(SpeedStream {
                last: vec![0.0; resampler.channel_count()],
                resampler,
                cursor,
                sample_rate: rate,
                curve,
                next_out_frame: start,
            });
        }
        let Some(stream) = self.stream.as_mut() else {
            return input.process(context);
        };

        let channels = stream.resampler.channel_count();
        let mut out = AudioBuffer::new(channels, rate, frames);
        let mut produced = 0;
        while produced < frames {
            let len = BLOCK.min(frames - produced);
            let block = &speeds[produced..produced + len];
            let average = block.iter().map(|&p| speed_from_percent(p)).sum::<f64>() / len as f64;
            stream.resampler.set_ratio(average);
            let need = stream.resampler.frames_needed(len);
            if need > 0 {
                let chunk = stream.cursor.fetch("SpeedNode", input, context, need)?;
                stream.resampler.push(&chunk);
            }
            let n = stream.resampler.pull(&mut out, produced, len);
            produced += n;
            if n < len {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        if produced < frames {
            tracing::debug!(missing = frames - produced, "SpeedNode: padding with last frame");
        }
        for ch in 0..channels {
            let samples = out.channel_mut(ch);
            let hold = if produced > 0 { samples[produced - 1] } else { stream.last[ch] };
            samples[produced..].fill(hold);
            stream.last[ch] = samples[frames - 1];
        }
        stream.next_out_frame = start + frames as i64;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "SpeedNode"
    }

    fn describe(&self) -> String {
        if self.speed.animation().is_some() {
            format!("SpeedNode({}%, animated)", self.speed.value())
        } else {
            format!("SpeedNode({}%)", self.speed.value())
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
        self.integrator.clear();
    }
}
