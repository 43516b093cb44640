use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, single_input};
use crate::graph::stream::InputCursor;
use crate::wsola::{Wsola, WsolaConfig};

/// Slowest stretch speed, in percent.
pub const MIN_STRETCH_PERCENT: f32 = 25.0;
/// Fastest stretch speed, in percent.
pub const MAX_STRETCH_PERCENT: f32 = 400.0;

/// Upper bound on fetch/synthesize rounds per call.
const MAX_PASSES: usize = 8;

/// Pitch-preserving speed change with one [`Wsola`] processor per channel.
///
/// Output frame `k` reads around source frame `k * speed`. Speed is in
/// percent and clamped to 25 %–400 %; at 100 % the node is a pass-through.
/// Consecutive requests continue the WSOLA stream; any other request
/// re-seeds it at the new source position.
pub struct TimeStretchNode {
    speed: f32,
    config: WsolaConfig,
    stream: Option<StretchStream>,
    inputs: Vec<BoxedNode>,
}

struct StretchStream {
    processors: Vec<Wsola>,
    cursor: InputCursor,
    sample_rate: u32,
    speed: f64,
    next_out_frame: i64,
    last: Vec<f32>,
}

impl TimeStretchNode {
    /// Creates a time-stretch node. `speed` is in percent.
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            config: WsolaConfig::default(),
            stream: None,
            inputs: Vec::new(),
        }
    }

    /// Overrides the WSOLA frame and search sizes.
    pub fn with_config(mut self, config: WsolaConfig) -> Self {
        self.config = config;
        self
    }

    /// Requested speed in percent, before clamping.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Changes the speed. The stream re-seeds on the next call.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Effective speed factor.
    pub fn speed_factor(&self) -> f64 {
        let percent = if self.speed.is_finite() { self.speed } else { 100.0 };
        f64::from(percent.clamp(MIN_STRETCH_PERCENT, MAX_STRETCH_PERCENT)) / 100.0
    }
}

impl AudioNode for TimeStretchNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let speed = self.speed_factor();
        let config = self.config;
        let input = single_input(self.name(), &mut self.inputs)?;
        let frames = context.sample_count();
        if (speed - 1.0).abs() < 1e-6 || frames == 0 {
            self.stream = None;
            return input.process(context);
        }

        let rate = context.sample_rate();
        let start = context.start_frame();
        let continues = self
            .stream
            .as_ref()
            .is_some_and(|s| s.sample_rate == rate && s.next_out_frame == start && s.speed == speed);
        if !continues {
            let source_frame = (start as f64 * speed).round() as i64;
            #[cfg(feature = "tracing")]
            tracing::debug!(source_frame, speed, "TimeStretchNode: seeding stream");
            self.stream = Some(StretchStream {
                processors: Vec::new(),
                cursor: InputCursor::new(source_frame, rate),
                sample_rate: rate,
                speed,
                next_out_frame: start,
                last: Vec::new(),
            });
        }
        let Some(stream) = self.stream.as_mut() else {
            return input.process(context);
        };

        let mut out: Option<AudioBuffer> = None;
        let mut produced = 0;
        for _ in 0..MAX_PASSES {
            if produced >= frames {
                break;
            }
            let missing = frames - produced;
            let need = match stream.processors.first() {
                Some(processor) => processor.input_needed(missing),
                None => Wsola::new(config, rate, speed).input_needed(missing),
            };
            if need > 0 {
                let chunk = stream.cursor.fetch("TimeStretchNode", input, context, need)?;
                if stream.processors.is_empty() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(channels = chunk.channel_count(), "TimeStretchNode: creating processors");
                    stream.processors = (0..chunk.channel_count())
                        .map(|_| Wsola::new(config, rate, speed))
                        .collect();
                    stream.last = vec![0.0; chunk.channel_count()];
                }
                if chunk.channel_count() != stream.processors.len() {
                    return Err(GraphError::format_mismatch(
                        "TimeStretchNode",
                        format!(
                            "input changed from {} to {} channels mid-stream",
                            stream.processors.len(),
                            chunk.channel_count()
                        ),
                    ));
                }
                for (ch, processor) in stream.processors.iter_mut().enumerate() {
                    processor.push(chunk.channel(ch));
                }
            }
            let out = out.get_or_insert_with(|| AudioBuffer::new(stream.processors.len(), rate, frames));
            let mut pulled = missing;
            for (ch, processor) in stream.processors.iter_mut().enumerate() {
                pulled = pulled.min(processor.pull(&mut out.channel_mut(ch)[produced..]));
            }
            if stream.processors.is_empty() {
                break;
            }
            produced += pulled;
        }

        let mut out = out.unwrap_or_else(|| AudioBuffer::new(stream.processors.len(), rate, frames));
        #[cfg(feature = "tracing")]
        if produced < frames {
            tracing::debug!(missing = frames - produced, "TimeStretchNode: padding with last frame");
        }
        for (ch, last) in stream.last.iter_mut().enumerate().take(out.channel_count()) {
            let samples = out.channel_mut(ch);
            let hold = if produced > 0 { samples[produced - 1] } else { *last };
            samples[produced..].fill(hold);
            *last = samples[frames - 1];
        }
        stream.next_out_frame = start + frames as i64;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "TimeStretchNode"
    }

    fn describe(&self) -> String {
        format!("TimeStretchNode({}%)", self.speed_factor() * 100.0)
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
