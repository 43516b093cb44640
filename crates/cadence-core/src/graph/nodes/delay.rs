use crate::animation::Property;
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::delay::{DelayParams, FeedbackDelay};
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, SeekDetector, expect_format, single_input};
use crate::time::Time;

/// Samples per animation chunk.
const CHUNK: usize = 1024;

/// Feedback delay with animatable parameters.
///
/// Parameters are in user units: delay time in milliseconds, feedback and
/// the dry/wet levels in percent. One delay line per channel is sized for
/// [`MAX_DELAY_MS`](crate::MAX_DELAY_MS); the lines are reallocated when the
/// channel count or sample rate changes and cleared on a seek.
///
/// ## Parameters
///
/// | Parameter | Unit | Default |
/// |-----------|------|---------|
/// | delay_time | ms | 200 |
/// | feedback | % | 50 |
/// | dry_mix | % | 60 |
/// | wet_mix | % | 40 |
pub struct DelayNode {
    delay_time: Property,
    feedback: Property,
    dry_mix: Property,
    wet_mix: Property,
    engine: Option<FeedbackDelay>,
    seek: SeekDetector,
    inputs: Vec<BoxedNode>,
}

impl Default for DelayNode {
    fn default() -> Self {
        Self::new(DelayParams::default())
    }
}

impl DelayNode {
    /// Creates a delay with constant parameters.
    pub fn new(params: DelayParams) -> Self {
        Self {
            delay_time: params.delay_ms.into(),
            feedback: params.feedback.into(),
            dry_mix: params.dry.into(),
            wet_mix: params.wet.into(),
            engine: None,
            seek: SeekDetector::default(),
            inputs: Vec::new(),
        }
    }

    /// Delay time in milliseconds.
    pub fn delay_time_mut(&mut self) -> &mut Property {
        &mut self.delay_time
    }

    /// Feedback in percent.
    pub fn feedback_mut(&mut self) -> &mut Property {
        &mut self.feedback
    }

    /// Dry level in percent.
    pub fn dry_mix_mut(&mut self) -> &mut Property {
        &mut self.dry_mix
    }

    /// Wet level in percent.
    pub fn wet_mix_mut(&mut self) -> &mut Property {
        &mut self.wet_mix
    }

    /// Current (unanimated) parameter values.
    pub fn params(&self) -> DelayParams {
        DelayParams {
            delay_ms: self.delay_time.value(),
            feedback: self.feedback.value(),
            dry: self.dry_mix.value(),
            wet: self.wet_mix.value(),
        }
    }
}

impl AudioNode for DelayNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let input = single_input(self.name(), &mut self.inputs)?;
        let mut buffer = input.process(context)?;
        let rate = context.sample_rate();
        expect_format("DelayNode", &buffer, rate, context.sample_count())?;

        let channels = buffer.channel_count();
        let seek = self.seek.observe(context.time_range().start());
        if self.engine.as_ref().is_some_and(|e| e.matches(channels, rate)) {
            if seek {
                #[cfg(feature = "tracing")]
                tracing::debug!(start = %context.time_range().start(), "DelayNode: seek, clearing delay lines");
                if let Some(engine) = self.engine.as_mut() {
                    engine.reset();
                }
            }
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(channels, rate, "DelayNode: allocating delay lines");
            self.engine = None;
        }
        let engine = self.engine.get_or_insert_with(|| FeedbackDelay::new(channels, rate));

        let sampler = context.sampler();
        let animated = [&self.delay_time, &self.feedback, &self.dry_mix, &self.wet_mix]
            .iter()
            .any(|p| sampler.is_animated(p));

        if !animated {
            let params = DelayParams {
                delay_ms: self.delay_time.value(),
                feedback: self.feedback.value(),
                dry: self.dry_mix.value(),
                wet: self.wet_mix.value(),
            };
            for ch in 0..channels {
                engine.process_block(ch, buffer.channel_mut(ch), params);
            }
            return Ok(buffer);
        }

        let range = context.time_range();
        let frames = buffer.sample_count();
        let mut delay = [0.0_f32; CHUNK];
        let mut feedback = [0.0_f32; CHUNK];
        let mut dry = [0.0_f32; CHUNK];
        let mut wet = [0.0_f32; CHUNK];
        let mut offset = 0;
        while offset < frames {
            let len = CHUNK.min(frames - offset);
            let chunk = range.add_start(Time::from_frames(offset as i64, rate));
            sampler.sample_buffer(&self.delay_time, chunk, rate, &mut delay[..len]);
            sampler.sample_buffer(&self.feedback, chunk, rate, &mut feedback[..len]);
            sampler.sample_buffer(&self.dry_mix, chunk, rate, &mut dry[..len]);
            sampler.sample_buffer(&self.wet_mix, chunk, rate, &mut wet[..len]);
            for ch in 0..channels {
                let samples = &mut buffer.channel_mut(ch)[offset..offset + len];
                for (i, sample) in samples.iter_mut().enumerate() {
                    let params = DelayParams {
                        delay_ms: delay[i],
                        feedback: feedback[i],
                        dry: dry[i],
                        wet: wet[i],
                    };
                    *sample = engine.process_with(ch, *sample, params);
                }
            }
            offset += len;
        }
        Ok(buffer)
    }

    fn name(&self) -> &'static str {
        "DelayNode"
    }

    fn describe(&self) -> String {
        let p = self.params();
        format!(
            "DelayNode({} ms, feedback {}%, dry {}%, wet {}%)",
            p.delay_ms, p.feedback, p.dry, p.wet
        )
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }

    fn release(&mut self) {
        self.engine = None;
        self.seek.forget();
    }
}
