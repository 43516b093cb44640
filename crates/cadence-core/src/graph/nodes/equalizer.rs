use crate::animation::Property;
use crate::biquad::{Biquad, FilterType};
use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::graph::error::GraphError;
use crate::graph::node::{AudioNode, BoxedNode, SeekDetector, expect_format, single_input};
use crate::time::Time;

/// Samples per animation chunk.
const CHUNK: usize = 1024;

/// One equalizer band. All parameters are animatable.
#[derive(Debug, Clone)]
pub struct EqualizerBand {
    /// Band shape.
    pub filter_type: FilterType,
    /// Center or corner frequency in Hz.
    pub frequency: Property,
    /// Gain in dB (ignored by pass/notch shapes).
    pub gain: Property,
    /// Quality factor.
    pub q: Property,
}

impl EqualizerBand {
    /// Creates a band.
    pub fn new(
        filter_type: FilterType,
        frequency: impl Into<Property>,
        gain: impl Into<Property>,
        q: impl Into<Property>,
    ) -> Self {
        Self {
            filter_type,
            frequency: frequency.into(),
            gain: gain.into(),
            q: q.into(),
        }
    }

    /// Peaking band.
    pub fn peak(frequency: f32, gain_db: f32, q: f32) -> Self {
        Self::new(FilterType::Peak, frequency, gain_db, q)
    }

    fn is_animated(&self, context: &ProcessContext<'_>) -> bool {
        let sampler = context.sampler();
        sampler.is_animated(&self.frequency) || sampler.is_animated(&self.gain) || sampler.is_animated(&self.q)
    }
}

/// Cascade of biquad bands, applied in order to every channel.
///
/// With no bands the input passes through untouched. Filter history is
/// kept across calls and cleared on a seek; it is reallocated when the
/// channel count, sample rate or band count changes.
pub struct EqualizerNode {
    bands: Vec<EqualizerBand>,
    /// `filters[band][channel]`
    filters: Vec<Vec<Biquad>>,
    format: Option<(usize, u32)>,
    seek: SeekDetector,
    inputs: Vec<BoxedNode>,
}

impl EqualizerNode {
    /// Creates an equalizer with `bands`.
    pub fn new(bands: Vec<EqualizerBand>) -> Self {
        Self {
            bands,
            filters: Vec::new(),
            format: None,
            seek: SeekDetector::default(),
            inputs: Vec::new(),
        }
    }

    /// Configured bands.
    pub fn bands(&self) -> &[EqualizerBand] {
        &self.bands
    }

    /// Mutable bands. Adding or removing bands resets filter history on the
    /// next call.
    pub fn bands_mut(&mut self) -> &mut Vec<EqualizerBand> {
        &mut self.bands
    }

    fn prepare(&mut self, channels: usize, rate: u32, seek: bool) {
        if self.format != Some((channels, rate)) || self.filters.len() != self.bands.len() {
            #[cfg(feature = "tracing")]
            tracing::debug!(channels, rate, bands = self.bands.len(), "EqualizerNode: allocating filters");
            self.filters = vec![vec![Biquad::new(); channels]; self.bands.len()];
            self.format = Some((channels, rate));
        } else if seek {
            #[cfg(feature = "tracing")]
            tracing::debug!("EqualizerNode: seek, clearing filter history");
            for filter in self.filters.iter_mut().flatten() {
                filter.clear();
            }
        }
    }
}

impl AudioNode for EqualizerNode {
    fn process(&mut self, context: &ProcessContext<'_>) -> Result<AudioBuffer, GraphError> {
        let input = single_input(self.name(), &mut self.inputs)?;
        let mut buffer = input.process(context)?;
        let rate = context.sample_rate();
        expect_format("EqualizerNode", &buffer, rate, context.sample_count())?;

        let seek = self.seek.observe(context.time_range().start());
        if self.bands.is_empty() {
            return Ok(buffer);
        }
        let channels = buffer.channel_count();
        self.prepare(channels, rate, seek);

        let sample_rate = rate as f32;
        let animated = self.bands.iter().any(|b| b.is_animated(context));
        if !animated {
            for (band, filters) in self.bands.iter().zip(&mut self.filters) {
                let coefficients = band
                    .filter_type
                    .coefficients(band.frequency.value(), band.gain.value(), band.q.value(), sample_rate);
                for (ch, filter) in filters.iter_mut().enumerate() {
                    filter.set_coefficients(coefficients);
                    filter.process_block(buffer.channel_mut(ch));
                }
            }
            return Ok(buffer);
        }

        let sampler = context.sampler();
        let range = context.time_range();
        let frames = buffer.sample_count();
        let mut frequency = [0.0_f32; CHUNK];
        let mut gain = [0.0_f32; CHUNK];
        let mut q = [0.0_f32; CHUNK];
        let mut offset = 0;
        while offset < frames {
            let len = CHUNK.min(frames - offset);
            let chunk = range.add_start(Time::from_frames(offset as i64, rate));
            // Each band runs over the whole chunk before the next one sees it.
            for (band, filters) in self.bands.iter().zip(&mut self.filters) {
                sampler.sample_buffer(&band.frequency, chunk, rate, &mut frequency[..len]);
                sampler.sample_buffer(&band.gain, chunk, rate, &mut gain[..len]);
                sampler.sample_buffer(&band.q, chunk, rate, &mut q[..len]);
                for i in 0..len {
                    let coefficients = band.filter_type.coefficients(frequency[i], gain[i], q[i], sample_rate);
                    for (ch, filter) in filters.iter_mut().enumerate() {
                        filter.set_coefficients(coefficients);
                        let sample = &mut buffer.channel_mut(ch)[offset + i];
                        *sample = filter.process(*sample);
                    }
                }
            }
            offset += len;
        }
        Ok(buffer)
    }

    fn name(&self) -> &'static str {
        "EqualizerNode"
    }

    fn describe(&self) -> String {
        let bands: Vec<String> = self
            .bands
            .iter()
            .map(|b| {
                format!(
                    "{} {} Hz {} dB q {}",
                    b.filter_type.as_str(),
                    b.frequency.value(),
                    b.gain.value(),
                    b.q.value()
                )
            })
            .collect();
        format!("EqualizerNode([{}])", bands.join(", "))
    }

    fn inputs(&self) -> &[BoxedNode] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut Vec<BoxedNode> {
        &mut self.inputs
    }

    fn release(&mut self) {
        self.filters = Vec::new();
        self.format = None;
        self.seek.forget();
    }
}
