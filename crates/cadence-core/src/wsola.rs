//! WSOLA (Waveform Similarity Overlap-Add) time stretching for one channel.
//!
//! Output is assembled from Hann-windowed frames laid down every
//! `hop` samples. Frame `m` is nominally read from the input at
//! `m * hop * speed`; the actual read position is moved within
//! `±search` samples to the spot whose start best matches the natural
//! continuation of the previous frame (normalized cross-correlation over
//! the overlap region). Because frames are only repeated or skipped, never
//! resampled, pitch is preserved.
//!
//! With 50 % overlap, periodic Hann windows sum to exactly one, so a
//! stationary input is reproduced at unity gain.

use std::collections::VecDeque;

use core::f32::consts::PI;

/// WSOLA tuning, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WsolaConfig {
    /// Analysis/synthesis frame length.
    pub frame_ms: f32,
    /// Maximum shift of a frame away from its nominal position.
    pub search_ms: f32,
}

impl Default for WsolaConfig {
    fn default() -> Self {
        Self {
            frame_ms: 25.0,
            search_ms: 8.0,
        }
    }
}

impl WsolaConfig {
    /// Frame length in samples (even, at least 4).
    pub fn frame_size(&self, sample_rate: u32) -> usize {
        let frames = (self.frame_ms * sample_rate as f32 / 1000.0).round() as usize;
        (frames.max(4) + 1) & !1
    }

    /// Synthesis hop in samples (half a frame).
    pub fn hop_size(&self, sample_rate: u32) -> usize {
        self.frame_size(sample_rate) / 2
    }

    /// Search radius in samples.
    pub fn search_radius(&self, sample_rate: u32) -> usize {
        (self.search_ms * sample_rate as f32 / 1000.0).round() as usize
    }
}

/// Streaming single-channel WSOLA processor.
///
/// Input positions are absolute sample indices counted from the first sample
/// ever pushed.
#[derive(Debug, Clone)]
pub struct Wsola {
    frame: usize,
    hop: usize,
    search: usize,
    window: Vec<f32>,
    speed: f64,

    input: Vec<f32>,
    base: usize,
    nominal: f64,
    prev_pos: Option<usize>,

    overlap: Vec<f32>,
    ready: VecDeque<f32>,
}

impl Wsola {
    /// Creates a processor for `speed` (2.0 = twice as fast).
    pub fn new(config: WsolaConfig, sample_rate: u32, speed: f64) -> Self {
        let frame = config.frame_size(sample_rate);
        let window = (0..frame)
            .map(|j| 0.5 - 0.5 * (2.0 * PI * j as f32 / frame as f32).cos())
            .collect();
        Self {
            frame,
            hop: frame / 2,
            search: config.search_radius(sample_rate),
            window,
            speed: speed.max(f64::EPSILON),
            input: Vec::new(),
            base: 0,
            nominal: 0.0,
            prev_pos: None,
            overlap: vec![0.0; frame],
            ready: VecDeque::new(),
        }
    }

    /// Playback speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Output samples synthesized but not yet pulled.
    pub fn available(&self) -> usize {
        self.ready.len()
    }

    /// Appends input samples.
    pub fn push(&mut self, samples: &[f32]) {
        self.input.extend_from_slice(samples);
    }

    /// Input samples that must still be pushed before `output` more samples
    /// can be pulled.
    pub fn input_needed(&self, output: usize) -> usize {
        let missing = output.saturating_sub(self.ready.len());
        if missing == 0 {
            return 0;
        }
        let frames = missing.div_ceil(self.hop);
        let last = self.nominal + (frames - 1) as f64 * self.hop as f64 * self.speed;
        let required = last.round() as usize + self.search + self.frame;
        required.saturating_sub(self.input_end())
    }

    /// Fills as much of `output` as the buffered input allows. Returns the
    /// number of samples written.
    pub fn pull(&mut self, output: &mut [f32]) -> usize {
        while self.ready.len() < output.len() && self.can_synthesize() {
            self.synthesize_frame();
        }
        let n = output.len().min(self.ready.len());
        for (dst, src) in output.iter_mut().zip(self.ready.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn input_end(&self) -> usize {
        self.base + self.input.len()
    }

    fn can_synthesize(&self) -> bool {
        self.nominal.round() as usize + self.search + self.frame <= self.input_end()
    }

    fn synthesize_frame(&mut self) {
        let target = self.nominal.round() as usize;
        let pos = match self.prev_pos {
            None => target,
            Some(prev) => self.best_position(target, prev + self.hop),
        };

        let first = self.prev_pos.is_none();
        let start = pos - self.base;
        for j in 0..self.frame {
            // The very first frame has no predecessor to cross-fade with.
            let w = if first && j < self.hop { 1.0 } else { self.window[j] };
            self.overlap[j] += self.input[start + j] * w;
        }

        self.ready.extend(&self.overlap[..self.hop]);
        self.overlap.copy_within(self.hop.., 0);
        let tail = self.frame - self.hop;
        self.overlap[tail..].fill(0.0);

        self.prev_pos = Some(pos);
        self.nominal += self.hop as f64 * self.speed;
        self.trim();
    }

    /// Candidate in `target ± search` whose leading overlap region best
    /// matches the samples starting at `reference`.
    fn best_position(&self, target: usize, reference: usize) -> usize {
        let len = self.frame - self.hop;
        let reference = &self.input[reference - self.base..reference - self.base + len];
        let ref_energy: f32 = reference.iter().map(|x| x * x).sum();
        if ref_energy < 1e-10 {
            return target;
        }

        let lo = target.saturating_sub(self.search).max(self.base);
        let hi = target + self.search;
        let mut best = target;
        let mut best_score = self.correlation(target, reference, ref_energy);
        for candidate in lo..=hi {
            let score = self.correlation(candidate, reference, ref_energy);
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
        best
    }

    fn correlation(&self, candidate: usize, reference: &[f32], ref_energy: f32) -> f32 {
        let start = candidate - self.base;
        let segment = &self.input[start..start + reference.len()];
        let mut cross = 0.0_f32;
        let mut energy = 0.0_f32;
        for (&a, &b) in segment.iter().zip(reference) {
            cross += a * b;
            energy += a * a;
        }
        let denom = (energy * ref_energy).sqrt();
        if denom < 1e-10 { 0.0 } else { cross / denom }
    }

    /// Drops input no future frame can read.
    fn trim(&mut self) {
        let next_reference = self.prev_pos.map_or(self.base, |p| p + self.hop);
        let next_lowest = (self.nominal.round() as usize).saturating_sub(self.search);
        let keep_from = next_reference.min(next_lowest).max(self.base);
        let drop = keep_from - self.base;
        if drop >= 4 * self.frame {
            self.input.drain(..drop);
            self.base = keep_from;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    fn stretch(input: &[f32], rate: u32, speed: f64, out_len: usize) -> Vec<f32> {
        let mut wsola = Wsola::new(WsolaConfig::default(), rate, speed);
        let mut output = vec![0.0; out_len];
        let mut cursor = 0;
        let mut written = 0;
        while written < out_len {
            let need = wsola.input_needed(out_len - written);
            wsola.push(&input[cursor..cursor + need]);
            cursor += need;
            written += wsola.pull(&mut output[written..]);
        }
        output
    }

    #[test]
    fn test_config_sizes() {
        let config = WsolaConfig::default();
        assert_eq!(config.frame_size(48000), 1200);
        assert_eq!(config.hop_size(48000), 600);
        assert_eq!(config.search_radius(48000), 384);
        assert_eq!(config.frame_size(44100) % 2, 0);
    }

    #[test]
    fn test_hann_windows_sum_to_one() {
        let wsola = Wsola::new(WsolaConfig::default(), 48000, 1.0);
        for j in 0..wsola.hop {
            let sum = wsola.window[j] + wsola.window[j + wsola.hop];
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_unit_speed_reproduces_input() {
        let input = sine(440.0, 48000, 48000);
        let out = stretch(&input, 48000, 1.0, 20000);
        for i in 0..20000 {
            assert!((out[i] - input[i]).abs() < 1e-3, "sample {i}");
        }
    }

    #[test]
    fn test_double_speed_keeps_pitch() {
        let rate = 48000;
        let input = sine(440.0, rate, 4 * rate as usize);
        let out = stretch(&input, rate, 2.0, rate as usize);
        // One second of output at 440 Hz has ~880 crossings.
        let crossings = zero_crossings(&out[2400..]) as f32 / (1.0 - 2400.0 / rate as f32);
        assert!((crossings - 880.0).abs() < 40.0, "crossings {crossings}");
    }

    #[test]
    fn test_half_speed_keeps_pitch() {
        let rate = 48000;
        let input = sine(440.0, rate, rate as usize);
        let out = stretch(&input, rate, 0.5, rate as usize);
        let crossings = zero_crossings(&out[2400..]) as f32 / (1.0 - 2400.0 / rate as f32);
        assert!((crossings - 880.0).abs() < 40.0, "crossings {crossings}");
    }

    #[test]
    fn test_input_needed_is_sufficient() {
        let mut wsola = Wsola::new(WsolaConfig::default(), 44100, 1.7);
        let need = wsola.input_needed(5000);
        wsola.push(&vec![0.1; need]);
        let mut out = vec![0.0; 5000];
        assert_eq!(wsola.pull(&mut out), 5000);
        assert_eq!(wsola.input_needed(0), 0);
    }

    #[test]
    fn test_stationary_level_is_preserved() {
        let input = sine(300.0, 48000, 4 * 48000);
        let out = stretch(&input, 48000, 1.5, 48000);
        let level = crate::math::rms(&out[4800..]);
        assert!((level - core::f32::consts::FRAC_1_SQRT_2).abs() < 0.1, "rms {level}");
    }
}
