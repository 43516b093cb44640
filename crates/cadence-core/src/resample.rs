//! Streaming windowed-sinc resampler with a variable rate ratio.
//!
//! Each output sample is a weighted sum of the input samples around its
//! fractional input position. The weights come from a Blackman-windowed sinc
//! spanning [`ZERO_CROSSINGS`] zero crossings per side, tabulated once and
//! linearly interpolated:
//!
//! ```text
//! h(x) = sinc(x) * blackman(x / ZERO_CROSSINGS),   |x| < ZERO_CROSSINGS
//! ```
//!
//! When decimating (`ratio > 1`) the kernel is stretched so its cutoff sits
//! at `0.97 / ratio` of the input Nyquist frequency. The weights of every
//! output sample are normalized to sum to one, so DC passes at unity gain
//! regardless of the fractional phase.
//!
//! The resampler is push/pull: callers ask [`SincResampler::frames_needed`]
//! how much input the next `n` outputs require, [`push`](SincResampler::push)
//! that much, then [`pull`](SincResampler::pull) the output. The ratio may
//! change between pulls, which is how variable-speed playback drives it.

use core::f64::consts::PI;

use crate::buffer::AudioBuffer;

/// Zero crossings of the sinc kernel on each side of the center tap.
pub const ZERO_CROSSINGS: usize = 16;

/// Kernel table entries per zero crossing.
const TABLE_RESOLUTION: usize = 512;

/// Cutoff relative to the output Nyquist frequency when decimating.
const DECIMATION_CUTOFF: f64 = 0.97;

/// Decimation ratio beyond which the anti-aliasing cutoff stops narrowing.
/// Bounds the kernel width for extreme playback speeds.
pub const MAX_DECIMATION: f64 = 8.0;

/// Input history is trimmed once this many consumed frames pile up.
const TRIM_THRESHOLD: usize = 4096;

/// Streaming multi-channel windowed-sinc resampler.
///
/// `ratio` is the number of input frames consumed per output frame: `2.0`
/// halves the rate (or plays twice as fast), `0.5` doubles it.
///
/// # Example
///
/// ```rust
/// use cadence_core::{AudioBuffer, SincResampler};
///
/// // 48 kHz -> 24 kHz
/// let mut resampler = SincResampler::new(2.0);
/// let need = resampler.frames_needed(100);
/// resampler.push(&AudioBuffer::new(1, 48000, need));
/// let mut out = AudioBuffer::new(1, 24000, 100);
/// assert_eq!(resampler.pull(&mut out, 0, 100), 100);
/// ```
#[derive(Debug, Clone)]
pub struct SincResampler {
    ratio: f64,
    cutoff: f64,
    reach: usize,
    prime: usize,
    table: Vec<f32>,
    history: Vec<Vec<f32>>,
    len: usize,
    pos: f64,
    weights: Vec<f32>,
}

impl SincResampler {
    /// Creates a resampler positioned at the start of a stream.
    pub fn new(ratio: f64) -> Self {
        let prime = reach_for(cutoff_for(MAX_DECIMATION));
        let mut resampler = Self {
            ratio: 1.0,
            cutoff: 1.0,
            reach: ZERO_CROSSINGS,
            prime,
            table: kernel_table(),
            history: Vec::new(),
            len: 0,
            pos: 0.0,
            weights: Vec::with_capacity(2 * prime + 2),
        };
        resampler.set_ratio(ratio);
        resampler.reset(0.0);
        resampler
    }

    /// Input frames consumed per output frame.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Changes the rate ratio for subsequent output.
    ///
    /// Non-finite or non-positive ratios are ignored.
    pub fn set_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0) {
            return;
        }
        self.ratio = ratio;
        self.cutoff = cutoff_for(ratio);
        self.reach = reach_for(self.cutoff);
    }

    /// Discards all history and restarts the stream.
    ///
    /// The first output sample lands `phase` (in `[0, 1)`) input frames after
    /// the first frame pushed afterwards. Input before the stream start reads
    /// as silence.
    pub fn reset(&mut self, phase: f64) {
        self.history.clear();
        self.len = self.prime;
        self.pos = self.prime as f64 + phase.clamp(0.0, 1.0);
    }

    /// Input frames before the stream start that shape the first outputs
    /// after a [`reset`](Self::reset).
    pub fn lookbehind(&self) -> usize {
        self.prime
    }

    /// Fills the history before the stream start with the trailing frames
    /// of `lead` instead of silence, and fixes the channel count.
    ///
    /// Only valid right after [`reset`](Self::reset); ignored once input
    /// has been pushed.
    pub fn preload(&mut self, lead: &AudioBuffer) {
        if !self.history.is_empty() {
            return;
        }
        let keep = lead.sample_count().min(self.prime);
        let from = lead.sample_count() - keep;
        self.history = (0..lead.channel_count())
            .map(|ch| {
                let mut history = vec![0.0; self.len - keep];
                history.extend_from_slice(&lead.channel(ch)[from..]);
                history
            })
            .collect();
    }

    /// Number of channels seen so far (0 before the first push).
    pub fn channel_count(&self) -> usize {
        self.history.len()
    }

    /// Input frames that must still be pushed before `output_frames` more
    /// frames can be pulled at the current ratio.
    pub fn frames_needed(&self, output_frames: usize) -> usize {
        if output_frames == 0 {
            return 0;
        }
        let last = self.pos + (output_frames - 1) as f64 * self.ratio;
        let required = last.floor() as usize + self.reach + 1;
        required.saturating_sub(self.len)
    }

    /// Appends input frames.
    ///
    /// The first push fixes the channel count; later pushes with fewer
    /// channels are padded with silence and extra channels are ignored.
    pub fn push(&mut self, input: &AudioBuffer) {
        if self.history.is_empty() {
            self.history = vec![vec![0.0; self.len]; input.channel_count()];
        }
        let frames = input.sample_count();
        for (ch, history) in self.history.iter_mut().enumerate() {
            if ch < input.channel_count() {
                history.extend_from_slice(input.channel(ch));
            } else {
                history.resize(history.len() + frames, 0.0);
            }
        }
        self.len += frames;
    }

    /// Writes up to `frames` output frames into `output` starting at
    /// `offset`. Returns how many were written; fewer than requested means
    /// more input is needed.
    pub fn pull(&mut self, output: &mut AudioBuffer, offset: usize, frames: usize) -> usize {
        let frames = frames.min(output.sample_count().saturating_sub(offset));
        let mut produced = 0;
        while produced < frames {
            let center = self.pos.floor() as usize;
            if center + self.reach + 1 > self.len {
                break;
            }
            let lo = (center + 1).saturating_sub(self.reach);
            let hi = center + self.reach;
            self.compute_weights(lo, hi);

            for (ch, history) in self.history.iter().enumerate().take(output.channel_count()) {
                let taps = &history[lo..=hi];
                let acc: f32 = taps.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
                output.channel_mut(ch)[offset + produced] = acc;
            }
            produced += 1;
            self.pos += self.ratio;
        }
        self.trim();
        produced
    }

    /// Normalized kernel weights for taps `lo..=hi` around `self.pos`.
    fn compute_weights(&mut self, lo: usize, hi: usize) {
        self.weights.clear();
        let mut sum = 0.0_f32;
        for i in lo..=hi {
            let x = (self.pos - i as f64).abs() * self.cutoff;
            let w = self.kernel(x);
            self.weights.push(w);
            sum += w;
        }
        if sum.abs() > 1e-9 {
            let inv = 1.0 / sum;
            for w in &mut self.weights {
                *w *= inv;
            }
        }
    }

    #[inline]
    fn kernel(&self, x: f64) -> f32 {
        if x >= ZERO_CROSSINGS as f64 {
            return 0.0;
        }
        let scaled = x * TABLE_RESOLUTION as f64;
        let index = scaled as usize;
        let frac = (scaled - index as f64) as f32;
        let a = self.table[index];
        let b = self.table[index + 1];
        a + (b - a) * frac
    }

    fn trim(&mut self) {
        let center = self.pos.floor() as usize;
        let drop = center.saturating_sub(self.prime).min(self.len);
        if drop < TRIM_THRESHOLD {
            return;
        }
        for history in &mut self.history {
            history.drain(..drop);
        }
        self.len -= drop;
        self.pos -= drop as f64;
    }
}

/// Normalized cutoff (1.0 = input Nyquist) for a rate ratio.
fn cutoff_for(ratio: f64) -> f64 {
    if ratio <= 1.0 {
        1.0
    } else {
        DECIMATION_CUTOFF / ratio.min(MAX_DECIMATION)
    }
}

/// Kernel half-width in input frames for a cutoff.
fn reach_for(cutoff: f64) -> usize {
    (ZERO_CROSSINGS as f64 / cutoff).ceil() as usize
}

/// Tabulates `sinc(x) * blackman(x / ZERO_CROSSINGS)` for `x` in
/// `[0, ZERO_CROSSINGS]`, with a trailing zero for interpolation.
fn kernel_table() -> Vec<f32> {
    let n = ZERO_CROSSINGS * TABLE_RESOLUTION;
    let mut table = Vec::with_capacity(n + 2);
    for i in 0..=n {
        let x = i as f64 / TABLE_RESOLUTION as f64;
        let sinc = if x < 1e-9 { 1.0 } else { (PI * x).sin() / (PI * x) };
        let u = x / ZERO_CROSSINGS as f64;
        let window = 0.42 + 0.5 * (PI * u).cos() + 0.08 * (2.0 * PI * u).cos();
        table.push((sinc * window.max(0.0)) as f32);
    }
    table.push(0.0);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, frames: usize) -> AudioBuffer {
        let samples = (0..frames)
            .map(|i| (2.0 * core::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect();
        AudioBuffer::from_channels(vec![samples], rate)
    }

    fn run(resampler: &mut SincResampler, input: &AudioBuffer, frames: usize, rate: u32) -> AudioBuffer {
        let mut out = AudioBuffer::new(input.channel_count(), rate, frames);
        let need = resampler.frames_needed(frames);
        assert!(need <= input.sample_count());
        let mut slice = AudioBuffer::new(input.channel_count(), input.sample_rate(), need);
        slice.copy_from(input, 0, 0, need);
        resampler.push(&slice);
        assert_eq!(resampler.pull(&mut out, 0, frames), frames);
        out
    }

    #[test]
    fn test_kernel_table_shape() {
        let table = kernel_table();
        assert!((table[0] - 1.0).abs() < 1e-6);
        assert!(table[TABLE_RESOLUTION].abs() < 1e-6);
        assert_eq!(*table.last().unwrap(), 0.0);
    }

    #[test]
    fn test_dc_passes_at_unity() {
        for ratio in [0.5, 0.9, 1.0, 1.37, 3.0] {
            let mut resampler = SincResampler::new(ratio);
            let need = resampler.frames_needed(400);
            resampler.push(&AudioBuffer::from_channels(vec![vec![1.0; need]], 48000));
            let mut out = AudioBuffer::new(1, 48000, 400);
            assert_eq!(resampler.pull(&mut out, 0, 400), 400);
            // The start is faded in by the silent history; the tail is flat.
            for &s in &out.channel(0)[200..] {
                assert!((s - 1.0).abs() < 1e-3, "ratio {ratio}: {s}");
            }
        }
    }

    #[test]
    fn test_unit_ratio_is_transparent() {
        let input = sine(440.0, 48000, 4000);
        let mut resampler = SincResampler::new(1.0);
        let out = run(&mut resampler, &input, 3000, 48000);
        for i in 100..3000 {
            assert!((out.channel(0)[i] - input.channel(0)[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_frames_needed_is_exact() {
        let mut resampler = SincResampler::new(1.5);
        let need = resampler.frames_needed(64);
        resampler.push(&AudioBuffer::new(2, 48000, need));
        let mut out = AudioBuffer::new(2, 32000, 65);
        assert_eq!(resampler.pull(&mut out, 0, 65), 64);
        assert_eq!(resampler.frames_needed(0), 0);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let input = sine(1000.0, 44100, 20_000);
        let mut one_shot = SincResampler::new(44100.0 / 48000.0);
        let whole = run(&mut one_shot, &input, 12_000, 48000);

        let mut streaming = SincResampler::new(44100.0 / 48000.0);
        let mut out = AudioBuffer::new(1, 48000, 12_000);
        let mut cursor = 0;
        for block in 0..12 {
            let need = streaming.frames_needed(1000);
            let mut slice = AudioBuffer::new(1, 44100, need);
            slice.copy_from(&input, cursor, 0, need);
            cursor += need;
            streaming.push(&slice);
            assert_eq!(streaming.pull(&mut out, block * 1000, 1000), 1000);
        }
        for i in 0..12_000 {
            assert!((out.channel(0)[i] - whole.channel(0)[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_preload_removes_start_transient() {
        let mut resampler = SincResampler::new(1.0);
        resampler.preload(&AudioBuffer::from_channels(vec![vec![1.0; 500]], 48000));
        let need = resampler.frames_needed(50);
        resampler.push(&AudioBuffer::from_channels(vec![vec![1.0; need]], 48000));
        let mut out = AudioBuffer::new(1, 48000, 50);
        assert_eq!(resampler.pull(&mut out, 0, 50), 50);
        for &s in out.channel(0) {
            assert!((s - 1.0).abs() < 1e-4, "{s}");
        }
    }

    #[test]
    fn test_decimation_attenuates_above_nyquist() {
        // 20 kHz tone at 48 kHz resampled to 16 kHz (new Nyquist 8 kHz).
        let input = sine(20_000.0, 48000, 30_000);
        let mut resampler = SincResampler::new(3.0);
        let out = run(&mut resampler, &input, 9_000, 16000);
        let level = crate::math::rms(&out.channel(0)[500..]);
        assert!(level < 0.01, "alias level {level}");
    }
}
