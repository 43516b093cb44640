//! Multi-channel sample buffers exchanged between graph nodes.
//!
//! [`AudioBuffer`] stores samples as struct-of-arrays: one contiguous `Vec<f32>`
//! per channel, every channel exactly [`sample_count`](AudioBuffer::sample_count)
//! long. A node that creates a buffer owns it until it returns it to its caller.

use crate::time::Time;

/// Fixed-length, multi-channel float sample container.
///
/// # Example
///
/// ```rust
/// use cadence_core::AudioBuffer;
///
/// let mut buffer = AudioBuffer::new(2, 48000, 480);
/// buffer.channel_mut(0).fill(0.5);
/// assert_eq!(buffer.sample_count(), 480);
/// assert_eq!(buffer.channel(1)[0], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    sample_count: usize,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Creates a silent buffer.
    pub fn new(channel_count: usize, sample_rate: u32, sample_count: usize) -> Self {
        Self {
            sample_rate,
            sample_count,
            channels: vec![vec![0.0; sample_count]; channel_count],
        }
    }

    /// Creates a buffer from per-channel sample vectors.
    ///
    /// Channels shorter than the longest one are zero-padded so every channel
    /// has the same length.
    pub fn from_channels(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let sample_count = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(sample_count, 0.0);
        }
        Self {
            sample_rate,
            sample_count,
            channels,
        }
    }

    /// Creates a buffer by de-interleaving `samples`.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        if channel_count == 0 {
            return Self::new(0, sample_rate, 0);
        }
        let frames = samples.len() / channel_count;
        let mut buffer = Self::new(channel_count, sample_rate, frames);
        for (frame, chunk) in samples.chunks_exact(channel_count).enumerate() {
            for (ch, &sample) in chunk.iter().enumerate() {
                buffer.channels[ch][frame] = sample;
            }
        }
        buffer
    }

    /// Interleaves all channels into a single vector.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.sample_count * self.channels.len());
        for frame in 0..self.sample_count {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Returns true if the buffer holds no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Playback duration of the buffer.
    pub fn duration(&self) -> Time {
        Time::from_frames(self.sample_count as i64, self.sample_rate)
    }

    /// Samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Mutable samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channel_count()`.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Iterates over all channels.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Iterates mutably over all channels.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Consumes the buffer and returns its channel vectors.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Sets every sample to zero.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Returns true if both buffers share rate, channel count and length.
    pub fn same_format(&self, other: &AudioBuffer) -> bool {
        self.sample_rate == other.sample_rate
            && self.sample_count == other.sample_count
            && self.channels.len() == other.channels.len()
    }

    /// Copies `len` frames of `src` starting at `src_offset` into this buffer
    /// at `dst_offset`, channel by channel.
    ///
    /// Copies only the channels both buffers have and clips `len` to what fits
    /// in either buffer. Returns the number of frames copied.
    pub fn copy_from(
        &mut self,
        src: &AudioBuffer,
        src_offset: usize,
        dst_offset: usize,
        len: usize,
    ) -> usize {
        let len = len
            .min(src.sample_count.saturating_sub(src_offset))
            .min(self.sample_count.saturating_sub(dst_offset));
        if len == 0 {
            return 0;
        }
        for (dst, src) in self.channels.iter_mut().zip(&src.channels) {
            dst[dst_offset..dst_offset + len].copy_from_slice(&src[src_offset..src_offset + len]);
        }
        len
    }

    /// Returns a copy with exactly `channel_count` channels.
    ///
    /// A mono buffer is duplicated into every output channel. Otherwise
    /// missing channels are silent and extra channels are dropped.
    pub fn with_channel_count(&self, channel_count: usize) -> AudioBuffer {
        let mut out = AudioBuffer::new(channel_count, self.sample_rate, self.sample_count);
        if self.channels.len() == 1 {
            for channel in &mut out.channels {
                channel.copy_from_slice(&self.channels[0]);
            }
        } else {
            for (dst, src) in out.channels.iter_mut().zip(&self.channels) {
                dst.copy_from_slice(src);
            }
        }
        out
    }

    /// Last sample of every channel, or `None` for an empty buffer.
    pub fn last_frame(&self) -> Option<Vec<f32>> {
        if self.sample_count == 0 {
            return None;
        }
        Some(self.channels.iter().map(|c| c[self.sample_count - 1]).collect())
    }
}
