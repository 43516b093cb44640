//! Decoded-audio boundary consumed by [`SourceNode`](crate::graph::SourceNode).
//!
//! A [`SoundSource`] hands out PCM at its own native rate, as mono or
//! interleaved stereo frames. Decoding, file access and caching live behind
//! this trait; `cadence-io` provides a WAV implementation and
//! [`MemorySource`] serves buffers already in memory.

use std::error::Error;

use crate::buffer::AudioBuffer;
use crate::time::Time;

/// Error type returned by sources and effect processors.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// PCM frames returned by a [`SoundSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum Pcm {
    /// One sample per frame.
    Mono(Vec<f32>),
    /// Left/right pairs.
    Stereo(Vec<[f32; 2]>),
}

impl Pcm {
    /// Number of frames.
    pub fn len(&self) -> usize {
        match self {
            Pcm::Mono(samples) => samples.len(),
            Pcm::Stereo(frames) => frames.len(),
        }
    }

    /// Returns true if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels (1 or 2).
    pub fn channel_count(&self) -> usize {
        match self {
            Pcm::Mono(_) => 1,
            Pcm::Stereo(_) => 2,
        }
    }

    /// Copies the frames into `buffer` starting at frame `offset`. Copies at
    /// most the frames that fit; returns the number copied.
    pub fn write_into(&self, buffer: &mut AudioBuffer, offset: usize) -> usize {
        let room = buffer.sample_count().saturating_sub(offset);
        let n = self.len().min(room);
        match self {
            Pcm::Mono(samples) => {
                for ch in 0..buffer.channel_count() {
                    buffer.channel_mut(ch)[offset..offset + n].copy_from_slice(&samples[..n]);
                }
            }
            Pcm::Stereo(frames) => {
                let channels = buffer.channel_count();
                if channels == 0 {
                    return 0;
                }
                for (i, frame) in frames[..n].iter().enumerate() {
                    if channels == 1 {
                        buffer.channel_mut(0)[offset + i] = (frame[0] + frame[1]) * 0.5;
                    } else {
                        buffer.channel_mut(0)[offset + i] = frame[0];
                        buffer.channel_mut(1)[offset + i] = frame[1];
                    }
                }
            }
        }
        n
    }
}

/// Random-access decoded audio.
///
/// Frame indices are at [`sample_rate`](Self::sample_rate); frame 0 is the
/// start of the material.
pub trait SoundSource: Send + Sync {
    /// Native sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Channels delivered by [`read`](Self::read) (1 or 2).
    fn channel_count(&self) -> usize;

    /// Total length of the material.
    fn duration(&self) -> Time;

    /// Reads up to `frames` frames starting at `start`.
    ///
    /// `Ok(None)` means nothing is available there (past the end); a short
    /// read means the material ends inside the request.
    fn read(&self, start: u64, frames: usize) -> Result<Option<Pcm>, BoxError>;

    /// Human-readable identification for logs and graph dumps.
    fn name(&self) -> &str {
        "source"
    }
}

/// In-memory [`SoundSource`] over an [`AudioBuffer`].
///
/// Buffers with more than two channels expose their first two.
#[derive(Debug, Clone)]
pub struct MemorySource {
    buffer: AudioBuffer,
    name: String,
}

impl MemorySource {
    /// Wraps `buffer`.
    pub fn new(buffer: AudioBuffer) -> Self {
        Self {
            buffer,
            name: "memory".to_owned(),
        }
    }

    /// Sets the name reported by [`SoundSource::name`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The wrapped buffer.
    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }
}

impl SoundSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    fn channel_count(&self) -> usize {
        self.buffer.channel_count().min(2)
    }

    fn duration(&self) -> Time {
        self.buffer.duration()
    }

    fn read(&self, start: u64, frames: usize) -> Result<Option<Pcm>, BoxError> {
        let total = self.buffer.sample_count();
        let Ok(start) = usize::try_from(start) else {
            return Ok(None);
        };
        if start >= total || self.buffer.channel_count() == 0 {
            return Ok(None);
        }
        let end = start + frames.min(total - start);
        let pcm = if self.buffer.channel_count() == 1 {
            Pcm::Mono(self.buffer.channel(0)[start..end].to_vec())
        } else {
            let left = &self.buffer.channel(0)[start..end];
            let right = &self.buffer.channel(1)[start..end];
            Pcm::Stereo(left.iter().zip(right).map(|(&l, &r)| [l, r]).collect())
        };
        Ok(Some(pcm))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
