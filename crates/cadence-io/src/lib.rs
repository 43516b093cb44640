//! Audio file I/O for the cadence render graph.
//!
//! This crate provides:
//!
//! - **Decoding**: [`WavSource`] loads a WAV file into a
//!   [`SoundSource`](cadence_core::SoundSource) for [`SourceNode`](cadence_core::SourceNode)
//! - **Buffer I/O**: [`read_wav`] and [`write_wav`] move whole [`AudioBuffer`](cadence_core::AudioBuffer)s
//!   in and out of WAV files
//! - **Metadata**: [`read_wav_info`] reads the header only
//!
//! Integer files of 8, 16, 24 and 32 bits and 32-bit float files are
//! decoded; output is written as 16 or 24-bit integer or 32-bit float.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cadence_core::{GraphBuilder, KeyFrameSampler, ResampleNode, SourceNode, TimeRange};
//! use cadence_io::{WavSource, write_wav};
//!
//! let source = WavSource::open("voice.wav")?;
//! let mut graph = GraphBuilder::new(SourceNode::new(Arc::new(source)))
//!     .then(ResampleNode::new(48000))
//!     .build();
//! let out = graph.render(TimeRange::from_secs_f64(0.0, 2.0), 48000, &KeyFrameSampler)?;
//! write_wav("voice-48k.wav", &out, 24)?;
//! ```

mod source;
mod wav;

pub use source::WavSource;
pub use wav::{WavFormat, WavInfo, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
