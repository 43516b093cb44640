//! WAV file reading and writing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cadence_core::AudioBuffer;
use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

impl WavInfo {
    fn from_reader<R: std::io::Read>(reader: &WavReader<R>) -> Self {
        let spec = reader.spec();
        let num_frames = u64::from(reader.duration());
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            num_frames,
            duration_secs: num_frames as f64 / f64::from(spec.sample_rate.max(1)),
            format: match spec.sample_format {
                SampleFormat::Float => WavFormat::IeeeFloat,
                SampleFormat::Int => WavFormat::Pcm,
            },
        }
    }
}

fn open(path: &Path) -> Result<WavReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(WavReader::new(BufReader::new(file))?)
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = open(path.as_ref())?;
    Ok(WavInfo::from_reader(&reader))
}

/// Read a whole WAV file into an [`AudioBuffer`], one buffer channel per
/// file channel.
///
/// Integer samples are scaled to `[-1, 1)`; float samples are kept as is.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(AudioBuffer, WavInfo)> {
    let reader = open(path.as_ref())?;
    let info = WavInfo::from_reader(&reader);
    let channels = usize::from(info.channels);
    if channels == 0 {
        return Err(Error::UnsupportedFormat("file has no channels".into()));
    }

    let samples: Vec<f32> = match (info.format, info.bits_per_sample) {
        (WavFormat::IeeeFloat, 32) => reader.into_samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (WavFormat::Pcm, bits @ (8 | 16 | 24 | 32)) => {
            let max_val = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
        (format, bits) => {
            return Err(Error::UnsupportedFormat(format!("{bits}-bit {format:?}")));
        }
    };

    tracing::debug!(
        channels,
        sample_rate = info.sample_rate,
        frames = info.num_frames,
        "decoded WAV file"
    );
    Ok((AudioBuffer::from_interleaved(&samples, channels, info.sample_rate), info))
}

/// Write `buffer` as an interleaved WAV file.
///
/// `bits_per_sample` selects 16 or 24-bit integer, or 32-bit float output.
/// Integer output is clamped to full scale.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, bits_per_sample: u16) -> Result<()> {
    let sample_format = match bits_per_sample {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => return Err(Error::UnsupportedFormat(format!("cannot write {other}-bit WAV"))),
    };
    let channels = u16::try_from(buffer.channel_count())
        .map_err(|_| Error::UnsupportedFormat(format!("{} channels", buffer.channel_count())))?;
    let spec = hound::WavSpec {
        channels,
        sample_rate: buffer.sample_rate(),
        bits_per_sample,
        sample_format,
    };
    let mut writer = WavWriter::create(path, spec)?;

    let interleaved = buffer.to_interleaved();
    if sample_format == SampleFormat::Float {
        for sample in interleaved {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (bits_per_sample - 1)) as f32;
        for sample in interleaved {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}
