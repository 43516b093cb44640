//! WAV files as graph sources.

use std::path::{Path, PathBuf};

use cadence_core::{AudioBuffer, BoxError, MemorySource, Pcm, SoundSource, Time};

use crate::Result;
use crate::wav::{WavInfo, read_wav};

/// A decoded WAV file served to [`SourceNode`](cadence_core::SourceNode).
///
/// The whole file is decoded on [`open`](Self::open) and kept in memory at
/// its native rate. Files with more than two channels expose their first
/// two.
#[derive(Debug, Clone)]
pub struct WavSource {
    path: PathBuf,
    info: WavInfo,
    pcm: MemorySource,
}

impl WavSource {
    /// Decodes the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (buffer, info) = read_wav(&path)?;
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
        tracing::info!(
            path = %path.display(),
            channels = info.channels,
            sample_rate = info.sample_rate,
            duration_secs = info.duration_secs,
            "opened WAV source"
        );
        Ok(Self {
            path,
            info,
            pcm: MemorySource::new(buffer).with_name(name),
        })
    }

    /// File the source was decoded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header information of the file.
    pub fn info(&self) -> &WavInfo {
        &self.info
    }

    /// The decoded samples.
    pub fn buffer(&self) -> &AudioBuffer {
        self.pcm.buffer()
    }
}

impl SoundSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.pcm.sample_rate()
    }

    fn channel_count(&self) -> usize {
        self.pcm.channel_count()
    }

    fn duration(&self) -> Time {
        self.pcm.duration()
    }

    fn read(&self, start: u64, frames: usize) -> std::result::Result<Option<Pcm>, BoxError> {
        self.pcm.read(start, frames)
    }

    fn name(&self) -> &str {
        self.pcm.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_wav;
    use tempfile::TempDir;

    #[test]
    fn test_source_named_after_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kick.wav");
        let buffer = AudioBuffer::from_channels(vec![vec![0.5; 100]], 1000);
        write_wav(&path, &buffer, 32).unwrap();

        let source = WavSource::open(&path).unwrap();
        assert_eq!(source.name(), "kick");
        assert_eq!(source.sample_rate(), 1000);
        assert_eq!(source.channel_count(), 1);
        assert_eq!(source.duration(), Time::from_millis(100));
        assert_eq!(source.read(98, 10).unwrap(), Some(Pcm::Mono(vec![0.5, 0.5])));
        assert_eq!(source.read(100, 10).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = WavSource::open(dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
