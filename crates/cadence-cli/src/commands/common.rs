//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cadence_config::ProjectConfig;
use cadence_core::{AudioBuffer, BoxError, GraphError, SoundSource, TimeRange, linear_to_db, peak, rms};
use cadence_io::WavSource;
use indicatif::{ProgressBar, ProgressStyle};

/// Bit depths accepted by `--bit-depth`.
pub const BIT_DEPTHS: [u16; 3] = [16, 24, 32];

/// Opens a WAV file as a graph source.
pub fn wav_loader(path: &Path) -> Result<Arc<dyn SoundSource>, BoxError> {
    let source: Arc<dyn SoundSource> = Arc::new(WavSource::open(path)?);
    Ok(source)
}

/// Loads a project file and returns it with the directory its sources are
/// relative to.
pub fn load_project(path: &Path) -> anyhow::Result<(ProjectConfig, PathBuf)> {
    let project =
        ProjectConfig::load(path).with_context(|| format!("cannot load project {}", path.display()))?;
    let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    Ok((project, base_dir))
}

/// Validates a `--bit-depth` value.
pub fn check_bit_depth(bits: u16) -> anyhow::Result<()> {
    if !BIT_DEPTHS.contains(&bits) {
        anyhow::bail!("unsupported bit depth {bits} (expected 16, 24 or 32)");
    }
    Ok(())
}

/// Converts a `--window` length in milliseconds to frames.
pub fn window_frames(window_ms: u32, sample_rate: u32) -> usize {
    (u64::from(window_ms.max(1)) * u64::from(sample_rate) / 1000).max(1) as usize
}

/// Frame-accurate windows tiling `[start_frame, start_frame + total)`.
///
/// Consecutive windows share their boundary exactly, so stateful nodes see
/// one continuous stream.
pub fn windows(start_frame: i64, total: usize, window: usize, sample_rate: u32) -> impl Iterator<Item = TimeRange> {
    let window = window.max(1);
    (0..total).step_by(window).map(move |offset| {
        let frames = window.min(total - offset);
        TimeRange::from_frames(start_frame + offset as i64, frames, sample_rate)
    })
}

/// Progress bar counting output frames.
pub fn progress_bar(frames: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

/// Renders `total` frames window by window and concatenates the results.
pub fn render_windows<F>(
    start_frame: i64,
    total: usize,
    window: usize,
    sample_rate: u32,
    mut render: F,
) -> anyhow::Result<AudioBuffer>
where
    F: FnMut(TimeRange) -> Result<AudioBuffer, GraphError>,
{
    let pb = progress_bar(total)?;
    let mut channels: Vec<Vec<f32>> = Vec::new();
    for range in windows(start_frame, total, window, sample_rate) {
        let block = render(range).with_context(|| format!("render failed at {range}"))?;
        if channels.is_empty() {
            channels = vec![Vec::with_capacity(total); block.channel_count()];
        }
        for (out, samples) in channels.iter_mut().zip(block.channels()) {
            out.extend_from_slice(samples);
        }
        pb.inc(block.sample_count() as u64);
    }
    pb.finish_and_clear();
    Ok(AudioBuffer::from_channels(channels, sample_rate))
}

/// Averages all channels into one.
pub fn downmix_to_mono(buffer: &AudioBuffer) -> AudioBuffer {
    let channels = buffer.channel_count().max(1) as f32;
    let mut mono = vec![0.0; buffer.sample_count()];
    for channel in buffer.channels() {
        for (m, s) in mono.iter_mut().zip(channel) {
            *m += s / channels;
        }
    }
    AudioBuffer::from_channels(vec![mono], buffer.sample_rate())
}

/// Prints RMS and peak level per channel.
pub fn print_stats(label: &str, buffer: &AudioBuffer) {
    for (ch, samples) in buffer.channels().enumerate() {
        println!(
            "  {label} ch{ch}: RMS {:.1} dB, Peak {:.1} dB",
            linear_to_db(rms(samples)),
            linear_to_db(peak(samples))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_tile_without_gaps() {
        let ranges: Vec<TimeRange> = windows(100, 1000, 300, 44100).collect();
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].start_frame(44100), 100);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
        let frames: usize = ranges.iter().map(|r| r.sample_count(44100)).sum();
        assert_eq!(frames, 1000);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = AudioBuffer::from_channels(vec![vec![1.0, 0.5], vec![0.0, 0.5]], 8000);
        let mono = downmix_to_mono(&stereo);
        assert_eq!(mono.channel_count(), 1);
        assert_eq!(mono.channel(0), &[0.5, 0.5]);
    }

    #[test]
    fn test_bit_depths() {
        assert!(check_bit_depth(24).is_ok());
        assert!(check_bit_depth(8).is_err());
    }

    #[test]
    fn test_render_windows_concatenates() {
        let out = render_windows(0, 10, 3, 1000, |range| {
            let start = range.start_frame(1000);
            let samples = (0..range.sample_count(1000)).map(|i| (start + i as i64) as f32).collect();
            Ok(AudioBuffer::from_channels(vec![samples], 1000))
        })
        .unwrap();
        assert_eq!(out.channel(0), (0..10).map(|i| i as f32).collect::<Vec<_>>().as_slice());
    }
}
