//! Mixing many track graphs into one master output.

use crate::animation::AnimationSampler;
use crate::buffer::AudioBuffer;
use crate::math::{add_with_gain, apply_limiter};
use crate::time::{Time, TimeRange};

use super::builder::AudioGraph;
use super::error::GraphError;

/// Master limiter threshold (linear).
pub const LIMITER_THRESHOLD: f32 = 1.0;
/// Master limiter ratio.
pub const LIMITER_RATIO: f32 = 10.0;

/// Channels of the master output.
pub const MASTER_CHANNELS: usize = 2;

/// One timeline track: a graph plus the timeline span where it is audible.
#[derive(Debug)]
pub struct Track {
    name: String,
    graph: AudioGraph,
    extent: TimeRange,
}

impl Track {
    /// Creates a track. `extent` is the timeline range the graph covers;
    /// outside it the graph is never asked for samples.
    pub fn new(name: impl Into<String>, graph: AudioGraph, extent: TimeRange) -> Self {
        Self {
            name: name.into(),
            graph,
            extent,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Timeline range the track covers.
    pub fn extent(&self) -> TimeRange {
        self.extent
    }

    /// The track's graph.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Mutable access to the track's graph.
    pub fn graph_mut(&mut self) -> &mut AudioGraph {
        &mut self.graph
    }
}

/// Renders a set of tracks into a limited stereo master.
///
/// For each window, tracks whose extent does not intersect it are skipped;
/// the rest are rendered at the project rate, folded to stereo (mono is
/// duplicated, extra channels dropped), summed, and run through the master
/// limiter.
#[derive(Debug)]
pub struct Composer {
    sample_rate: u32,
    tracks: Vec<Track>,
}

impl Composer {
    /// Creates an empty composer rendering at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            tracks: Vec::new(),
        }
    }

    /// Project sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Adds a track.
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// All tracks, in mixing order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Mutable tracks.
    pub fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    /// End of the last track, or zero without tracks.
    pub fn duration(&self) -> Time {
        self.tracks
            .iter()
            .map(|t| t.extent.end())
            .max()
            .unwrap_or(Time::ZERO)
    }

    /// Renders `range` of the timeline.
    pub fn render(&mut self, range: TimeRange, sampler: &dyn AnimationSampler) -> Result<AudioBuffer, GraphError> {
        let rate = self.sample_rate;
        let frames = range.sample_count(rate);
        let mut master = AudioBuffer::new(MASTER_CHANNELS, rate, frames);
        if frames == 0 {
            return Ok(master);
        }

        for track in &mut self.tracks {
            if !track.extent.intersects(&range) {
                #[cfg(feature = "tracing")]
                tracing::debug!(track = %track.name, %range, "Composer: track outside window, skipped");
                continue;
            }
            let buffer = track.graph.render(range, rate, sampler)?;
            let stereo = buffer.with_channel_count(MASTER_CHANNELS);
            for ch in 0..MASTER_CHANNELS {
                add_with_gain(stereo.channel(ch), master.channel_mut(ch), 1.0);
            }
        }

        for channel in master.channels_mut() {
            apply_limiter(channel, LIMITER_THRESHOLD, LIMITER_RATIO);
        }
        Ok(master)
    }

    /// Releases the DSP state of every track.
    pub fn dispose(&mut self) {
        for track in &mut self.tracks {
            track.graph.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::KeyFrameSampler;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::nodes::ClipNode;
    use crate::graph::test_util::Constant;

    fn clip_track(value: f32, channels: usize, start_ms: i64, duration_ms: i64) -> Track {
        let start = Time::from_millis(start_ms);
        let duration = Time::from_millis(duration_ms);
        let graph = GraphBuilder::new(Constant::new(channels, value))
            .then(ClipNode::new(start, duration))
            .build();
        Track::new("t", graph, TimeRange::new(start, duration))
    }

    #[test]
    fn test_sums_tracks_in_stereo() {
        let mut composer = Composer::new(1000);
        composer.add_track(clip_track(0.25, 1, 0, 10));
        composer.add_track(clip_track(0.5, 2, 2, 10));
        let out = composer
            .render(TimeRange::new(Time::ZERO, Time::from_millis(4)), &KeyFrameSampler)
            .unwrap();
        assert_eq!(out.channel_count(), 2);
        assert_eq!(out.channel(0), &[0.25, 0.25, 0.75, 0.75]);
        assert_eq!(out.channel(1), &[0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn test_skips_tracks_outside_the_window() {
        let mut composer = Composer::new(1000);
        composer.add_track(clip_track(0.5, 2, 100, 10));
        // A clip asked for a disjoint range would fail; the composer never asks.
        let out = composer
            .render(TimeRange::new(Time::ZERO, Time::from_millis(5)), &KeyFrameSampler)
            .unwrap();
        assert!(out.channel(0).iter().all(|s| *s == 0.0));
        assert_eq!(composer.duration(), Time::from_millis(110));
    }

    #[test]
    fn test_master_is_limited() {
        let mut composer = Composer::new(1000);
        composer.add_track(clip_track(0.9, 2, 0, 10));
        composer.add_track(clip_track(0.9, 2, 0, 10));
        let out = composer
            .render(TimeRange::new(Time::ZERO, Time::from_millis(5)), &KeyFrameSampler)
            .unwrap();
        for &s in out.channel(0) {
            assert!(s < 1.8 && s > 1.0, "{s}");
        }
    }
}
