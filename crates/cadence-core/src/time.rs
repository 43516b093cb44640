//! Timeline time values and half-open time ranges.
//!
//! [`Time`] is a signed count of nanoseconds. All arithmetic on it saturates
//! instead of overflowing: speed integration and long shifts routinely produce
//! values near the representable limits, and rendering must not abort on them.
//!
//! [`TimeRange`] is a `[start, start + duration)` interval. It is the unit of
//! demand in the render graph: a node is asked for exactly one range per call.

use core::fmt;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Signed timeline position or duration with nanosecond resolution.
///
/// # Example
///
/// ```rust
/// use cadence_core::Time;
///
/// let t = Time::from_secs_f64(0.5);
/// assert_eq!(t.to_frames(48000), 24000);
/// assert_eq!(Time::from_frames(24000, 48000), t);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    /// The zero time.
    pub const ZERO: Self = Self(0);
    /// The largest representable time.
    pub const MAX: Self = Self(i64::MAX);
    /// The smallest representable time.
    pub const MIN: Self = Self(i64::MIN);

    /// Creates a time from a nanosecond count.
    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Returns the raw nanosecond count.
    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Creates a time from whole milliseconds, saturating on overflow.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a time from whole seconds, saturating on overflow.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(NANOS_PER_SECOND))
    }

    /// Creates a time from fractional seconds.
    ///
    /// Out-of-range values saturate; NaN maps to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_nan() {
            return Self::ZERO;
        }
        let nanos = (secs * NANOS_PER_SECOND as f64).round();
        if nanos >= i64::MAX as f64 {
            Self::MAX
        } else if nanos <= i64::MIN as f64 {
            Self::MIN
        } else {
            Self(nanos as i64)
        }
    }

    /// Returns this time in fractional seconds.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND as f64
    }

    /// Returns the time of frame `frames` at `sample_rate`, rounded to the
    /// nearest nanosecond.
    pub fn from_frames(frames: i64, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        let nanos = div_round(
            i128::from(frames) * i128::from(NANOS_PER_SECOND),
            i128::from(sample_rate.max(1)),
        );
        Self(saturate(nanos))
    }

    /// Converts this time to a frame index at `sample_rate`, rounding half
    /// away from zero.
    pub fn to_frames(self, sample_rate: u32) -> i64 {
        let frames = div_round(
            i128::from(self.0) * i128::from(sample_rate),
            i128::from(NANOS_PER_SECOND),
        );
        saturate(frames)
    }

    /// Returns the exact (fractional) frame position of this time.
    #[inline]
    pub fn to_frames_f64(self, sample_rate: u32) -> f64 {
        self.as_secs_f64() * f64::from(sample_rate)
    }

    /// Checked addition. Returns `None` on overflow.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Saturating addition.
    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Scales this time by `factor`, saturating on overflow.
    pub fn mul_f64(self, factor: f64) -> Self {
        Self::from_secs_f64(self.as_secs_f64() * factor)
    }

    /// Returns true if this time is before zero.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns the larger of two times.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Returns the smaller of two times.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

/// Integer division rounding half away from zero.
fn div_round(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        (n - d / 2) / d
    }
}

fn saturate(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

impl Add for Time {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Time {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Time {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl SubAssign for Time {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Time {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// Half-open interval `[start, start + duration)` on a time axis.
///
/// The duration is never negative; constructors clamp negative durations to
/// zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: Time,
    duration: Time,
}

impl TimeRange {
    /// Creates a range from a start and a duration.
    pub fn new(start: Time, duration: Time) -> Self {
        debug_assert!(!duration.is_negative(), "TimeRange duration must be >= 0");
        Self {
            start,
            duration: duration.max(Time::ZERO),
        }
    }

    /// Creates a range from its two bounds. An `end` before `start` yields an
    /// empty range at `start`.
    pub fn from_bounds(start: Time, end: Time) -> Self {
        Self {
            start,
            duration: (end - start).max(Time::ZERO),
        }
    }

    /// Creates a range spanning `frames` frames starting at frame `start_frame`.
    pub fn from_frames(start_frame: i64, frames: usize, sample_rate: u32) -> Self {
        let end_frame = start_frame.saturating_add(frames as i64);
        Self::from_bounds(
            Time::from_frames(start_frame, sample_rate),
            Time::from_frames(end_frame, sample_rate),
        )
    }

    /// Creates a range from fractional seconds.
    pub fn from_secs_f64(start: f64, duration: f64) -> Self {
        Self::new(Time::from_secs_f64(start), Time::from_secs_f64(duration.max(0.0)))
    }

    /// Start of the range.
    #[inline]
    pub fn start(&self) -> Time {
        self.start
    }

    /// Length of the range.
    #[inline]
    pub fn duration(&self) -> Time {
        self.duration
    }

    /// Exclusive end of the range.
    #[inline]
    pub fn end(&self) -> Time {
        self.start + self.duration
    }

    /// Returns true if the range has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.duration == Time::ZERO
    }

    /// Returns true if `time` lies inside the range.
    #[inline]
    pub fn contains(&self, time: Time) -> bool {
        time >= self.start && time < self.end()
    }

    /// Returns true if [`intersect`](Self::intersect) would succeed.
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.intersect(other).is_some()
    }

    /// Intersection of two ranges.
    ///
    /// Returns `None` when the ranges are disjoint (touching counts as
    /// disjoint). An empty range intersects a range that contains its start.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        if end > start {
            Some(Self::from_bounds(start, end))
        } else if self.is_empty() && other.contains(self.start) {
            Some(*self)
        } else {
            None
        }
    }

    /// Translates the range forward by `delta`.
    #[inline]
    pub fn add_start(&self, delta: Time) -> Self {
        Self {
            start: self.start + delta,
            duration: self.duration,
        }
    }

    /// Translates the range backward by `delta`.
    #[inline]
    pub fn subtract_start(&self, delta: Time) -> Self {
        Self {
            start: self.start - delta,
            duration: self.duration,
        }
    }

    /// Returns the range with the same start and a new duration.
    #[inline]
    pub fn with_duration(&self, duration: Time) -> Self {
        Self::new(self.start, duration)
    }

    /// Returns the range with the same duration and a new start.
    #[inline]
    pub fn with_start(&self, start: Time) -> Self {
        Self {
            start,
            duration: self.duration,
        }
    }

    /// Number of frames this range spans at `sample_rate`.
    #[inline]
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        self.duration.to_frames(sample_rate).max(0) as usize
    }

    /// Index of the first frame of this range at `sample_rate`.
    #[inline]
    pub fn start_frame(&self, sample_rate: u32) -> i64 {
        self.start.to_frames(sample_rate)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversions_round_trip() {
        for rate in [8000, 22050, 44100, 48000, 96000] {
            for frame in [0_i64, 1, 7, 441, 44_099, 1_000_003, -5] {
                let t = Time::from_frames(frame, rate);
                assert_eq!(t.to_frames(rate), frame, "rate {rate} frame {frame}");
            }
        }
    }

    #[test]
    fn test_frame_ranges_have_exact_counts() {
        let range = TimeRange::from_frames(12_345, 1000, 44100);
        assert_eq!(range.sample_count(44100), 1000);
        assert_eq!(range.start_frame(44100), 12_345);
    }

    #[test]
    fn test_arithmetic_saturates() {
        assert_eq!(Time::MAX + Time::from_secs(1), Time::MAX);
        assert_eq!(Time::MIN - Time::from_secs(1), Time::MIN);
        assert_eq!(Time::from_secs_f64(f64::INFINITY), Time::MAX);
        assert_eq!(Time::from_secs_f64(f64::NAN), Time::ZERO);
        assert!(Time::MAX.checked_add(Time::from_nanos(1)).is_none());
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = TimeRange::from_secs_f64(0.0, 2.0);
        let b = TimeRange::from_secs_f64(1.0, 2.0);
        let c = a.intersect(&b).unwrap();
        assert_eq!(c, TimeRange::from_secs_f64(1.0, 1.0));
    }

    #[test]
    fn test_intersect_disjoint_and_touching() {
        let a = TimeRange::from_secs_f64(0.0, 1.0);
        let b = TimeRange::from_secs_f64(1.0, 1.0);
        let c = TimeRange::from_secs_f64(5.0, 1.0);
        assert!(a.intersect(&b).is_none());
        assert!(a.intersect(&c).is_none());
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_empty_range_inside_intersects() {
        let point = TimeRange::new(Time::from_millis(500), Time::ZERO);
        let clip = TimeRange::from_secs_f64(0.0, 1.0);
        assert_eq!(point.intersect(&clip), Some(point));
    }

    #[test]
    fn test_translation_keeps_duration() {
        let r = TimeRange::from_secs_f64(1.0, 0.5);
        let shifted = r.add_start(Time::from_secs(2));
        assert_eq!(shifted.start(), Time::from_secs(3));
        assert_eq!(shifted.duration(), r.duration());
        assert_eq!(shifted.subtract_start(Time::from_secs(2)), r);
    }

    #[test]
    fn test_from_bounds_clamps_reversed() {
        let r = TimeRange::from_bounds(Time::from_secs(2), Time::from_secs(1));
        assert!(r.is_empty());
        assert_eq!(r.start(), Time::from_secs(2));
    }
}
