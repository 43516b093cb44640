//! Biquad (bi-quadratic) filter structure and RBJ cookbook coefficients.
//!
//! The equalizer cascades one [`Biquad`] per band and channel. Coefficients
//! come from [`FilterType::coefficients`], which dispatches to the individual
//! RBJ Audio EQ Cookbook formulas below.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Unnormalized biquad coefficients `(b0, b1, b2, a0, a1, a2)`.
pub type Coefficients = (f32, f32, f32, f32, f32, f32);

/// Second-order IIR section.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`. Filter state is kept so
    /// coefficients can change between samples.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        let (b0, b1, b2, a0, a1, a2) = coefficients;
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::math::flush_denormal(output);

        output
    }

    /// Processes a block in place.
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for sample in samples {
            *sample = self.process(*sample);
        }
    }

    /// Clears the filter history, keeping the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Equalizer band shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Bell boost/cut around the center frequency.
    #[default]
    Peak,
    /// Shelf boost/cut below the corner frequency.
    LowShelf,
    /// Shelf boost/cut above the corner frequency.
    HighShelf,
    /// 12 dB/oct low-pass. Gain is ignored.
    LowPass,
    /// 12 dB/oct high-pass. Gain is ignored.
    HighPass,
    /// Constant 0 dB peak band-pass. Gain is ignored.
    BandPass,
    /// Band reject. Gain is ignored.
    Notch,
}

impl FilterType {
    /// Lowest accepted band frequency in Hz.
    pub const MIN_FREQUENCY: f32 = 10.0;
    /// Lowest accepted Q.
    pub const MIN_Q: f32 = 0.1;

    /// Coefficients for this shape.
    ///
    /// `frequency` is clamped to `[10 Hz, 0.49 * sample_rate]` and `q` to at
    /// least 0.1, so animated parameters can never produce an unstable or
    /// undefined filter.
    pub fn coefficients(self, frequency: f32, gain_db: f32, q: f32, sample_rate: f32) -> Coefficients {
        let frequency = clamp_frequency(frequency, sample_rate);
        let q = if q.is_finite() { q.max(Self::MIN_Q) } else { Self::MIN_Q };
        let gain_db = if gain_db.is_finite() { gain_db.clamp(-60.0, 60.0) } else { 0.0 };
        match self {
            FilterType::Peak => peaking_eq_coefficients(frequency, q, gain_db, sample_rate),
            FilterType::LowShelf => low_shelf_coefficients(frequency, q, gain_db, sample_rate),
            FilterType::HighShelf => high_shelf_coefficients(frequency, q, gain_db, sample_rate),
            FilterType::LowPass => lowpass_coefficients(frequency, q, sample_rate),
            FilterType::HighPass => highpass_coefficients(frequency, q, sample_rate),
            FilterType::BandPass => bandpass_coefficients(frequency, q, sample_rate),
            FilterType::Notch => notch_coefficients(frequency, q, sample_rate),
        }
    }

    /// Short lowercase name, as used in project files.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Peak => "peak",
            FilterType::LowShelf => "low_shelf",
            FilterType::HighShelf => "high_shelf",
            FilterType::LowPass => "low_pass",
            FilterType::HighPass => "high_pass",
            FilterType::BandPass => "band_pass",
            FilterType::Notch => "notch",
        }
    }
}

fn clamp_frequency(frequency: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * 0.49).max(FilterType::MIN_FREQUENCY);
    if frequency.is_finite() {
        frequency.clamp(FilterType::MIN_FREQUENCY, max)
    } else {
        max
    }
}

/// Low-pass filter coefficients (RBJ cookbook).
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// High-pass filter coefficients (RBJ cookbook).
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    (b0, b1, b2, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Band-pass coefficients with constant 0 dB peak gain (RBJ cookbook).
pub fn bandpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Notch (band-reject) coefficients (RBJ cookbook).
pub fn notch_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (1.0, -2.0 * cos_omega, 1.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Peaking EQ coefficients (RBJ cookbook).
///
/// Boosts or cuts `gain_db` around `frequency` with bandwidth `frequency / q`.
pub fn peaking_eq_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (
        1.0 + alpha * a,
        -2.0 * cos_omega,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_omega,
        1.0 - alpha / a,
    )
}

/// Low shelf coefficients (RBJ cookbook, Q form).
pub fn low_shelf_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    (
        a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega),
        a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega),
        (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

/// High shelf coefficients (RBJ cookbook, Q form).
pub fn high_shelf_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    (
        a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha),
        -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega),
        a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha),
        (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha,
        2.0 * ((a - 1.0) - (a + 1.0) * cos_omega),
        (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(filter: &mut Biquad, input: f32) -> f32 {
        let mut output = 0.0;
        for _ in 0..4000 {
            output = filter.process(input);
        }
        output
    }

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 0.0001);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::new();
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.y1, 0.0);
    }

    #[test]
    fn test_every_type_is_finite_and_stable() {
        let types = [
            FilterType::Peak,
            FilterType::LowShelf,
            FilterType::HighShelf,
            FilterType::LowPass,
            FilterType::HighPass,
            FilterType::BandPass,
            FilterType::Notch,
        ];
        for ty in types {
            let mut filter = Biquad::new();
            filter.set_coefficients(ty.coefficients(1000.0, 6.0, 0.707, 48000.0));
            let out = settle(&mut filter, 1.0);
            assert!(out.is_finite(), "{ty:?} diverged");
            assert!(out.abs() < 4.0, "{ty:?} unstable: {out}");
        }
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = Biquad::new();
        filter.set_coefficients(FilterType::LowPass.coefficients(1000.0, 0.0, 0.707, 44100.0));
        assert!((settle(&mut filter, 1.0) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new();
        filter.set_coefficients(FilterType::HighPass.coefficients(1000.0, 0.0, 0.707, 44100.0));
        assert!(settle(&mut filter, 1.0).abs() < 0.01);
    }

    #[test]
    fn test_low_shelf_dc_gain_matches_db() {
        let mut filter = Biquad::new();
        filter.set_coefficients(FilterType::LowShelf.coefficients(200.0, 6.0, 0.707, 48000.0));
        let expected = crate::math::db_to_linear(6.0);
        assert!((settle(&mut filter, 1.0) - expected).abs() < 0.05);
    }

    #[test]
    fn test_high_shelf_leaves_dc() {
        let mut filter = Biquad::new();
        filter.set_coefficients(FilterType::HighShelf.coefficients(4000.0, 6.0, 0.707, 48000.0));
        assert!((settle(&mut filter, 1.0) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_peak_unity_at_zero_gain() {
        let mut filter = Biquad::new();
        filter.set_coefficients(FilterType::Peak.coefficients(1000.0, 0.0, 1.0, 44100.0));
        assert!((settle(&mut filter, 1.0) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_parameters_are_clamped() {
        let (b0, b1, b2, a0, a1, a2) = FilterType::Peak.coefficients(f32::INFINITY, f32::NAN, -3.0, 48000.0);
        for c in [b0, b1, b2, a0, a1, a2] {
            assert!(c.is_finite());
        }
        let high = FilterType::LowPass.coefficients(100_000.0, 0.0, 0.7, 48000.0);
        let at_limit = FilterType::LowPass.coefficients(48000.0 * 0.49, 0.0, 0.7, 48000.0);
        assert_eq!(high, at_limit);
    }
}
