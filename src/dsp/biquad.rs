//! Peaking-EQ biquad: coefficient design and per-channel filter history.
//!
//! Coefficients follow the RBJ audio-EQ cookbook and are normalized by `a0`.
//! They are plain `Copy` data so a whole band set can be published as an
//! immutable snapshot; the mutable delay line lives in [`BiquadState`].

use std::f64::consts::PI;

/// Highest center frequency as a fraction of the sample rate.
const MAX_CENTER_RATIO: f64 = 0.45;
const MIN_CENTER_HZ: f64 = 1.0;

/// Normalized direct-form coefficients of one second-order section.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// The pass-through section.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a peaking EQ section.
    ///
    /// `center_hz` is pulled below Nyquist for low sample rates so the
    /// section stays stable whatever stream it ends up wrapping.
    pub fn peaking(sample_rate: u32, center_hz: f32, q: f32, gain_db: f32) -> Self {
        let fs = f64::from(sample_rate.max(1));
        let f0 = clamp_center(f64::from(center_hz), fs);
        let q = f64::from(q).max(1e-3);

        let a = 10f64.powf(f64::from(gain_db) / 40.0);
        let w0 = 2.0 * PI * f0 / fs;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response in dB at `freq_hz`.
    pub fn magnitude_db(&self, sample_rate: u32, freq_hz: f32) -> f64 {
        let w = 2.0 * PI * f64::from(freq_hz) / f64::from(sample_rate.max(1));
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = (num_re * num_re + num_im * num_im).sqrt();
        let den = (den_re * den_re + den_im * den_im).sqrt();
        20.0 * (num / den).log10()
    }
}

fn clamp_center(f0: f64, fs: f64) -> f64 {
    let ceiling = (fs * MAX_CENTER_RATIO).max(MIN_CENTER_HZ);
    f0.clamp(MIN_CENTER_HZ, ceiling)
}

/// Direct form I delay line for one channel of one band.
#[derive(Debug, Default, Copy, Clone)]
pub struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    pub fn process(&mut self, c: &BiquadCoefficients, x: f64) -> f64 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        // Flush denormals so silence after a loud passage stays cheap.
        self.y1 = if y.abs() < 1e-30 { 0.0 } else { y };
        self.y1
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
