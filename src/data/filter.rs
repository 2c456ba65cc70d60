use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FilterError – parameters that cannot produce a filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("filter order must be at least 1, got {order}")]
    InvalidOrder { order: usize },

    #[error("cutoff must lie strictly between 0 and 1 (fraction of Nyquist), got {cutoff}")]
    InvalidCutoff { cutoff: f64 },

    #[error("moving-average window {interval} is outside [1, {len}]")]
    InvalidInterval { interval: usize, len: usize },
}

// ---------------------------------------------------------------------------
// Low-pass parameters
// ---------------------------------------------------------------------------

/// Butterworth low-pass settings as they appear in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowPass {
    pub order: usize,
    /// Normalized to half the sampling rate.
    pub cutoff: f64,
}

impl LowPass {
    /// Design the filter and run it forward and backward over `y`.
    pub fn apply(&self, y: &[f64]) -> Result<Vec<f64>, FilterError> {
        lowpass_zero_phase(y, self.order, self.cutoff)
    }
}

// ---------------------------------------------------------------------------
// Butterworth design
// ---------------------------------------------------------------------------

/// Transfer-function coefficients of a digital Butterworth low-pass.
///
/// `a[0]` is always 1. The coefficients are immutable once designed.
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl Butterworth {
    /// Design an `order`-pole low-pass with `cutoff` in (0, 1).
    ///
    /// Analog prototype poles are pre-warped to the cutoff and mapped to the
    /// z-plane with the bilinear transform (sampling rate normalized to 2).
    pub fn low_pass(order: usize, cutoff: f64) -> Result<Self, FilterError> {
        if order == 0 {
            return Err(FilterError::InvalidOrder { order });
        }
        if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= 1.0 {
            return Err(FilterError::InvalidCutoff { cutoff });
        }

        let n = order as f64;
        let fs2 = 4.0;
        let warped = fs2 * (PI * cutoff / 2.0).tan();

        let analog: Vec<Complex64> = (0..order)
            .map(|k| {
                let m = 2.0 * k as f64 - n + 1.0;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n)) * warped
            })
            .collect();

        let digital: Vec<Complex64> = analog.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        let denom: Complex64 = analog.iter().map(|&p| fs2 - p).product();
        let gain = warped.powi(order as i32) / denom.re;

        // All zeros sit at z = -1, so the numerator is gain * (z + 1)^order.
        let b = binomial_row(order).into_iter().map(|c| c * gain).collect();
        let a = poly(&digital).into_iter().map(|c| c.re).collect();

        Ok(Butterworth { b, a })
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Zero-phase application: filter forward, then backward.
    ///
    /// The signal is extended at both ends by odd reflection and each pass
    /// starts from the steady-state response to its first sample, which keeps
    /// edge transients small. The output always has `y.len()` samples.
    pub fn filtfilt(&self, y: &[f64]) -> Vec<f64> {
        let n = y.len();
        if n == 0 {
            return Vec::new();
        }
        let padlen = (3 * self.a.len().max(self.b.len())).min(n - 1);

        let first = y[0];
        let last = y[n - 1];
        let mut ext = Vec::with_capacity(n + 2 * padlen);
        ext.extend((1..=padlen).rev().map(|i| 2.0 * first - y[i]));
        ext.extend_from_slice(y);
        ext.extend((n - 1 - padlen..n - 1).rev().map(|i| 2.0 * last - y[i]));

        let zi = self.steady_state();

        let x0 = ext[0];
        let forward = self.lfilter(&ext, zi.iter().map(|z| z * x0).collect());

        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        let y0 = reversed[0];
        reversed = self.lfilter(&reversed, zi.iter().map(|z| z * y0).collect());
        reversed.reverse();

        reversed[padlen..padlen + n].to_vec()
    }

    /// Direct form II transposed with initial state `z`.
    fn lfilter(&self, x: &[f64], mut z: Vec<f64>) -> Vec<f64> {
        let (b, a) = (&self.b, &self.a);
        let order = a.len() - 1;
        x.iter()
            .map(|&xi| {
                let yi = b[0] * xi + z[0];
                for i in 0..order - 1 {
                    z[i] = b[i + 1] * xi - a[i + 1] * yi + z[i + 1];
                }
                z[order - 1] = b[order] * xi - a[order] * yi;
                yi
            })
            .collect()
    }

    /// Filter state after an infinitely long unit-step input.
    fn steady_state(&self) -> Vec<f64> {
        let (b, a) = (&self.b, &self.a);
        let dc = b.iter().sum::<f64>() / a.iter().sum::<f64>();
        let mut zi = vec![0.0; a.len() - 1];
        let mut acc = 0.0;
        for k in (1..a.len()).rev() {
            acc += b[k] - a[k] * dc;
            zi[k - 1] = acc;
        }
        zi
    }
}

/// Coefficients of the monic polynomial with the given roots, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        coeffs.push(Complex64::new(0.0, 0.0));
        for j in (1..coeffs.len()).rev() {
            let prev = coeffs[j - 1];
            coeffs[j] -= r * prev;
        }
    }
    coeffs
}

fn binomial_row(n: usize) -> Vec<f64> {
    let mut row = vec![1.0];
    for k in 0..n {
        let next = row[k] * (n - k) as f64 / (k + 1) as f64;
        row.push(next);
    }
    row
}

// ---------------------------------------------------------------------------
// Stateless transforms
// ---------------------------------------------------------------------------

/// Butterworth low-pass applied forward and backward (no phase shift).
pub fn lowpass_zero_phase(y: &[f64], order: usize, cutoff: f64) -> Result<Vec<f64>, FilterError> {
    Ok(Butterworth::low_pass(order, cutoff)?.filtfilt(y))
}

/// Trailing moving average over `interval` samples.
///
/// Position `i` of the output is the mean of `y[i..i + interval]`, i.e. the
/// window ending at input sample `i + interval - 1`. Positions without a full
/// window are dropped, so the output has `y.len() - interval + 1` samples.
pub fn moving_average(y: &[f64], interval: usize) -> Result<Vec<f64>, FilterError> {
    if interval == 0 || interval > y.len() {
        return Err(FilterError::InvalidInterval {
            interval,
            len: y.len(),
        });
    }
    if interval == 1 {
        return Ok(y.to_vec());
    }

    let mut prefix = Vec::with_capacity(y.len() + 1);
    prefix.push(0.0);
    let mut running = 0.0;
    for &v in y {
        running += v;
        prefix.push(running);
    }

    let width = interval as f64;
    Ok(prefix
        .windows(interval + 1)
        .map(|w| (w[interval] - w[0]) / width)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < tol, "index {i}: {a} vs {e}");
        }
    }

    fn noisy_ramp(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| i as f64 * 0.1 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect()
    }

    #[test]
    fn first_order_half_band_coefficients() {
        let f = Butterworth::low_pass(1, 0.5).unwrap();
        assert_close(f.b(), &[0.5, 0.5], 1e-12);
        assert_close(f.a(), &[1.0, 0.0], 1e-12);
    }

    #[test]
    fn second_order_half_band_coefficients() {
        let f = Butterworth::low_pass(2, 0.5).unwrap();
        assert_close(f.b(), &[0.292_893_22, 0.585_786_44, 0.292_893_22], 1e-7);
        assert_close(f.a(), &[1.0, 0.0, 0.171_572_88], 1e-7);
    }

    #[test]
    fn unity_gain_at_dc() {
        for order in 1..=6 {
            for &cutoff in &[0.05, 0.2, 0.7] {
                let f = Butterworth::low_pass(order, cutoff).unwrap();
                let gain = f.b().iter().sum::<f64>() / f.a().iter().sum::<f64>();
                assert!((gain - 1.0).abs() < 1e-9, "order {order}, cutoff {cutoff}: {gain}");
            }
        }
    }

    #[test]
    fn zero_phase_preserves_length() {
        for n in [1, 2, 5, 12, 200] {
            let y = noisy_ramp(n);
            let out = lowpass_zero_phase(&y, 4, 0.1).unwrap();
            assert_eq!(out.len(), n);
        }
        assert!(lowpass_zero_phase(&[], 2, 0.3).unwrap().is_empty());
    }

    #[test]
    fn constant_signal_passes_through() {
        let y = vec![7.5; 64];
        let out = lowpass_zero_phase(&y, 3, 0.2).unwrap();
        assert_close(&out, &y, 1e-9);
    }

    #[test]
    fn alternating_noise_is_attenuated() {
        let y = noisy_ramp(400);
        let out = lowpass_zero_phase(&y, 4, 0.1).unwrap();
        // Compare against the clean ramp away from the edges.
        for i in 50..350 {
            let clean = i as f64 * 0.1;
            assert!((out[i] - clean).abs() < 0.01, "sample {i}: {}", out[i]);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            Butterworth::low_pass(0, 0.5).unwrap_err(),
            FilterError::InvalidOrder { order: 0 }
        );
        for cutoff in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                Butterworth::low_pass(2, cutoff),
                Err(FilterError::InvalidCutoff { .. })
            ));
        }
    }

    #[test]
    fn moving_average_length_and_values() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = moving_average(&y, 3).unwrap();
        assert_eq!(out.len(), y.len() - 3 + 1);
        assert_close(&out, &[2.0, 3.0, 4.0, 5.0], 1e-12);

        let whole = moving_average(&y, 6).unwrap();
        assert_close(&whole, &[3.5], 1e-12);
    }

    #[test]
    fn moving_average_window_of_one_is_identity() {
        let y = [0.1, 0.2, 0.30000000000000004, -4.0];
        assert_eq!(moving_average(&y, 1).unwrap(), y.to_vec());
    }

    #[test]
    fn moving_average_rejects_bad_windows() {
        let y = [1.0, 2.0];
        assert_eq!(
            moving_average(&y, 3).unwrap_err(),
            FilterError::InvalidInterval { interval: 3, len: 2 }
        );
        assert!(moving_average(&y, 0).is_err());
        assert!(moving_average(&[], 1).is_err());
    }
}
