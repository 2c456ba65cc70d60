use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const SAMPLE_RATE_HZ: f64 = 100.0;
const RECORD_SECONDS: f64 = 30.0;
const IGNITION_S: f64 = 12.0;
const BURN_S: f64 = 8.0;

/// Smoothed burn profile: ramp up, slightly regressive plateau, tail-off.
fn burn_profile(t: f64, peak: f64) -> f64 {
    let since = t - IGNITION_S;
    if since < 0.0 || since > BURN_S + 1.0 {
        return 0.0;
    }
    let rise = 1.0 - (-since / 0.15).exp();
    let plateau = 1.0 - 0.08 * (since / BURN_S).min(1.0);
    let tail = if since > BURN_S {
        (-(since - BURN_S) / 0.2).exp()
    } else {
        1.0
    };
    peak * rise * plateau * tail
}

/// Deterministic noise source (xorshift64*).
struct Noise {
    state: u64,
}

impl Noise {
    fn new(seed: u64) -> Self {
        Noise {
            state: seed.max(1),
        }
    }

    fn next_f64(&mut self) -> f64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let bits = self.state.wrapping_mul(0x2545_f491_4f6c_dd1d);
        (bits >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

fn write_channel(path: &Path, rows: impl Iterator<Item = (f64, f64)>) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let mut count = 0;
    for (t, v) in rows {
        writeln!(out, "{t:.3},{v:.4}")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_run"));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut noise = Noise::new(42);
    let samples = (RECORD_SECONDS * SAMPLE_RATE_HZ) as usize;
    let times: Vec<f64> = (0..samples).map(|i| i as f64 / SAMPLE_RATE_HZ).collect();

    let channels: [(&str, f64, f64, f64); 3] = [
        // name, peak, noise std-dev, baseline
        ("Thrust", 550.0, 12.0, 0.0),
        ("ChamberPressure", 310.0, 6.0, 14.7),
        ("OxTankPressure", -120.0, 3.0, 650.0),
    ];

    for (name, peak, sigma, baseline) in channels {
        let path = dir.join(format!("{name}.csv"));
        let rows = times
            .iter()
            .map(|&t| (t, baseline + burn_profile(t, peak) + noise.gauss(sigma)))
            .collect::<Vec<_>>();
        let n = write_channel(&path, rows.into_iter())?;
        println!("Wrote {n} samples to {}", path.display());
    }

    // Countdown ticks every second; the ignition command carries flag 1.
    let marker = dir.join("t0.csv");
    let ticks = (0..RECORD_SECONDS as usize).map(|s| {
        let t = s as f64;
        (t, if t == IGNITION_S { 1.0 } else { 0.0 })
    });
    write_channel(&marker, ticks)?;
    println!("Wrote T0 marker (T0 = {IGNITION_S} s) to {}", marker.display());

    Ok(())
}
