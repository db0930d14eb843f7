//! Write a directory of synthetic spectral text files for trying out the merge.
//!
//! Usage: `generate_sample [OUTPUT_DIR]` (default `sample_spectra`).

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_spectrum(
    wavelengths: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// European-style number: `,` as decimal point.
fn eu(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}").replace('.', ",")
}

/// One file in the instrument's export layout.
fn render_file(
    sample: &str,
    title: &str,
    operator: &str,
    x: &[f64],
    y: &[f64],
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "TITLE;{title}")?;
    writeln!(out, "Sample Name;{sample}")?;
    writeln!(out, "Instrument;UV-Vis 2600")?;
    writeln!(out, "X Units/Y Units;nm/Abs")?;
    writeln!(out, "XYDATA;")?;
    for (&xi, &yi) in x.iter().zip(y) {
        writeln!(out, "{};{}", eu(xi, 1), eu(yi, 5))?;
    }
    writeln!(out, "##### Extended Information")?;
    writeln!(out, "Operator;{operator}")?;
    writeln!(out, "Measured;2024-03-18 10:42")?;
    Ok(out)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_spectra".to_string());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // Two instruments: 400 → 700 nm at 1 nm, 450 → 650 nm at 0.5 nm.
    let coarse: Vec<f64> = (0..=300).map(|i| 400.0 + i as f64).collect();
    let fine: Vec<f64> = (0..=400).map(|i| 450.0 + i as f64 * 0.5).collect();

    let samples: [(&str, &str, &[f64], Vec<(f64, f64, f64)>); 4] = [
        ("dye_a_01", "Dye A", &coarse, vec![(520.0, 25.0, 0.9), (610.0, 18.0, 0.3)]),
        ("dye_a_02", "Dye A", &fine, vec![(521.0, 24.0, 0.85), (611.0, 18.0, 0.28)]),
        ("dye_b_01", "Dye B", &coarse, vec![(450.0, 30.0, 0.6), (580.0, 22.0, 0.7)]),
        ("blank", "", &fine, vec![]),
    ];
    let operators = ["Jane Doe", "Max Mustermann"];

    for (i, (name, title, grid, peaks)) in samples.iter().enumerate() {
        let y = generate_spectrum(grid, peaks, 0.002, &mut rng);
        let content = render_file(name, title, operators[i % operators.len()], grid, &y)
            .context("rendering sample file")?;
        write_file(out_dir, &format!("{name}.csv"), &content)?;
    }

    // A file that is skipped by the merge: no XYDATA marker.
    write_file(out_dir, "notes.csv", "Comment;calibration notes only\nLamp;D2\n")?;

    println!(
        "Wrote {} spectra (+1 file without data) to {}",
        samples.len(),
        out_dir.display()
    );
    Ok(())
}
