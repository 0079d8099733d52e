//! Procedural height field
//!
//! A wrapping grid of correlated noise. Point queries truncate, wrap and
//! look up a stored sample, so the landscape tiles infinitely and any two
//! callers sampling the same integer cell agree exactly.

use std::f32::consts::PI;

use rand::Rng;
use rand_distr::StandardNormal;

/// Guards the rescale against a perfectly flat field
const STD_EPSILON: f32 = 1e-7;

/// Gaussian kernel is cut off at this many sigmas
const KERNEL_TRUNCATE: f32 = 4.0;

/// Surface class derived from height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biome {
    Mud,
    Sand,
    Grass,
    Rock,
    /// Terminal high ground enemies will not act on
    Snow,
}

impl Biome {
    /// Classify a height (lower bounds inclusive)
    pub fn from_height(h: f32) -> Self {
        if h < 1.0 {
            Biome::Mud
        } else if h < 3.0 {
            Biome::Sand
        } else if h < 7.0 {
            Biome::Grass
        } else if h < 10.0 {
            Biome::Rock
        } else {
            Biome::Snow
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            Biome::Mud => [0.6, 0.3, 0.2],
            Biome::Sand => [0.9, 0.8, 0.5],
            Biome::Grass => [0.2, 0.8, 0.2],
            Biome::Rock => [0.5, 0.5, 0.5],
            Biome::Snow => [1.0, 1.0, 1.0],
        }
    }

    /// Enemies standing here do nothing but fall
    #[inline]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Biome::Snow)
    }
}

/// Wrapping elevation grid
#[derive(Debug, Clone)]
pub struct HeightField {
    width: usize,
    depth: usize,
    /// Row-major by X: `samples[x * depth + z]`
    samples: Vec<f32>,
}

impl HeightField {
    /// Synthesize a field: unit-normal noise, optional ridge oscillation,
    /// periodic Gaussian blur, then rescale to `amplitude` standard deviation.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        depth: usize,
        correlation_length: f32,
        amplitude: f32,
        ridges: bool,
        rng: &mut R,
    ) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);

        let mut samples: Vec<f32> = (0..width * depth)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();

        if ridges {
            let weight = amplitude * 0.5;
            for x in 0..width {
                let sx = linspace_at(x, width, 4.0 * PI).sin();
                for z in 0..depth {
                    let cz = linspace_at(z, depth, 4.0 * PI).cos();
                    samples[x * depth + z] += sx * cz * weight;
                }
            }
        }

        gaussian_blur(&mut samples, width, depth, correlation_length);

        let std = std_dev(&samples);
        let scale = amplitude / (std + STD_EPSILON);
        for s in &mut samples {
            *s *= scale;
        }

        log::debug!(
            "Generated {}x{} height field (sigma {}, amplitude {})",
            width,
            depth,
            correlation_length,
            amplitude
        );

        Self {
            width,
            depth,
            samples,
        }
    }

    /// Build a field from explicit samples (`samples[x * depth + z]`).
    ///
    /// Returns `None` if the sample count does not match the dimensions.
    pub fn from_samples(width: usize, depth: usize, samples: Vec<f32>) -> Option<Self> {
        if width == 0 || depth == 0 || samples.len() != width * depth {
            return None;
        }
        Some(Self {
            width,
            depth,
            samples,
        })
    }

    /// A constant-height field
    pub fn flat(width: usize, depth: usize, height: f32) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);
        Self {
            width,
            depth,
            samples: vec![height; width * depth],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Sample standard deviation of the whole grid
    pub fn sample_std(&self) -> f32 {
        std_dev(&self.samples)
    }

    /// Stored height of the cell containing `(x, z)`.
    ///
    /// Truncates toward zero and wraps. Never fails: non-finite input
    /// yields 0.
    #[inline]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        if !x.is_finite() || !z.is_finite() {
            return 0.0;
        }
        // `as` saturates, so absurd magnitudes still land on a valid cell
        let ix = (x.trunc() as i64).rem_euclid(self.width as i64) as usize;
        let iz = (z.trunc() as i64).rem_euclid(self.depth as i64) as usize;
        self.samples
            .get(ix * self.depth + iz)
            .copied()
            .unwrap_or(0.0)
    }

    /// Biome of the cell containing `(x, z)`
    #[inline]
    pub fn biome_at(&self, x: f32, z: f32) -> Biome {
        Biome::from_height(self.height(x, z))
    }
}

/// Value `i` of `n` evenly spaced points over `[0, end]` (inclusive)
fn linspace_at(i: usize, n: usize, end: f32) -> f32 {
    if n <= 1 {
        0.0
    } else {
        end * i as f32 / (n - 1) as f32
    }
}

fn std_dev(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| {
            let d = s as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var.sqrt() as f32
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (KERNEL_TRUNCATE * sigma + 0.5) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f32 / sigma).powi(2)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable blur with periodic boundaries, in place
fn gaussian_blur(samples: &mut [f32], width: usize, depth: usize, sigma: f32) {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let mut scratch = vec![0.0; samples.len()];

    // Along Z
    for x in 0..width {
        for z in 0..depth {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let zz = (z as i64 + k as i64 - radius).rem_euclid(depth as i64) as usize;
                acc += samples[x * depth + zz] * w;
            }
            scratch[x * depth + z] = acc;
        }
    }

    // Along X
    for x in 0..width {
        for z in 0..depth {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let xx = (x as i64 + k as i64 - radius).rem_euclid(width as i64) as usize;
                acc += scratch[xx * depth + z] * w;
            }
            samples[x * depth + z] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn field(seed: u64) -> HeightField {
        let mut rng = Pcg32::seed_from_u64(seed);
        HeightField::generate(64, 64, 4.0, 8.0, true, &mut rng)
    }

    #[test]
    fn test_rescaled_to_amplitude() {
        let f = field(7);
        assert!((f.sample_std() - 8.0).abs() < 0.01, "std {}", f.sample_std());
    }

    #[test]
    fn test_rescaled_without_ridges() {
        let mut rng = Pcg32::seed_from_u64(3);
        let f = HeightField::generate(32, 48, 2.0, 5.0, false, &mut rng);
        assert_eq!(f.width(), 32);
        assert_eq!(f.depth(), 48);
        assert!((f.sample_std() - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_smoothing_correlates_neighbors() {
        let f = field(11);
        // Neighboring cells of a sigma-4 blur differ far less than the relief
        let mut max_step: f32 = 0.0;
        for x in 0..64 {
            for z in 0..64 {
                let h = f.height(x as f32, z as f32);
                let hx = f.height((x + 1) as f32, z as f32);
                max_step = max_step.max((h - hx).abs());
            }
        }
        assert!(max_step < 8.0, "max neighbor step {max_step}");
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = field(42);
        let b = field(42);
        for x in 0..64 {
            assert_eq!(a.height(x as f32, 5.0), b.height(x as f32, 5.0));
        }
    }

    #[test]
    fn test_height_truncates_toward_zero() {
        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let f = HeightField::from_samples(4, 4, samples).unwrap();
        assert_eq!(f.height(1.9, 2.9), f.height(1.0, 2.0));
        assert_eq!(f.height(1.0, 2.0), 6.0);
        // -0.5 truncates to 0, -1.5 truncates to -1 which wraps to 3
        assert_eq!(f.height(-0.5, 0.0), f.height(0.0, 0.0));
        assert_eq!(f.height(-1.5, 0.0), f.height(3.0, 0.0));
    }

    #[test]
    fn test_negative_fractions_do_not_wrap_by_period() {
        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let f = HeightField::from_samples(4, 4, samples).unwrap();
        // (-1, 0) is a whole cell wide after truncation, so shifting by the
        // field size lands one cell over
        assert_eq!(f.height(-0.5, 0.0), 0.0);
        assert_eq!(f.height(3.5, 4.0), 12.0);
    }

    #[test]
    fn test_non_finite_queries_return_zero() {
        let f = HeightField::flat(8, 8, 4.0);
        assert_eq!(f.height(f32::NAN, 1.0), 0.0);
        assert_eq!(f.height(1.0, f32::INFINITY), 0.0);
        assert_eq!(f.height(f32::NEG_INFINITY, f32::NAN), 0.0);
        assert_eq!(f.height(1.0e30, -1.0e30), 4.0);
    }

    #[test]
    fn test_from_samples_rejects_bad_shape() {
        assert!(HeightField::from_samples(4, 4, vec![0.0; 15]).is_none());
        assert!(HeightField::from_samples(0, 4, Vec::new()).is_none());
    }

    #[test]
    fn test_biome_table() {
        assert_eq!(Biome::from_height(-3.0), Biome::Mud);
        assert_eq!(Biome::from_height(0.99), Biome::Mud);
        assert_eq!(Biome::from_height(1.0), Biome::Sand);
        assert_eq!(Biome::from_height(3.0), Biome::Grass);
        assert_eq!(Biome::from_height(7.0), Biome::Rock);
        assert_eq!(Biome::from_height(9.99), Biome::Rock);
        assert_eq!(Biome::from_height(10.0), Biome::Snow);
        assert_eq!(Biome::Snow.color(), [1.0, 1.0, 1.0]);
        assert!(Biome::Snow.is_unreachable());
        assert!(!Biome::Rock.is_unreachable());
    }

    proptest! {
        #[test]
        fn prop_height_wraps(x in -5000.0f32..5000.0, z in -5000.0f32..5000.0) {
            let f = field(1);
            let w = f.width() as f32;
            let d = f.depth() as f32;
            // Holds for whole-number coordinates only. Truncation toward zero
            // maps all of (-1, 1) to cell 0, so a negative fraction and the
            // same point shifted by the field size land in different cells.
            let (x, z) = (x.trunc(), z.trunc());
            prop_assert_eq!(f.height(x, z), f.height(x + w, z + d));
        }

        #[test]
        fn prop_height_is_finite(x in proptest::num::f32::ANY, z in proptest::num::f32::ANY) {
            let f = field(2);
            prop_assert!(f.height(x, z).is_finite());
        }
    }
}
