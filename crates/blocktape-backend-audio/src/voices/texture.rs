//! Vinyl crackle and hiss.

use rand::Rng;

use crate::rng::{component_rng, hash_noise};
use blocktape_spec::hash::derive_component_seed;

/// Mean gap between crackles in seconds.
const MEAN_GAP_SECONDS: f64 = 0.09;
/// Crackle burst length in seconds.
const BURST_SECONDS: f64 = 0.004;
const HISS_LEVEL: f64 = 0.035;

/// One crackle burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crackle {
    /// First frame of the burst.
    pub frame: u64,
    pub amplitude: f64,
    /// Decay rate per frame.
    pub decay: f64,
}

/// Precomputed crackle schedule plus stateless hiss.
#[derive(Debug, Clone)]
pub struct VinylTexture {
    crackles: Vec<Crackle>,
    burst_frames: u64,
    noise_seed: u32,
}

impl VinylTexture {
    /// Schedules crackles for `num_frames` frames with randomized gaps
    /// drawn from the track seed.
    pub fn new(track_seed: &str, num_frames: u64, sample_rate: u32) -> Self {
        let mut rng = component_rng(track_seed, "vinyl");
        let sr = sample_rate as f64;
        let mut crackles = Vec::new();
        let mut frame = 0.0;

        loop {
            // Exponential inter-arrival times.
            let u: f64 = rng.gen_range(1e-6..1.0);
            frame += -u.ln() * MEAN_GAP_SECONDS * sr;
            if frame >= num_frames as f64 {
                break;
            }
            let loud = rng.gen_bool(0.08);
            crackles.push(Crackle {
                frame: frame as u64,
                amplitude: if loud {
                    rng.gen_range(0.5..1.0)
                } else {
                    rng.gen_range(0.08..0.35)
                },
                decay: rng.gen_range(0.02..0.08),
            });
        }

        Self {
            crackles,
            burst_frames: (BURST_SECONDS * sr).ceil() as u64,
            noise_seed: derive_component_seed(track_seed, "hiss"),
        }
    }

    /// Number of scheduled crackles.
    pub fn crackle_count(&self) -> usize {
        self.crackles.len()
    }

    /// Texture sample at a frame.
    pub fn sample(&self, index: u64) -> f64 {
        let n0 = hash_noise(self.noise_seed, index);
        let n1 = hash_noise(self.noise_seed, index.wrapping_sub(1));
        let n2 = hash_noise(self.noise_seed, index.wrapping_sub(2));
        // Three-tap average keeps the hiss soft.
        let hiss = HISS_LEVEL * (n0 + n1 + n2) / 3.0;

        let first_active = index.saturating_sub(self.burst_frames);
        let start = self.crackles.partition_point(|c| c.frame < first_active);
        let mut crackle = 0.0;
        for c in self.crackles[start..].iter().take_while(|c| c.frame <= index) {
            let age = (index - c.frame) as f64;
            // Band-limited burst: differenced noise under a fast decay.
            crackle += c.amplitude * (-age * c.decay).exp() * (n0 - n1) * 0.5;
        }

        hiss + crackle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_deterministic() {
        let a = VinylTexture::new("lofi_a_0_x", 44_100 * 5, 44_100);
        let b = VinylTexture::new("lofi_a_0_x", 44_100 * 5, 44_100);
        assert_eq!(a.crackles, b.crackles);

        let c = VinylTexture::new("lofi_b_0_x", 44_100 * 5, 44_100);
        assert_ne!(a.crackles, c.crackles);
    }

    #[test]
    fn test_crackle_density() {
        let texture = VinylTexture::new("seed", 44_100 * 10, 44_100);
        // ~11 per second on average.
        let n = texture.crackle_count();
        assert!((60..=200).contains(&n), "{}", n);
        assert!(texture.crackles.windows(2).all(|w| w[0].frame <= w[1].frame));
    }

    #[test]
    fn test_sample_is_small_and_finite() {
        let texture = VinylTexture::new("seed", 44_100, 44_100);
        for i in 0..44_100 {
            let v = texture.sample(i);
            assert!(v.is_finite());
            assert!(v.abs() < 3.0);
        }
    }

    #[test]
    fn test_empty_track_has_no_crackles() {
        let texture = VinylTexture::new("seed", 0, 44_100);
        assert_eq!(texture.crackle_count(), 0);
        assert!(texture.sample(0).abs() <= HISS_LEVEL);
    }
}
