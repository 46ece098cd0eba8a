//! Stereo-linked soft-knee compressor.

/// Converts linear amplitude to decibels.
pub fn amp_to_db(amp: f64) -> f64 {
    20.0 * amp.abs().max(1e-10).log10()
}

/// Converts decibels to linear amplitude.
pub fn db_to_amp(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Feed-forward compressor with a quadratic soft knee.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f64,
    ratio: f64,
    knee_db: f64,
    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
}

impl Compressor {
    /// # Arguments
    /// * `threshold` - Linear threshold amplitude
    /// * `ratio` - Compression ratio, at least 1
    /// * `knee_db` - Knee width in dB
    /// * `attack_ms` / `release_ms` - Envelope follower times
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(
        threshold: f64,
        ratio: f64,
        knee_db: f64,
        attack_ms: f64,
        release_ms: f64,
        sample_rate: f64,
    ) -> Self {
        Self {
            threshold_db: amp_to_db(threshold),
            ratio: ratio.max(1.0),
            knee_db: knee_db.max(0.0),
            attack_coeff: (-1.0 / (attack_ms * 0.001 * sample_rate)).exp(),
            release_coeff: (-1.0 / (release_ms * 0.001 * sample_rate)).exp(),
            envelope: 0.0,
        }
    }

    /// Master bus settings: threshold 0.25, 5:1, 6 dB knee, 5/100 ms.
    pub fn mastering(sample_rate: f64) -> Self {
        Self::new(0.25, 5.0, 6.0, 5.0, 100.0, sample_rate)
    }

    /// Static gain change in dB for an input level in dB.
    pub fn gain_db(&self, level_db: f64) -> f64 {
        let over = level_db - self.threshold_db;
        let slope = 1.0 / self.ratio - 1.0;
        if 2.0 * over < -self.knee_db {
            0.0
        } else if 2.0 * over.abs() <= self.knee_db && self.knee_db > 0.0 {
            let x = over + self.knee_db / 2.0;
            slope * x * x / (2.0 * self.knee_db)
        } else {
            slope * over
        }
    }

    /// Compresses one stereo frame; both channels get the same gain.
    pub fn process(&mut self, left: f64, right: f64) -> (f64, f64) {
        let level = ((left * left + right * right) / 2.0).sqrt();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * level;

        let gain = db_to_amp(self.gain_db(amp_to_db(self.envelope)));
        (left * gain, right * gain)
    }
}
