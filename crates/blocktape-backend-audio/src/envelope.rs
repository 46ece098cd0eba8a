//! Stateless amplitude envelopes evaluated at a time since note onset.

/// Exponential decay `exp(-rate * t)` for `t >= 0`, zero before onset.
#[inline]
pub fn exp_decay(t: f64, rate: f64) -> f64 {
    if t < 0.0 {
        0.0
    } else {
        (-rate * t).exp()
    }
}

/// Linear attack into an exponential decay.
#[inline]
pub fn attack_decay(t: f64, attack: f64, rate: f64) -> f64 {
    if t < 0.0 {
        0.0
    } else if t < attack {
        t / attack
    } else {
        exp_decay(t - attack, rate)
    }
}

/// ADSR parameters in seconds (sustain is a level).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Adsr {
    /// Creates an envelope.
    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Level at `t` seconds after onset for a note held `gate` seconds.
    pub fn level(&self, t: f64, gate: f64) -> f64 {
        if t < 0.0 {
            return 0.0;
        }
        if t >= gate {
            let held = self.held_level(gate);
            if self.release <= 0.0 {
                return 0.0;
            }
            let r = (t - gate) / self.release;
            return if r >= 1.0 { 0.0 } else { held * (1.0 - r) };
        }
        self.held_level(t)
    }

    fn held_level(&self, t: f64) -> f64 {
        if t < self.attack {
            if self.attack <= 0.0 {
                1.0
            } else {
                t / self.attack
            }
        } else if t < self.attack + self.decay {
            let d = (t - self.attack) / self.decay;
            1.0 - (1.0 - self.sustain) * d
        } else {
            self.sustain
        }
    }

    /// Time after onset at which the envelope is silent for a note of length `gate`.
    pub fn total_length(&self, gate: f64) -> f64 {
        gate + self.release.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_decay() {
        assert_eq!(exp_decay(-0.1, 10.0), 0.0);
        assert_eq!(exp_decay(0.0, 10.0), 1.0);
        assert!((exp_decay(0.1, 10.0) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_attack_decay_peaks_at_attack() {
        assert!((attack_decay(0.005, 0.01, 5.0) - 0.5).abs() < 1e-12);
        assert!((attack_decay(0.01, 0.01, 5.0) - 1.0).abs() < 1e-12);
        assert!(attack_decay(0.5, 0.01, 5.0) < 0.1);
    }

    #[test]
    fn test_adsr_stages() {
        let env = Adsr::new(0.1, 0.1, 0.5, 0.2);
        assert_eq!(env.level(0.0, 1.0), 0.0);
        assert!((env.level(0.05, 1.0) - 0.5).abs() < 1e-12);
        assert!((env.level(0.1, 1.0) - 1.0).abs() < 1e-12);
        assert!((env.level(0.5, 1.0) - 0.5).abs() < 1e-12);
        assert!((env.level(1.1, 1.0) - 0.25).abs() < 1e-12);
        assert_eq!(env.level(1.3, 1.0), 0.0);
        assert!((env.total_length(1.0) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_adsr_early_release() {
        let env = Adsr::new(0.1, 0.1, 0.5, 0.1);
        // Released halfway through the attack.
        assert!((env.level(0.05, 0.05) - 0.5).abs() < 1e-12);
        assert!((env.level(0.1, 0.05) - 0.25).abs() < 1e-12);
    }
}
