//! Waveshaping and bit-depth reduction.

/// Effective bit depth of the crusher stage.
pub const CRUSH_BITS: u32 = 12;

/// Quantizes a sample in `[-1, 1]` to `bits` of resolution.
#[inline]
pub fn bitcrush(sample: f64, bits: u32) -> f64 {
    let levels = (1u64 << bits.clamp(1, 24)) as f64;
    let step = 2.0 / levels;
    (sample / step).round() * step
}

/// Hyperbolic-tangent waveshaper with `1/sqrt(drive)` makeup gain.
///
/// `drive` below 1 is treated as 1.
#[inline]
pub fn tanh_drive(sample: f64, drive: f64) -> f64 {
    let drive = drive.max(1.0);
    (sample * drive).tanh() / drive.sqrt()
}

/// Drive for the distortion stage from a 0-1 amount.
#[inline]
pub fn distortion_drive(amount: f64) -> f64 {
    1.0 + amount.clamp(0.0, 1.0) * 4.0
}

/// Fixed drive of the tape stage.
pub const TAPE_DRIVE: f64 = 1.6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcrush_quantizes() {
        let step = 2.0 / 4096.0;
        let crushed = bitcrush(0.1234, 12);
        assert!(((crushed / step) - (crushed / step).round()).abs() < 1e-9);
        assert!((crushed - 0.1234).abs() <= step / 2.0);
        assert_eq!(bitcrush(0.0, 12), 0.0);
        assert_eq!(bitcrush(0.3, 1), 0.0);
        assert_eq!(bitcrush(0.6, 1), 1.0);
    }

    #[test]
    fn test_tanh_drive_bounded() {
        for drive in [1.0, 2.0, 5.0] {
            for x in [-10.0, -1.0, 0.0, 0.5, 10.0] {
                let y = tanh_drive(x, drive);
                assert!(y.abs() <= 1.0 / drive.sqrt() + 1e-12);
            }
        }
        assert_eq!(tanh_drive(0.3, 0.1), 0.3f64.tanh());
    }

    #[test]
    fn test_distortion_drive_range() {
        assert_eq!(distortion_drive(0.0), 1.0);
        assert_eq!(distortion_drive(1.0), 5.0);
        assert_eq!(distortion_drive(3.0), 5.0);
    }
}
