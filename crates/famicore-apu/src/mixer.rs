//! Nonlinear channel mixer.
//!
//! The hardware DAC is nonlinear; the documented approximation is
//!
//! ```text
//! pulse_out = 95.88 / (8128 / (pulse1 + pulse2) + 100)
//! tnd_out   = 159.79 / (1 / (triangle/8227 + noise/12241 + dmc/22638) + 100)
//! ```
//!
//! with both terms zero when their channel group is silent. The sum lands
//! in 0.0..1.0.

/// Mix the five channel levels into one output sample.
#[must_use]
pub fn mix(pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
    let pulse_sum = f32::from(pulse1) + f32::from(pulse2);
    let pulse_out = if pulse_sum == 0.0 {
        0.0
    } else {
        95.88 / (8128.0 / pulse_sum + 100.0)
    };

    let tnd_sum =
        f32::from(triangle) / 8227.0 + f32::from(noise) / 12241.0 + f32::from(dmc) / 22638.0;
    let tnd_out = if tnd_sum == 0.0 {
        0.0
    } else {
        159.79 / (1.0 / tnd_sum + 100.0)
    };

    pulse_out + tnd_out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_mixes_to_zero() {
        assert_eq!(mix(0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn output_stays_in_unit_range() {
        // The documented constants put the theoretical maximum a hair
        // under 1.0; leave room for f32 rounding.
        let max = mix(15, 15, 15, 15, 127);
        assert!(max > 0.99);
        assert!(max < 1.0001);
    }

    #[test]
    fn mix_is_monotonic_in_each_channel() {
        assert!(mix(8, 0, 0, 0, 0) > mix(4, 0, 0, 0, 0));
        assert!(mix(0, 0, 15, 0, 0) > mix(0, 0, 7, 0, 0));
        assert!(mix(0, 0, 0, 0, 100) > mix(0, 0, 0, 0, 50));
    }

    #[test]
    fn pulse_formula_reference_point() {
        // Both pulses at full volume: 95.88 / (8128/30 + 100).
        let expected = 95.88 / (8128.0 / 30.0 + 100.0);
        assert!((mix(15, 15, 0, 0, 0) - expected).abs() < 1e-6);
    }

    proptest::proptest! {
        /// The mix stays in the unit range for all channel levels.
        #[test]
        fn mix_always_in_unit_range(
            p1 in 0u8..16, p2 in 0u8..16, t in 0u8..16, n in 0u8..16, d in 0u8..128
        ) {
            let out = mix(p1, p2, t, n, d);
            proptest::prop_assert!(out >= 0.0);
            proptest::prop_assert!(out < 1.0001);
        }
    }
}
