//! Property-Based Tests for the rate limiter
//!
//! These check the step bounds and termination guarantees of both ramp
//! policies across a wide range of inputs.

use rdc_core::utils::math::ramp::{clamp_toward, decay_toward, Ramp, RampConfig};

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn clamp_moves_at_most_one_step(
            current in -2.0f64..2.0f64,
            target in -2.0f64..2.0f64,
            max_step in 0.0f64..0.5f64
        ) {
            let next = clamp_toward(current, target, max_step);
            prop_assert!((next - current).abs() <= max_step + 1e-6);
        }

        #[test]
        fn clamp_stays_between_current_and_target(
            current in -1.0f64..1.0f64,
            target in -1.0f64..1.0f64,
            max_step in 0.0f64..0.5f64
        ) {
            let next = clamp_toward(current, target, max_step);
            let (lo, hi) = if current <= target { (current, target) } else { (target, current) };
            prop_assert!(next >= lo && next <= hi);
        }

        #[test]
        fn clamp_is_idempotent_at_target(
            target in -1.0f64..1.0f64,
            max_step in 0.0f64..0.5f64
        ) {
            prop_assert_eq!(clamp_toward(target, target, max_step), target);
        }

        #[test]
        fn decay_snaps_inside_one_step(
            max_step in 0.001f64..0.5f64,
            fraction in -0.999f64..0.999f64
        ) {
            let current = max_step * fraction;
            prop_assert_eq!(decay_toward(current, 0.0, max_step), 0.0);
        }

        #[test]
        fn decay_reaches_exact_zero_without_overshoot(
            start in -1.5f64..1.5f64,
            max_step in 0.005f64..0.2f64
        ) {
            let bound = (start.abs() / max_step).ceil() as usize;
            let mut current = start;
            let mut cycles = 0;
            while current != 0.0 {
                let next = decay_toward(current, 0.0, max_step);
                prop_assert!(next.abs() < current.abs());
                prop_assert!(next == 0.0 || next.signum() == current.signum());
                current = next;
                cycles += 1;
                prop_assert!(cycles <= bound);
            }
        }

        #[test]
        fn ramp_output_never_leaves_input_hull(
            targets in proptest::collection::vec((-1.0f64..1.0f64, -1.0f64..1.0f64), 1..200)
        ) {
            let mut ramp = Ramp::new(RampConfig::default());
            let mut prev = [0.0f64; 2];
            for (a, b) in targets {
                let next = ramp.apply([a, b]);
                for i in 0..2 {
                    prop_assert!(next[i].abs() <= 1.0);
                    prop_assert!((next[i] - prev[i]).abs() <= RampConfig::default().max_accel_step + 1e-6);
                }
                prev = next;
            }
        }
    }
}
