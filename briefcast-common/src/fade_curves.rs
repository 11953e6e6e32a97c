//! Fade curve implementations for segment crossfading
//!
//! Adjacent live segments overlap by one crossfade window; the incoming
//! segment fades in while the outgoing segment fades out. The default
//! curve ramps linearly in dB (exponentially in gain) between a -60 dB
//! floor and unity, which is what keeps independently-encoded speech
//! segments click-free at the splice.

use std::f32::consts::FRAC_PI_2;

/// Gain floor for the dB-linear ramp (-60 dB). Exponential ramps cannot
/// start from exactly zero.
pub const DB_RAMP_FLOOR: f32 = 0.001;

/// Fade curve types
///
/// - Linear: constant rate of change in gain
/// - ExponentialDb: constant rate of change in dB (perceptually even)
/// - EqualPower: constant perceived loudness across a symmetric crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = floor^(1-t), a straight line on a dB axis from -60 dB to 0 dB
    ExponentialDb,

    /// v(t) = sin(t × π/2); fade_in² + fade_out² = 1 at every point
    EqualPower,
}

impl FadeCurve {
    /// Fade-in multiplier at a normalized position
    ///
    /// # Arguments
    /// * `position` - Normalized position through the fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier (0.0..=1.0 for Linear/EqualPower; the dB ramp
    /// starts at the -60 dB floor rather than silence)
    pub fn fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::ExponentialDb => DB_RAMP_FLOOR.powf(1.0 - t),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Fade-out multiplier at a normalized position
    ///
    /// Symmetric to [`FadeCurve::fade_in`]: 1.0 at position 0.0, floor (or
    /// 0.0) at position 1.0.
    pub fn fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::ExponentialDb => DB_RAMP_FLOOR.powf(t),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }
}

impl Default for FadeCurve {
    /// Segment envelopes default to the dB-linear ramp
    fn default() -> Self {
        FadeCurve::ExponentialDb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_linear_fade_in() {
        let curve = FadeCurve::Linear;
        assert_eq!(curve.fade_in(0.0), 0.0);
        assert!((curve.fade_in(0.5) - 0.5).abs() < EPSILON);
        assert_eq!(curve.fade_in(1.0), 1.0);
    }

    #[test]
    fn test_linear_fade_out() {
        let curve = FadeCurve::Linear;
        assert_eq!(curve.fade_out(0.0), 1.0);
        assert!((curve.fade_out(0.5) - 0.5).abs() < EPSILON);
        assert_eq!(curve.fade_out(1.0), 0.0);
    }

    #[test]
    fn test_db_ramp_endpoints() {
        let curve = FadeCurve::ExponentialDb;

        // Starts at the floor, ends at unity
        assert!((curve.fade_in(0.0) - DB_RAMP_FLOOR).abs() < EPSILON);
        assert!((curve.fade_in(1.0) - 1.0).abs() < EPSILON);

        // Fade-out is the mirror image
        assert!((curve.fade_out(0.0) - 1.0).abs() < EPSILON);
        assert!((curve.fade_out(1.0) - DB_RAMP_FLOOR).abs() < EPSILON);
    }

    #[test]
    fn test_db_ramp_is_linear_in_db() {
        let curve = FadeCurve::ExponentialDb;

        // Equal position steps produce equal dB steps
        let db = |g: f32| 20.0 * g.log10();
        let step1 = db(curve.fade_in(0.50)) - db(curve.fade_in(0.25));
        let step2 = db(curve.fade_in(0.75)) - db(curve.fade_in(0.50));
        assert!((step1 - step2).abs() < 0.01);
    }

    #[test]
    fn test_equal_power_constant_power() {
        let curve = FadeCurve::EqualPower;

        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let fade_in = curve.fade_in(t);
            let fade_out = curve.fade_out(t);
            // sin²(t) + cos²(t) = 1
            assert!((fade_in * fade_in + fade_out * fade_out - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_clamping() {
        let curve = FadeCurve::Linear;
        assert_eq!(curve.fade_in(-0.5), 0.0);
        assert_eq!(curve.fade_in(1.5), 1.0);
        assert_eq!(curve.fade_out(-0.5), 1.0);
        assert_eq!(curve.fade_out(1.5), 0.0);
    }

    #[test]
    fn test_default() {
        assert_eq!(FadeCurve::default(), FadeCurve::ExponentialDb);
    }
}
