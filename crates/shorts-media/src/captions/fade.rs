//! Piecewise-linear opacity ramps for caption lines.

use super::fmt_secs;

/// Trapezoid opacity ramp over one caption interval.
///
/// Opacity is 0 outside `[start, end]`, rises linearly over `fade` seconds,
/// holds at 1 and falls linearly over the last `fade` seconds. When the
/// interval is shorter than `2 * fade` the rise and fall meet and the lower
/// of the two wins, so the peak stays below 1 and never goes negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    pub start: f64,
    pub end: f64,
    pub fade: f64,
}

impl FadeRamp {
    pub fn new(start: f64, end: f64, fade: f64) -> Self {
        Self { start, end, fade }
    }

    /// Opacity at time `t`.
    pub fn alpha_at(&self, t: f64) -> f64 {
        if t < self.start || t > self.end {
            return 0.0;
        }
        if self.fade <= 0.0 {
            return 1.0;
        }
        let rise = (t - self.start) / self.fade;
        let fall = (self.end - t) / self.fade;
        rise.min(fall).clamp(0.0, 1.0)
    }

    /// The same ramp as an FFmpeg expression in `t`.
    pub fn to_expr(&self) -> String {
        let start = fmt_secs(self.start);
        let end = fmt_secs(self.end);

        if self.fade <= 0.0 {
            return format!("between(t,{start},{end})");
        }

        let fade = fmt_secs(self.fade);
        format!(
            "if(lt(t,{start}),0,if(gt(t,{end}),0,clip(min((t-{start})/{fade},({end}-t)/{fade}),0,1)))"
        )
    }
}

/// Build the alpha expression for a line shown over `[start, end]`.
pub fn build_fade_alpha(start: f64, end: f64, fade: f64) -> String {
    FadeRamp::new(start, end, fade).to_expr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints_and_plateau() {
        let ramp = FadeRamp::new(2.0, 6.0, 0.5);
        assert_eq!(ramp.alpha_at(2.0), 0.0);
        assert_eq!(ramp.alpha_at(4.0), 1.0);
        assert_eq!(ramp.alpha_at(6.0), 0.0);
        assert!((ramp.alpha_at(2.25) - 0.5).abs() < 1e-9);
        assert!((ramp.alpha_at(5.75) - 0.5).abs() < 1e-9);
        assert_eq!(ramp.alpha_at(1.0), 0.0);
        assert_eq!(ramp.alpha_at(7.0), 0.0);
    }

    #[test]
    fn test_short_interval_is_clamped() {
        // 0.6s interval with 0.5s fades: rise and fall overlap
        let ramp = FadeRamp::new(1.0, 1.6, 0.5);
        let mut t = 0.9;
        while t <= 1.7 {
            let alpha = ramp.alpha_at(t);
            assert!((0.0..=1.0).contains(&alpha), "alpha {alpha} at {t}");
            t += 0.01;
        }
        assert!((ramp.alpha_at(1.3) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_expression_shape() {
        let expr = build_fade_alpha(2.5, 5.0, 0.5);
        assert_eq!(
            expr,
            "if(lt(t,2.5),0,if(gt(t,5),0,clip(min((t-2.5)/0.5,(5-t)/0.5),0,1)))"
        );
    }

    #[test]
    fn test_zero_fade_is_hard_gate() {
        let ramp = FadeRamp::new(1.0, 2.0, 0.0);
        assert_eq!(ramp.to_expr(), "between(t,1,2)");
        assert_eq!(ramp.alpha_at(1.5), 1.0);
        assert_eq!(ramp.alpha_at(2.5), 0.0);
    }
}
