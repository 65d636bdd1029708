//! Interpolation curves for window slides

use crate::screen::Point;

/// Smoothstep: slow start and end, `t²·(3 − 2t)`
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Position along the straight line from `start` to `end` at progress `t`,
/// truncated toward zero.
pub fn interpolate(start: Point, end: Point, t: f64) -> Point {
    let x = start.x as f64 + (end.x - start.x) as f64 * t;
    let y = start.y as f64 + (end.y - start.y) as f64 * t;
    Point::new(x as i32, y as i32)
}

/// Opacity at which a fade starts when nothing interrupted it
pub fn fade_origin(revealing: bool) -> u8 {
    if revealing {
        0
    } else {
        u8::MAX
    }
}

/// Whole-window opacity at progress `t`, going from `from` to fully opaque
/// when revealing or fully transparent otherwise
pub fn fade_alpha(from: u8, t: f64, revealing: bool) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let from = f64::from(from);
    let target = if revealing { 255.0 } else { 0.0 };
    (from + (target - from) * t) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < f64::EPSILON);
        assert!(smoothstep(0.25) < 0.25);
        assert!(smoothstep(0.75) > 0.75);
    }

    #[test]
    fn test_smoothstep_is_monotonic() {
        let samples: Vec<f64> = (0..=100).map(|i| smoothstep(i as f64 / 100.0)).collect();
        assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_interpolate_truncates_whole_sum() {
        let start = Point::new(100, 100);
        let end = Point::new(100, -302);

        assert_eq!(interpolate(start, end, 0.0), start);
        assert_eq!(interpolate(start, end, 0.25), Point::new(100, 0));
        assert_eq!(interpolate(start, end, 0.5), Point::new(100, -101));
        assert_eq!(interpolate(start, end, 1.0), end);

        // -5 + 3.5 = -1.5 truncates to -1, not -5 + 3
        assert_eq!(
            interpolate(Point::new(-5, 0), Point::new(2, 0), 0.5),
            Point::new(-1, 0)
        );
    }

    #[test]
    fn test_fade_alpha() {
        let opaque = fade_origin(false);
        let clear = fade_origin(true);

        assert_eq!(fade_alpha(clear, 0.0, true), 0);
        assert_eq!(fade_alpha(clear, 1.0, true), 255);
        assert_eq!(fade_alpha(clear, 0.5, true), 127);
        assert_eq!(fade_alpha(opaque, 0.0, false), 255);
        assert_eq!(fade_alpha(opaque, 1.0, false), 0);
        assert_eq!(fade_alpha(opaque, 0.25, false), 191);
    }

    #[test]
    fn test_fade_from_partial_opacity() {
        assert_eq!(fade_alpha(127, 0.0, true), 127);
        assert_eq!(fade_alpha(127, 0.25, true), 159);
        assert_eq!(fade_alpha(127, 1.0, true), 255);
        assert_eq!(fade_alpha(200, 0.5, false), 100);
        assert_eq!(fade_alpha(200, 1.0, false), 0);
    }
}
