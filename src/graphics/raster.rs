//! Integer rasterizers.
//!
//! These only compute coordinates; the caller decides what a plot does
//! (write a pixel, clip, collect). Coordinates are `i64`. The ellipse error
//! terms grow with the square of the semi-axes and are kept in `i128`, which
//! holds them for any `u32` semi-axis.

/// Bresenham line from `(x1, y1)` to `(x2, y2)`, both endpoints included.
pub fn line(x1: i64, y1: i64, x2: i64, y2: i64, mut plot: impl FnMut(i64, i64)) {
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x1, y1);

    loop {
        plot(x, y);

        if x == x2 && y == y2 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Midpoint circle around `(xm, ym)`.
///
/// Plots the four axis points first, then eight symmetric points per step
/// while `x < y`. Points on the diagonals and axes may be plotted twice.
pub fn circle(xm: i64, ym: i64, radius: i64, mut plot: impl FnMut(i64, i64)) {
    let mut f = 1 - radius;
    let mut ddf_x = 0;
    let mut ddf_y = -2 * radius;
    let mut x = 0;
    let mut y = radius;

    plot(xm, ym + radius);
    plot(xm, ym - radius);
    plot(xm + radius, ym);
    plot(xm - radius, ym);

    while x < y {
        if f >= 0 {
            y -= 1;
            ddf_y += 2;
            f += ddf_y;
        }
        x += 1;
        ddf_x += 2;
        f += ddf_x + 1;

        plot(xm + x, ym + y);
        plot(xm - x, ym + y);
        plot(xm + x, ym - y);
        plot(xm - x, ym - y);
        plot(xm + y, ym + x);
        plot(xm - y, ym + x);
        plot(xm + y, ym - x);
        plot(xm - y, ym - x);
    }
}

/// Midpoint ellipse around `(xm, ym)` with horizontal semi-axis `a` and
/// vertical semi-axis `b`.
///
/// Walks one quadrant from `(-a, 0)` towards `(0, b)`, mirroring each point
/// into the other three. Narrow ellipses (`a` of 0 or 1) leave the walk
/// before `y` reaches `b`; the closing run is vertical, along `x = xm`, out
/// to the tips `(xm, ym - b)` and `(xm, ym + b)`.
pub fn ellipse(xm: i64, ym: i64, a: i64, b: i64, mut plot: impl FnMut(i64, i64)) {
    let a2 = i128::from(a) * i128::from(a);
    let b2 = i128::from(b) * i128::from(b);
    let mut x = -a;
    let mut y = 0;
    let mut err = i128::from(x) * (2 * b2 + i128::from(x)) + b2;

    loop {
        plot(xm - x, ym + y);
        plot(xm + x, ym + y);
        plot(xm + x, ym - y);
        plot(xm - x, ym - y);

        let e2 = 2 * err;
        if e2 >= i128::from(x * 2 + 1) * b2 {
            x += 1;
            err += i128::from(x * 2 + 1) * b2;
        }
        if e2 <= i128::from(y * 2 + 1) * a2 {
            y += 1;
            err += i128::from(y * 2 + 1) * a2;
        }
        if x > 0 {
            break;
        }
    }

    while y < b {
        y += 1;
        plot(xm, ym + y);
        plot(xm, ym - y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn collect(f: impl FnOnce(&mut dyn FnMut(i64, i64))) -> (usize, BTreeSet<(i64, i64)>) {
        let mut calls = 0;
        let mut points = BTreeSet::new();
        f(&mut |x, y| {
            calls += 1;
            points.insert((x, y));
        });
        (calls, points)
    }

    #[test]
    fn test_line_diagonal() {
        let (calls, points) = collect(|plot| line(0, 0, 3, 3, plot));
        assert_eq!(calls, 4);
        assert_eq!(
            points.into_iter().collect::<Vec<_>>(),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)]
        );
    }

    #[test]
    fn test_line_endpoints_and_continuity() {
        let mut points = Vec::new();
        line(7, 2, 0, 5, |x, y| points.push((x, y)));
        assert_eq!(points.first(), Some(&(7, 2)));
        assert_eq!(points.last(), Some(&(0, 5)));
        for pair in points.windows(2) {
            let (ax, ay) = pair[0];
            let (bx, by) = pair[1];
            assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1);
        }
        // x-major line: one point per column.
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn test_line_single_point() {
        let (calls, points) = collect(|plot| line(4, 4, 4, 4, plot));
        assert_eq!(calls, 1);
        assert!(points.contains(&(4, 4)));
    }

    #[test]
    fn test_circle_radius_one() {
        let (calls, points) = collect(|plot| circle(0, 0, 1, plot));
        assert_eq!(calls, 12);
        assert_eq!(
            points,
            [(0, 1), (0, -1), (1, 0), (-1, 0)].into_iter().collect()
        );
    }

    #[test]
    fn test_circle_radius_two() {
        let (calls, points) = collect(|plot| circle(0, 0, 2, plot));
        assert_eq!(calls, 4 + 8 * 2);
        let expected: BTreeSet<_> = [
            (0, 2),
            (0, -2),
            (2, 0),
            (-2, 0),
            (1, 2),
            (-1, 2),
            (1, -2),
            (-1, -2),
            (2, 1),
            (-2, 1),
            (2, -1),
            (-2, -1),
        ]
        .into_iter()
        .collect();
        assert_eq!(points, expected);
    }

    #[test]
    fn test_circle_points_lie_on_radius() {
        for radius in [3i64, 10, 37, 100] {
            let (calls, points) = collect(|plot| circle(50, -20, radius, plot));
            assert_eq!((calls - 4) % 8, 0);
            for &(x, y) in &points {
                let dx = (x - 50) as f64;
                let dy = (y + 20) as f64;
                let dist = (dx * dx + dy * dy).sqrt();
                assert!(
                    (dist - radius as f64).abs() < 1.0,
                    "({}, {}) is {} from center, radius {}",
                    x,
                    y,
                    dist,
                    radius
                );
            }
            for axis in [(50, -20 + radius), (50, -20 - radius), (50 + radius, -20), (50 - radius, -20)] {
                assert!(points.contains(&axis));
            }
        }
    }

    #[test]
    fn test_circle_is_symmetric() {
        let (_, points) = collect(|plot| circle(0, 0, 9, plot));
        for &(x, y) in &points {
            assert!(points.contains(&(-x, y)));
            assert!(points.contains(&(x, -y)));
            assert!(points.contains(&(y, x)));
        }
    }

    #[test]
    fn test_ellipse_small() {
        let (_, points) = collect(|plot| ellipse(0, 0, 2, 1, plot));
        let expected: BTreeSet<_> = [
            (2, 0),
            (-2, 0),
            (1, 1),
            (-1, 1),
            (1, -1),
            (-1, -1),
            (0, 1),
            (0, -1),
        ]
        .into_iter()
        .collect();
        assert_eq!(points, expected);
    }

    #[test]
    fn test_ellipse_reaches_all_four_tips() {
        let (_, points) = collect(|plot| ellipse(10, 10, 8, 3, plot));
        assert!(points.contains(&(18, 10)));
        assert!(points.contains(&(2, 10)));
        assert!(points.contains(&(10, 13)));
        assert!(points.contains(&(10, 7)));
    }

    #[test]
    fn test_ellipse_flat_tip_is_finished() {
        // a = 1 stops the quadrant walk early; the tail run closes the tips.
        let (_, points) = collect(|plot| ellipse(0, 0, 1, 6, plot));
        assert!(points.contains(&(0, 6)));
        assert!(points.contains(&(0, -6)));
    }

    #[test]
    fn test_ellipse_with_huge_axes() {
        let r = 3_000_000i64;
        let mut tips = [false; 4];
        let mut calls = 0u64;
        ellipse(0, 0, r, r, |x, y| {
            calls += 1;
            match (x, y) {
                (x, 0) if x == r => tips[0] = true,
                (x, 0) if x == -r => tips[1] = true,
                (0, y) if y == r => tips[2] = true,
                (0, y) if y == -r => tips[3] = true,
                _ => {}
            }
        });
        assert_eq!(tips, [true; 4]);
        // One quadrant walk takes at most a + b steps.
        assert!(calls <= 4 * (2 * r as u64 + 4));
    }

    #[test]
    fn test_ellipse_points_near_curve() {
        let (a, b) = (20i64, 7i64);
        let (_, points) = collect(|plot| ellipse(0, 0, a, b, plot));
        for &(x, y) in &points {
            let fx = x as f64 / a as f64;
            let fy = y as f64 / b as f64;
            let v = fx * fx + fy * fy;
            assert!((0.6..1.4).contains(&v), "({}, {}) off the curve: {}", x, y, v);
        }
    }

    #[test]
    fn test_ellipse_equal_axes_matches_radius() {
        let (_, points) = collect(|plot| ellipse(0, 0, 6, 6, plot));
        for &(x, y) in &points {
            let dist = ((x * x + y * y) as f64).sqrt();
            assert!((dist - 6.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_degenerate_ellipses_are_lines() {
        let (_, vertical) = collect(|plot| ellipse(0, 0, 0, 3, plot));
        assert_eq!(vertical, (-3..=3).map(|y| (0, y)).collect());

        let (_, horizontal) = collect(|plot| ellipse(0, 0, 3, 0, plot));
        assert_eq!(horizontal, (-3..=3).map(|x| (x, 0)).collect());
    }
}
