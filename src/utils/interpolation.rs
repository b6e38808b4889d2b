/// Index of the grid cell containing `x` and the fractional position inside it.
///
/// `grid` must be ascending with at least two nodes. Values outside the grid
/// are clamped to the nearest end, so the result is always a valid cell.
pub fn locate(grid: &[f64], x: f64) -> (usize, f64) {
    let n = grid.len();
    if n < 2 || x <= grid[0] || x.is_nan() {
        return (0, 0.0);
    }
    if x >= grid[n - 1] {
        return (n - 2, 1.0);
    }

    let upper = grid.partition_point(|&node| node <= x).clamp(1, n - 1);
    let idx = upper - 1;
    let width = grid[upper] - grid[idx];
    if width.abs() < f64::EPSILON {
        (idx, 0.0)
    } else {
        (idx, (x - grid[idx]) / width)
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Bilinear blend of the four corners of a cell.
pub fn bilerp(c00: f64, c10: f64, c01: f64, c11: f64, tx: f64, ty: f64) -> f64 {
    lerp(lerp(c00, c10, tx), lerp(c01, c11, tx), ty)
}

/// Evenly spaced nodes from `start` to `end` inclusive; the last node is exactly `end`.
pub fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step).round().max(1.0) as usize;
    (0..=count)
        .map(|i| {
            if i == count {
                end
            } else {
                start + (end - start) * i as f64 / count as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_locate_inside_and_clamped() {
        let g = [0.0, 1.0, 2.0, 4.0];
        assert_eq!(locate(&g, -1.0), (0, 0.0));
        assert_eq!(locate(&g, 5.0), (2, 1.0));
        let (idx, t) = locate(&g, 3.0);
        assert_eq!(idx, 2);
        assert_relative_eq!(t, 0.5);
        let (idx, t) = locate(&g, 1.0);
        assert_eq!(idx, 1);
        assert_relative_eq!(t, 0.0);
    }

    #[test]
    fn test_bilerp_center() {
        assert_relative_eq!(bilerp(0.0, 2.0, 2.0, 4.0, 0.5, 0.5), 2.0);
    }

    #[test]
    fn test_grid_includes_end() {
        let g = grid(0.2, 4.0, 0.1);
        assert_eq!(g.len(), 39);
        assert_eq!(g[0], 0.2);
        assert_eq!(g[38], 4.0);
        assert_relative_eq!(g[10], 1.2, epsilon = 1e-12);
    }
}
