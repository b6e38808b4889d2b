use std::ops::Sub;

/// Planar vector in the trajectory frame: `x` downrange, `y` altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Elevation above the horizontal, in radians.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Vector2D::new(self.x - other.x, self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_of_sight_between_points() {
        let target = Vector2D::new(4234.167, 900.0);
        let los = target - Vector2D::new(234.167, 50.0);
        assert_relative_eq!(los.x, 4000.0, epsilon = 1e-9);
        assert_relative_eq!(los.y, 850.0, epsilon = 1e-9);
        assert_relative_eq!(los.magnitude(), 4000.0_f64.hypot(850.0), epsilon = 1e-9);
        assert_relative_eq!(los.angle(), 850.0_f64.atan2(4000.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(Vector2D::ZERO.magnitude(), 0.0);
        assert_eq!(Vector2D::default(), Vector2D::ZERO);
    }
}
