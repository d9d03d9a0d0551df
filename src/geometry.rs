//! Small vector and rectangle types used for positions, sizes and anchors.
//!
//! [`IVector2`] is the integer pixel vector used for positions and sizes,
//! [`Vector2`] the float vector used for anchors and relative sizes, and
//! [`IRect2`] a pixel rectangle handed to the render backend.
//!
//! ```
//! use compygui::geometry::{IVector2, Vector2};
//!
//! let size = IVector2::new(20, 10);
//! let offset = (Vector2::new(0.5, 0.5) * size).rounded();
//! assert_eq!(IVector2::new(100, 100) - offset, IVector2::new(90, 95));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Sub};

/// Integer 2D vector in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IVector2 {
    pub x: i32,
    pub y: i32,
}

impl IVector2 {
    pub const ZERO: IVector2 = IVector2 { x: 0, y: 0 };
    pub const ONE: IVector2 = IVector2 { x: 1, y: 1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when both components are zero or positive.
    pub fn is_non_negative(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    pub fn as_vector2(&self) -> Vector2 {
        Vector2::new(self.x as f32, self.y as f32)
    }
}

impl Add for IVector2 {
    type Output = IVector2;

    fn add(self, rhs: IVector2) -> IVector2 {
        IVector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for IVector2 {
    type Output = IVector2;

    fn sub(self, rhs: IVector2) -> IVector2 {
        IVector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Display for IVector2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Float 2D vector. Used for anchors and relative sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };
    pub const ONE: Vector2 = Vector2 { x: 1.0, y: 1.0 };
    pub const CENTER: Vector2 = Vector2 { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Rounds both components to the nearest integer (halves away from zero).
    pub fn rounded(&self) -> IVector2 {
        IVector2::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Returns true if both components are finite and inside `0.0..=1.0`.
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Mul<IVector2> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: IVector2) -> Vector2 {
        Vector2::new(self.x * rhs.x as f32, self.y * rhs.y as f32)
    }
}

impl Mul for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x * rhs.x, self.y * rhs.y)
    }
}

/// Pixel rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IRect2 {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IRect2 {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_vectors(position: IVector2, size: IVector2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn position(&self) -> IVector2 {
        IVector2::new(self.x, self.y)
    }

    pub fn size(&self) -> IVector2 {
        IVector2::new(self.w, self.h)
    }

    /// Intersection of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &IRect2) -> Option<IRect2> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(IRect2::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_goes_half_away_from_zero() {
        assert_eq!(Vector2::new(2.5, -2.5).rounded(), IVector2::new(3, -3));
        assert_eq!(Vector2::new(2.4, 7.6).rounded(), IVector2::new(2, 8));
    }

    #[test]
    fn anchor_times_size() {
        let v = Vector2::new(0.5, 0.25) * IVector2::new(20, 40);
        assert_eq!(v, Vector2::new(10.0, 10.0));
    }

    #[test]
    fn normalized_bounds() {
        assert!(Vector2::ZERO.is_normalized());
        assert!(Vector2::ONE.is_normalized());
        assert!(!Vector2::new(1.01, 0.0).is_normalized());
        assert!(!Vector2::new(f32::NAN, 0.0).is_normalized());
    }

    #[test]
    fn rect_intersection() {
        let a = IRect2::new(0, 0, 10, 10);
        let b = IRect2::new(5, -5, 10, 10);
        assert_eq!(a.intersect(&b), Some(IRect2::new(5, 0, 5, 5)));
        assert_eq!(a.intersect(&IRect2::new(10, 0, 4, 4)), None);
    }
}
