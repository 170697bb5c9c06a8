//! Axis-aligned rectangles and axis constraints.
//!
//! All overlap and containment tests in this module are *inclusive*: two
//! rectangles that only touch along an edge intersect, and a point lying on a
//! rectangle's border is contained by it. Every collision strategy in the
//! kernel relies on these two predicates so the boundary rule stays uniform.

use crate::math::Vec2;

/// Axis-aligned rectangle described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Zero-sized rectangle at the origin.
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle of the given size centered on `center`.
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Rect::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[inline]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `point` lies inside the rectangle or on its border.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Whether the two rectangles overlap on both axes (touching edges count).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// The rectangle moved by `offset`.
    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

/// Movement constraint applied to a draggable's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// Free movement.
    #[default]
    Both,
    /// Horizontal movement only.
    X,
    /// Vertical movement only.
    Y,
}

impl Axis {
    /// Zero the component of `offset` that this axis locks.
    pub fn constrain(self, offset: Vec2) -> Vec2 {
        match self {
            Axis::Both => offset,
            Axis::X => Vec2::new(offset.x, 0.0),
            Axis::Y => Vec2::new(0.0, offset.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.center(), Vec2::new(60.0, 45.0));
        assert_eq!(Rect::from_center(rect.center(), 100.0, 50.0), rect);
    }

    #[test]
    fn test_overlapping_rects_intersect() {
        let a = Rect::new(50.0, 50.0, 100.0, 100.0);
        let b = Rect::new(75.0, 75.0, 100.0, 100.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_disjoint_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(200.0, 200.0, 100.0, 100.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&b));

        // Overlap on one axis only is not enough.
        let c = Rect::new(100.5, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(5.0, 5.0)));
        assert!(!rect.contains(Vec2::new(10.01, 5.0)));
    }

    #[test]
    fn test_translate() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0).translate(Vec2::new(-1.0, 8.0));
        assert_eq!(rect, Rect::new(0.0, 10.0, 3.0, 4.0));
    }

    #[test]
    fn test_axis_constrain() {
        let offset = Vec2::new(12.0, -7.0);
        assert_eq!(Axis::Both.constrain(offset), offset);
        assert_eq!(Axis::X.constrain(offset), Vec2::new(12.0, 0.0));
        assert_eq!(Axis::Y.constrain(offset), Vec2::new(0.0, -7.0));
    }
}
