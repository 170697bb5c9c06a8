//! Vector math used for pointer positions, drag deltas and transforms.
//!
//! This module re-exports the 2D subset of the [`glam`] crate that the kernel
//! works with. All coordinates are `f32` in a single host-defined space
//! (typically CSS pixels or logical window pixels).
//!
//! # Examples
//!
//! ```
//! use grapple_core::math::Vec2;
//!
//! let start = Vec2::new(10.0, 20.0);
//! let current = Vec2::new(4.0, 32.0);
//! let delta = current - start;
//! assert_eq!(delta, Vec2::new(-6.0, 12.0));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Vec2, vec2};

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(vec2(1.0, 1.0), vec2(1.0, 1.0)), 0.0);
    }
}
