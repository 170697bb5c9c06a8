//! Grapple Core
//!
//! Shared building blocks for the Grapple drag-and-drop kernel: geometry,
//! vector math, hash collections, the host [`element::Element`] trait, and
//! logging/profiling setup.

pub mod alloc;
pub mod element;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;

pub use element::{Element, ElementRef, same_element};
pub use geometry::{Axis, Rect};
pub use math::Vec2;
