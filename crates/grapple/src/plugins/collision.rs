//! Collision detection between the dragged element and drop targets.
//!
//! The algorithms are pure functions over rectangles and return the index
//! of the hit candidate. Overlap and containment are inclusive everywhere
//! (see [`Rect::intersects`] and [`Rect::contains`]).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use grapple_core::geometry::Rect;
use grapple_core::math::{Vec2, distance};
use grapple_core::profiling::profile_function;
use parking_lot::RwLock;

use crate::error::KernelResult;
use crate::kernel::Kernel;
use crate::options::CollisionStrategy;
use crate::plugin::{Plugin, PluginCategory};

use super::drag_manager::Draggable;
use super::drop_manager::Droppable;
use super::{BUILTIN_VERSION, COLLISION_DETECTOR};

/// Built-in collision algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollisionAlgorithm {
    /// First candidate whose rect overlaps the dragged rect.
    #[default]
    Rectangle,
    /// First candidate containing the dragged rect's center.
    Center,
    /// First candidate containing the pointer.
    Pointer,
    /// Candidate whose center is nearest the pointer.
    Closest,
}

impl CollisionAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            CollisionAlgorithm::Rectangle => "rectangle",
            CollisionAlgorithm::Center => "center",
            CollisionAlgorithm::Pointer => "pointer",
            CollisionAlgorithm::Closest => "closest",
        }
    }

    pub fn detect(self, args: &CollisionArgs<'_>) -> Option<usize> {
        match self {
            CollisionAlgorithm::Rectangle => rectangle_intersection(args),
            CollisionAlgorithm::Center => center_point(args),
            CollisionAlgorithm::Pointer => pointer_within(args),
            CollisionAlgorithm::Closest => closest_center(args),
        }
    }
}

impl fmt::Display for CollisionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown algorithm name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlgorithm(pub String);

impl fmt::Display for UnknownAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown collision algorithm '{}'", self.0)
    }
}

impl std::error::Error for UnknownAlgorithm {}

impl FromStr for CollisionAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "rectangle" => Ok(CollisionAlgorithm::Rectangle),
            "center" => Ok(CollisionAlgorithm::Center),
            "pointer" => Ok(CollisionAlgorithm::Pointer),
            "closest" => Ok(CollisionAlgorithm::Closest),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A drop target as seen by a collision algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionCandidate<'a> {
    pub id: &'a str,
    pub rect: Rect,
}

/// Input to a collision algorithm.
#[derive(Debug, Clone, Copy)]
pub struct CollisionArgs<'a> {
    /// Current rect of the dragged element.
    pub active: Rect,
    /// Last recorded pointer position.
    pub pointer: Option<Vec2>,
    /// Candidates in registration order.
    pub candidates: &'a [CollisionCandidate<'a>],
}

pub fn rectangle_intersection(args: &CollisionArgs<'_>) -> Option<usize> {
    args.candidates
        .iter()
        .position(|candidate| candidate.rect.intersects(&args.active))
}

pub fn center_point(args: &CollisionArgs<'_>) -> Option<usize> {
    let center = args.active.center();
    args.candidates
        .iter()
        .position(|candidate| candidate.rect.contains(center))
}

pub fn pointer_within(args: &CollisionArgs<'_>) -> Option<usize> {
    let pointer = args.pointer?;
    args.candidates
        .iter()
        .position(|candidate| candidate.rect.contains(pointer))
}

/// Nearest candidate center to the pointer. Equal distances resolve to the
/// earliest candidate.
pub fn closest_center(args: &CollisionArgs<'_>) -> Option<usize> {
    let pointer = args.pointer?;
    let mut best: Option<(usize, f32)> = None;
    for (index, candidate) in args.candidates.iter().enumerate() {
        let d = distance(candidate.rect.center(), pointer);
        if best.is_none_or(|(_, nearest)| d < nearest) {
            best = Some((index, d));
        }
    }
    best.map(|(index, _)| index)
}

/// Every candidate overlapping the dragged rect, in order.
pub fn detect_all_overlapping(args: &CollisionArgs<'_>) -> Vec<usize> {
    args.candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.rect.intersects(&args.active))
        .map(|(index, _)| index)
        .collect()
}

/// Plugin holding the active collision strategy and the last pointer
/// position.
pub struct CollisionDetector {
    strategy: RwLock<CollisionStrategy>,
    pointer: RwLock<Option<Vec2>>,
}

impl CollisionDetector {
    pub fn new(strategy: CollisionStrategy) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            pointer: RwLock::new(None),
        }
    }

    pub fn strategy(&self) -> CollisionStrategy {
        self.strategy.read().clone()
    }

    pub fn set_strategy(&self, strategy: CollisionStrategy) {
        tracing::debug!(strategy = ?strategy, "Collision strategy changed");
        *self.strategy.write() = strategy;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        *self.pointer.read()
    }

    pub fn set_pointer(&self, position: Option<Vec2>) {
        *self.pointer.write() = position;
    }

    /// Run the active strategy for `draggable` against `droppables`.
    pub fn detect(
        &self,
        draggable: &Draggable,
        droppables: &[Arc<Droppable>],
    ) -> Option<Arc<Droppable>> {
        profile_function!();
        if droppables.is_empty() {
            return None;
        }

        let rects: Vec<Rect> = droppables.iter().map(|d| d.rect()).collect();
        let candidates: Vec<CollisionCandidate<'_>> = droppables
            .iter()
            .zip(&rects)
            .map(|(droppable, rect)| CollisionCandidate {
                id: droppable.id(),
                rect: *rect,
            })
            .collect();
        let args = CollisionArgs {
            active: draggable.rect(),
            pointer: self.pointer(),
            candidates: &candidates,
        };

        let index = match self.strategy() {
            CollisionStrategy::Named(algorithm) => algorithm.detect(&args),
            CollisionStrategy::Custom(detect) => detect(&args),
        }?;

        match droppables.get(index) {
            Some(droppable) => Some(Arc::clone(droppable)),
            None => {
                tracing::warn!(
                    index,
                    candidates = droppables.len(),
                    "Collision function returned an out-of-range index"
                );
                None
            }
        }
    }

    /// Every droppable overlapping `draggable`, in order.
    pub fn detect_all(
        &self,
        draggable: &Draggable,
        droppables: &[Arc<Droppable>],
    ) -> Vec<Arc<Droppable>> {
        profile_function!();
        let candidates: Vec<CollisionCandidate<'_>> = droppables
            .iter()
            .map(|droppable| CollisionCandidate {
                id: droppable.id(),
                rect: droppable.rect(),
            })
            .collect();
        let args = CollisionArgs {
            active: draggable.rect(),
            pointer: self.pointer(),
            candidates: &candidates,
        };

        detect_all_overlapping(&args)
            .into_iter()
            .map(|index| Arc::clone(&droppables[index]))
            .collect()
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(CollisionStrategy::default())
    }
}

impl Plugin for CollisionDetector {
    fn name(&self) -> &str {
        COLLISION_DETECTOR
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Core
    }

    fn install(&self, _kernel: &Kernel) -> KernelResult<()> {
        Ok(())
    }

    fn uninstall(&self) {
        self.set_pointer(None);
    }
}
