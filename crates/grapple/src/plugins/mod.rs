//! Built-in plugins installed by [`Kernel::initialize`](crate::Kernel::initialize).
//!
//! Each plugin owns its own instance registry and reacts to the kernel's
//! event bus. The kernel reaches them by name through the plugin registry
//! (see [`Kernel::drag_manager`](crate::Kernel::drag_manager) and friends).

pub mod collision;
pub mod drag_manager;
pub mod drop_manager;
pub mod sortable;

pub use collision::{CollisionAlgorithm, CollisionArgs, CollisionCandidate, CollisionDetector};
pub use drag_manager::{DragCallback, DragManager, Draggable, DraggableOptions};
pub use drop_manager::{AcceptRule, DropCallback, DropManager, Droppable, DroppableOptions};
pub use sortable::{
    GridPosition, Orientation, SortCallback, SortLayout, Sortable, SortableEngine,
    SortableGridOptions, SortableOptions,
};

pub const DRAG_MANAGER: &str = "drag-manager";
pub const DROP_MANAGER: &str = "drop-manager";
pub const COLLISION_DETECTOR: &str = "collision-detector";
pub const SORTABLE_ENGINE: &str = "sortable-engine";

/// Version reported by every built-in plugin.
pub(crate) const BUILTIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Id-keyed instance storage in registration order.
pub(crate) type InstanceMap<T> =
    indexmap::IndexMap<String, std::sync::Arc<T>, grapple_core::alloc::RandomState>;
