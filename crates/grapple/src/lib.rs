//! Grapple - a framework-agnostic drag-and-drop interaction kernel
//!
//! Grapple owns the state machine of drag-and-drop and leaves rendering to the
//! host. The host describes its UI through the [`Element`] trait, feeds raw
//! input into the kernel, and reacts to the events it emits.
//!
//! - **Kernel**: the facade owning the event bus and plugin registry
//! - **Plugins**: every feature is a plugin, including the built-in drag
//!   manager, drop manager, collision detector and sortable engine
//! - **Sensors**: pointer, touch and keyboard input turned into drag gestures
//! - **Hooks**: plugins observe every phase and may veto the `Before*` ones
//!
//! # Quick Start
//!
//! ```
//! use grapple::prelude::*;
//! use grapple_test_utils::MockElement;
//!
//! let kernel = Kernel::builder().build().unwrap();
//!
//! let card = MockElement::new("card", Rect::new(0.0, 0.0, 40.0, 40.0));
//! let bin = MockElement::new("bin", Rect::new(100.0, 0.0, 40.0, 40.0));
//! kernel.draggable(card.as_element(), DraggableOptions::new("card")).unwrap();
//! kernel.droppable(bin.as_element(), DroppableOptions::new("bin")).unwrap();
//!
//! kernel.on(EventKind::DragEnd, |event| {
//!     println!("dropped on {:?}", event.droppable());
//!     Ok(())
//! });
//!
//! kernel.activate(&card.as_element(), &InputEvent::pointer_down(vec2(10.0, 10.0)));
//! kernel.handle_input(&InputEvent::pointer_move(vec2(110.0, 10.0)));
//! assert_eq!(kernel.active_droppable().map(|d| d.id().to_string()), Some("bin".into()));
//!
//! kernel.handle_input(&InputEvent::pointer_up(vec2(110.0, 10.0)));
//! assert!(!kernel.is_dragging());
//! ```
//!
//! # Architecture
//!
//! Sensors emit `drag:*` events through [`Kernel::emit`], which first runs
//! the matching "after" hook across enabled plugins and then notifies bus
//! subscribers. The built-in plugins subscribe to those events to keep their
//! instance state and the host elements in sync; the sortable engine in turn
//! emits `sort:*` events.

pub mod bus;
pub mod data;
pub mod error;
pub mod event;
pub mod hook;
pub mod input;
pub mod kernel;
pub mod options;
pub mod plugin;
pub mod plugins;
pub mod sensors;

// Re-export core types
pub use grapple_core as core;
pub use grapple_core::{Axis, Element, ElementRef, Rect, Vec2};

pub use bus::{EventBus, HandlerId, Subscription};
pub use data::{DataMap, DataValue};
pub use error::{HandlerError, HandlerResult, KernelError, KernelResult};
pub use event::{CancelReason, DragEvent, EventData, EventKind};
pub use hook::{Hook, HookContext, HookFlow, HookResult};
pub use input::{
    InputEvent, InputKind, Key, PointerButton, PointerInput, PointerPhase, TouchInput, TouchPhase,
};
pub use kernel::{Kernel, KernelBuilder, WeakKernel};
pub use options::{
    AnimationOptions, AutoScroll, CollisionFn, CollisionStrategy, KernelOptions, OptionsPatch,
    SensorKind,
};
pub use plugin::{HookPlugin, Plugin, PluginCategory, PluginInfo, PluginRegistry};
pub use plugins::{
    AcceptRule, CollisionAlgorithm, CollisionArgs, CollisionCandidate, CollisionDetector,
    DragManager, Draggable, DraggableOptions, DropManager, Droppable, DroppableOptions,
    GridPosition, Orientation, SortLayout, Sortable, SortableEngine, SortableGridOptions,
    SortableOptions,
};
pub use sensors::{
    DropOutcome, KeyboardSensor, KeyboardSensorOptions, PointerSensor, PointerSensorOptions,
    Sensor, TouchSensor, TouchSensorOptions,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{KernelError, KernelResult};
    pub use crate::event::{CancelReason, DragEvent, EventData, EventKind};
    pub use crate::hook::{Hook, HookContext, HookFlow, HookResult};
    pub use crate::input::{InputEvent, Key};
    pub use crate::kernel::{Kernel, KernelBuilder};
    pub use crate::options::{CollisionStrategy, OptionsPatch, SensorKind};
    pub use crate::plugin::{HookPlugin, Plugin};
    pub use crate::plugins::{
        AcceptRule, CollisionAlgorithm, DraggableOptions, DroppableOptions, SortableGridOptions,
        SortableOptions,
    };

    // Core types
    pub use grapple_core::math::{Vec2, vec2};
    pub use grapple_core::{Axis, Element, ElementRef, Rect};
}
