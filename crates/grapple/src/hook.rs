//! Plugin lifecycle hooks.
//!
//! "Before" hooks are consulted by sensors ahead of a lifecycle step and may
//! veto it. "After" hooks run whenever the kernel emits the matching event
//! (see [`EventKind::hook`](crate::EventKind::hook)).

use std::fmt;

use grapple_core::math::Vec2;

use crate::error::HandlerError;
use crate::event::DragEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeDragStart,
    AfterDragStart,
    BeforeDragMove,
    AfterDragMove,
    AfterDragOver,
    BeforeDragEnd,
    AfterDragEnd,
    AfterSort,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::BeforeDragStart => "beforeDragStart",
            Hook::AfterDragStart => "afterDragStart",
            Hook::BeforeDragMove => "beforeDragMove",
            Hook::AfterDragMove => "afterDragMove",
            Hook::AfterDragOver => "afterDragOver",
            Hook::BeforeDragEnd => "beforeDragEnd",
            Hook::AfterDragEnd => "afterDragEnd",
            Hook::AfterSort => "afterSort",
        }
    }

    /// Whether a [`HookFlow::Veto`] from this hook cancels the step.
    pub fn is_vetoable(self) -> bool {
        matches!(
            self,
            Hook::BeforeDragStart | Hook::BeforeDragMove | Hook::BeforeDragEnd
        )
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook asks the kernel to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFlow {
    #[default]
    Continue,
    Veto,
}

pub type HookResult = Result<HookFlow, HandlerError>;

/// Context passed to every hook invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookContext<'a> {
    pub draggable: Option<&'a str>,
    pub position: Option<Vec2>,
    /// The emitted event, for "after" hooks.
    pub event: Option<&'a DragEvent>,
}

impl<'a> HookContext<'a> {
    /// Context for a "before" hook about to act on `draggable`.
    pub fn before(draggable: &'a str, position: Option<Vec2>) -> Self {
        Self {
            draggable: Some(draggable),
            position,
            event: None,
        }
    }

    /// Context for the "after" hook of an emitted event.
    pub fn for_event(event: &'a DragEvent) -> Self {
        Self {
            draggable: event.draggable(),
            position: event.position(),
            event: Some(event),
        }
    }
}
