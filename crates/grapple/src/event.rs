//! Drag, drop and sort lifecycle events.

use std::fmt;
use std::time::Instant;

use grapple_core::math::Vec2;

use crate::hook::Hook;
use crate::input::InputEvent;

/// The twelve event kinds published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DragStart,
    DragMove,
    DragOver,
    DragEnter,
    DragLeave,
    DragEnd,
    DragCancel,
    SortStart,
    SortMove,
    SortEnd,
    SortAdd,
    SortRemove,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::DragStart,
        EventKind::DragMove,
        EventKind::DragOver,
        EventKind::DragEnter,
        EventKind::DragLeave,
        EventKind::DragEnd,
        EventKind::DragCancel,
        EventKind::SortStart,
        EventKind::SortMove,
        EventKind::SortEnd,
        EventKind::SortAdd,
        EventKind::SortRemove,
    ];

    /// Wire name of the event, e.g. `"drag:start"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::DragStart => "drag:start",
            EventKind::DragMove => "drag:move",
            EventKind::DragOver => "drag:over",
            EventKind::DragEnter => "drag:enter",
            EventKind::DragLeave => "drag:leave",
            EventKind::DragEnd => "drag:end",
            EventKind::DragCancel => "drag:cancel",
            EventKind::SortStart => "sort:start",
            EventKind::SortMove => "sort:move",
            EventKind::SortEnd => "sort:end",
            EventKind::SortAdd => "sort:add",
            EventKind::SortRemove => "sort:remove",
        }
    }

    /// Parse a wire name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// The "after" plugin hook run whenever an event of this kind is emitted.
    pub fn hook(self) -> Option<Hook> {
        match self {
            EventKind::DragStart => Some(Hook::AfterDragStart),
            EventKind::DragMove => Some(Hook::AfterDragMove),
            EventKind::DragOver | EventKind::DragEnter | EventKind::DragLeave => {
                Some(Hook::AfterDragOver)
            }
            EventKind::DragEnd | EventKind::DragCancel => Some(Hook::AfterDragEnd),
            EventKind::SortStart | EventKind::SortMove | EventKind::SortEnd => {
                Some(Hook::AfterSort)
            }
            EventKind::SortAdd | EventKind::SortRemove => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a drag was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    Escape,
    Blur,
    Programmatic,
}

/// Kind-specific payload of a [`DragEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    DragStart {
        draggable: String,
        position: Vec2,
    },
    DragMove {
        draggable: String,
        position: Vec2,
        /// Offset from the drag's start position.
        delta: Vec2,
    },
    DragOver {
        draggable: String,
        droppable: Option<String>,
    },
    DragEnter {
        draggable: String,
        droppable: String,
    },
    DragLeave {
        draggable: String,
        droppable: String,
    },
    DragEnd {
        draggable: String,
        droppable: Option<String>,
        /// Whether the drop was accepted.
        dropped: bool,
    },
    DragCancel {
        draggable: String,
        reason: CancelReason,
    },
    SortStart {
        sortable: String,
        item: String,
        index: usize,
    },
    SortMove {
        sortable: String,
        item: String,
        from: usize,
        to: usize,
    },
    /// `to` is the item's final index in the container it ended up in.
    SortEnd {
        sortable: String,
        item: String,
        from: usize,
        to: usize,
    },
    SortAdd {
        sortable: String,
        item: String,
        index: usize,
    },
    SortRemove {
        sortable: String,
        item: String,
        index: usize,
    },
}

impl EventData {
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::DragStart { .. } => EventKind::DragStart,
            EventData::DragMove { .. } => EventKind::DragMove,
            EventData::DragOver { .. } => EventKind::DragOver,
            EventData::DragEnter { .. } => EventKind::DragEnter,
            EventData::DragLeave { .. } => EventKind::DragLeave,
            EventData::DragEnd { .. } => EventKind::DragEnd,
            EventData::DragCancel { .. } => EventKind::DragCancel,
            EventData::SortStart { .. } => EventKind::SortStart,
            EventData::SortMove { .. } => EventKind::SortMove,
            EventData::SortEnd { .. } => EventKind::SortEnd,
            EventData::SortAdd { .. } => EventKind::SortAdd,
            EventData::SortRemove { .. } => EventKind::SortRemove,
        }
    }
}

/// An event published on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent {
    pub data: EventData,
    pub timestamp: Instant,
    /// Raw input that triggered the event; `None` for synthetic and
    /// keyboard-originated events.
    pub source: Option<InputEvent>,
}

impl DragEvent {
    pub fn new(data: EventData) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<InputEvent>) -> Self {
        self.source = source;
        self
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }

    /// Draggable id for drag events, item id for sort events.
    pub fn draggable(&self) -> Option<&str> {
        match &self.data {
            EventData::DragStart { draggable, .. }
            | EventData::DragMove { draggable, .. }
            | EventData::DragOver { draggable, .. }
            | EventData::DragEnter { draggable, .. }
            | EventData::DragLeave { draggable, .. }
            | EventData::DragEnd { draggable, .. }
            | EventData::DragCancel { draggable, .. } => Some(draggable),
            EventData::SortStart { item, .. }
            | EventData::SortMove { item, .. }
            | EventData::SortEnd { item, .. }
            | EventData::SortAdd { item, .. }
            | EventData::SortRemove { item, .. } => Some(item),
        }
    }

    /// Droppable id, for the kinds that carry one.
    pub fn droppable(&self) -> Option<&str> {
        match &self.data {
            EventData::DragEnter { droppable, .. } | EventData::DragLeave { droppable, .. } => {
                Some(droppable)
            }
            EventData::DragOver { droppable, .. } | EventData::DragEnd { droppable, .. } => {
                droppable.as_deref()
            }
            _ => None,
        }
    }

    /// Pointer position, for the kinds that carry one.
    pub fn position(&self) -> Option<Vec2> {
        match &self.data {
            EventData::DragStart { position, .. } | EventData::DragMove { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
