//! Raw host input fed to sensors.
//!
//! Hosts translate their native pointer, touch and keyboard events into
//! [`InputEvent`]s and hand them to the kernel (see
//! [`Kernel::activate`](crate::Kernel::activate) and
//! [`Kernel::handle_input`](crate::Kernel::handle_input)). The original input
//! that triggered a drag event is carried along as its `source`.

use std::time::Instant;

use grapple_core::math::Vec2;

/// Phase of a pointer (mouse or pen) interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub pointer_id: u64,
    pub position: Vec2,
    pub button: PointerButton,
    /// Whether this is the primary pointer of its type.
    pub is_primary: bool,
}

/// Phase of a touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub touch_id: u64,
    pub position: Vec2,
}

/// Keys the keyboard sensor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Enter,
    Escape,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// Unit direction for arrow keys, in screen coordinates (y grows down).
    pub fn direction(&self) -> Option<Vec2> {
        match self {
            Key::ArrowUp => Some(Vec2::new(0.0, -1.0)),
            Key::ArrowDown => Some(Vec2::new(0.0, 1.0)),
            Key::ArrowLeft => Some(Vec2::new(-1.0, 0.0)),
            Key::ArrowRight => Some(Vec2::new(1.0, 0.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    Pointer(PointerInput),
    Touch(TouchInput),
    /// A key press.
    Key(Key),
    /// The host window or document lost focus.
    Blur,
}

/// A timestamped raw input event.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub timestamp: Instant,
}

impl InputEvent {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Override the timestamp, e.g. for replaying recorded input.
    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn pointer(phase: PointerPhase, position: Vec2) -> Self {
        Self::new(InputKind::Pointer(PointerInput {
            phase,
            pointer_id: 1,
            position,
            button: PointerButton::Primary,
            is_primary: true,
        }))
    }

    /// Primary-button press of the primary pointer.
    pub fn pointer_down(position: Vec2) -> Self {
        Self::pointer(PointerPhase::Down, position)
    }

    pub fn pointer_move(position: Vec2) -> Self {
        Self::pointer(PointerPhase::Move, position)
    }

    pub fn pointer_up(position: Vec2) -> Self {
        Self::pointer(PointerPhase::Up, position)
    }

    pub fn pointer_cancel(position: Vec2) -> Self {
        Self::pointer(PointerPhase::Cancel, position)
    }

    fn touch(phase: TouchPhase, position: Vec2) -> Self {
        Self::new(InputKind::Touch(TouchInput {
            phase,
            touch_id: 0,
            position,
        }))
    }

    pub fn touch_start(position: Vec2) -> Self {
        Self::touch(TouchPhase::Start, position)
    }

    pub fn touch_move(position: Vec2) -> Self {
        Self::touch(TouchPhase::Move, position)
    }

    pub fn touch_end(position: Vec2) -> Self {
        Self::touch(TouchPhase::End, position)
    }

    pub fn touch_cancel(position: Vec2) -> Self {
        Self::touch(TouchPhase::Cancel, position)
    }

    pub fn key(key: Key) -> Self {
        Self::new(InputKind::Key(key))
    }

    pub fn blur() -> Self {
        Self::new(InputKind::Blur)
    }

    /// Position carried by pointer and touch input.
    pub fn position(&self) -> Option<Vec2> {
        match &self.kind {
            InputKind::Pointer(pointer) => Some(pointer.position),
            InputKind::Touch(touch) => Some(touch.position),
            InputKind::Key(_) | InputKind::Blur => None,
        }
    }
}
