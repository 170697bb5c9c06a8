//! Input sensors turn raw host input into drag gestures.
//!
//! Every sensor is also a built-in plugin, so it can be looked up by name and
//! is uninstalled (cancelling its drag) when the kernel is destroyed.

mod gesture;
pub mod keyboard;
pub mod pointer;
pub mod touch;

use grapple_core::element::ElementRef;

use crate::input::InputEvent;
use crate::kernel::Kernel;
use crate::options::SensorKind;

pub use gesture::DropOutcome;
pub use keyboard::{Announcer, KeyboardSensor, KeyboardSensorOptions};
pub use pointer::{PointerSensor, PointerSensorOptions};
pub use touch::{TouchSensor, TouchSensorOptions};

pub const POINTER_SENSOR: &str = "pointer-sensor";
pub const TOUCH_SENSOR: &str = "touch-sensor";
pub const KEYBOARD_SENSOR: &str = "keyboard-sensor";

/// Recognizes drag gestures from one kind of input.
///
/// A detached sensor ignores all input. At most one sensor drives a drag at
/// a time (see [`Kernel::claim_sensor`]).
pub trait Sensor: Send + Sync {
    fn kind(&self) -> SensorKind;

    /// Start listening for gestures on `kernel`.
    fn attach(&self, kernel: &Kernel);

    /// Stop listening. An active drag is cancelled programmatically.
    fn detach(&self);

    fn is_attached(&self) -> bool;

    /// Whether this sensor is driving a drag.
    fn is_active(&self) -> bool;

    /// Id of the draggable this sensor is pressing or dragging.
    fn target(&self) -> Option<String>;

    /// Offer an activation gesture on `element`. Returns `true` if the sensor
    /// took it, either starting a drag or holding it pending.
    fn activate(&self, element: &ElementRef, input: &InputEvent) -> bool;

    /// Feed continuous input (moves, releases, keys, blur). Returns `true` if
    /// the input was consumed.
    fn handle_input(&self, input: &InputEvent) -> bool;

    /// Cancel the current gesture, if any, without detaching.
    fn deactivate(&self);
}

static_assertions::assert_obj_safe!(Sensor);
