//! Keyboard dragging with screen reader announcements.
//!
//! Space or Enter on a focused draggable picks it up and drops it again,
//! arrow keys move it by a fixed step, Escape cancels. Tab and loss of focus
//! cancel as a blur.

use std::fmt;
use std::sync::Arc;

use grapple_core::element::ElementRef;
use grapple_core::math::Vec2;
use parking_lot::Mutex;

use crate::error::KernelResult;
use crate::event::CancelReason;
use crate::input::{InputEvent, InputKind, Key};
use crate::kernel::Kernel;
use crate::options::SensorKind;
use crate::plugin::{Plugin, PluginCategory};
use crate::plugins::BUILTIN_VERSION;

use super::gesture::{DropOutcome, SensorCore};
use super::{KEYBOARD_SENSOR, Sensor};

/// Receives accessibility announcements, e.g. to fill a live region.
pub type Announcer = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
pub struct KeyboardSensorOptions {
    /// Distance moved per arrow key press.
    pub step: f32,
    pub announcer: Option<Announcer>,
}

impl Default for KeyboardSensorOptions {
    fn default() -> Self {
        Self {
            step: 25.0,
            announcer: None,
        }
    }
}

impl KeyboardSensorOptions {
    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn announcer<F>(mut self, announcer: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.announcer = Some(Arc::new(announcer));
        self
    }
}

impl fmt::Debug for KeyboardSensorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardSensorOptions")
            .field("step", &self.step)
            .field("announcer", &self.announcer.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct KeyboardSensor {
    options: KeyboardSensorOptions,
    core: SensorCore,
    last_announcement: Mutex<Option<String>>,
}

impl KeyboardSensor {
    pub fn new(options: KeyboardSensorOptions) -> Self {
        Self {
            options,
            core: SensorCore::new(SensorKind::Keyboard),
            last_announcement: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &KeyboardSensorOptions {
        &self.options
    }

    /// The most recent announcement, if accessibility is enabled.
    pub fn last_announcement(&self) -> Option<String> {
        self.last_announcement.lock().clone()
    }

    fn announce(&self, message: String) {
        let Some(kernel) = self.core.kernel() else {
            return;
        };
        if !kernel.accessibility() {
            return;
        }
        tracing::trace!(message = %message, "Announcement");
        *self.last_announcement.lock() = Some(message.clone());
        if let Some(announcer) = &self.options.announcer {
            announcer(&message);
        }
    }

    fn pick_up(&self, element: &ElementRef, input: &InputEvent) -> bool {
        let Some(draggable) = self.core.resolve(element) else {
            return false;
        };
        let started = self.core.start(
            draggable.id(),
            draggable.rect().center(),
            None,
            Some(input.clone()),
        );
        if started {
            self.announce(format!("Picked up draggable item {}.", draggable.id()));
        }
        started
    }

    fn drop_active(&self, input: &InputEvent) -> bool {
        let Some(outcome) = self.core.end(Some(input.clone())) else {
            return false;
        };
        let DropOutcome {
            draggable,
            droppable,
            ..
        } = outcome;
        self.announce(match droppable {
            Some(droppable) => format!(
                "Draggable item {} was dropped over droppable area {}.",
                draggable, droppable
            ),
            None => format!("Draggable item {} was dropped.", draggable),
        });
        true
    }

    fn step_active(&self, direction: Vec2, input: &InputEvent) -> bool {
        let Some(position) = self.core.position() else {
            return false;
        };
        let before = self.core.over();
        if !self
            .core
            .move_to(position + direction * self.options.step, Some(input.clone()))
        {
            return false;
        }

        let after = self.core.over();
        if let Some(draggable) = self.core.active_draggable()
            && before != after
        {
            self.announce(match after {
                Some(droppable) => format!(
                    "Draggable item {} was moved over droppable area {}.",
                    draggable, droppable
                ),
                None => format!(
                    "Draggable item {} is no longer over a droppable area.",
                    draggable
                ),
            });
        }
        true
    }

    fn cancel_active(&self, reason: CancelReason, input: Option<&InputEvent>) -> bool {
        let Some(draggable) = self.core.cancel(reason, input.cloned()) else {
            return false;
        };
        self.announce(format!(
            "Dragging was cancelled. Draggable item {} was returned to its starting position.",
            draggable
        ));
        true
    }
}

impl Default for KeyboardSensor {
    fn default() -> Self {
        Self::new(KeyboardSensorOptions::default())
    }
}

impl Sensor for KeyboardSensor {
    fn kind(&self) -> SensorKind {
        self.core.kind()
    }

    fn attach(&self, kernel: &Kernel) {
        self.core.attach(kernel);
    }

    fn detach(&self) {
        if self.core.is_attached() {
            self.cancel_active(CancelReason::Programmatic, None);
        }
        self.core.detach();
    }

    fn is_attached(&self) -> bool {
        self.core.is_attached()
    }

    fn is_active(&self) -> bool {
        self.core.is_active()
    }

    fn target(&self) -> Option<String> {
        self.core.target()
    }

    fn activate(&self, element: &ElementRef, input: &InputEvent) -> bool {
        if !self.core.is_attached() {
            return false;
        }
        match &input.kind {
            InputKind::Key(Key::Space | Key::Enter) if self.core.is_active() => {
                self.drop_active(input)
            }
            InputKind::Key(Key::Space | Key::Enter) => self.pick_up(element, input),
            _ => false,
        }
    }

    fn handle_input(&self, input: &InputEvent) -> bool {
        if !self.core.is_attached() || !self.core.is_active() {
            return false;
        }

        match &input.kind {
            InputKind::Key(Key::Space | Key::Enter) => self.drop_active(input),
            InputKind::Key(Key::Escape) => self.cancel_active(CancelReason::Escape, Some(input)),
            InputKind::Key(Key::Tab) | InputKind::Blur => {
                self.cancel_active(CancelReason::Blur, Some(input))
            }
            InputKind::Key(key) => match key.direction() {
                Some(direction) => self.step_active(direction, input),
                None => false,
            },
            _ => false,
        }
    }

    fn deactivate(&self) {
        self.cancel_active(CancelReason::Programmatic, None);
    }
}

impl Plugin for KeyboardSensor {
    fn name(&self) -> &str {
        KEYBOARD_SENSOR
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
        Sensor::detach(self);
    }
}
