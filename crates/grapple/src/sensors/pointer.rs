//! Mouse and pen input.

use grapple_core::element::ElementRef;

use crate::error::KernelResult;
use crate::event::CancelReason;
use crate::input::{InputEvent, InputKind, Key, PointerButton, PointerPhase};
use crate::kernel::Kernel;
use crate::options::SensorKind;
use crate::plugin::{Plugin, PluginCategory};
use crate::plugins::BUILTIN_VERSION;

use super::gesture::SensorCore;
use super::{POINTER_SENSOR, Sensor};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerSensorOptions {
    /// Distance the pointer must travel after the press before the drag
    /// starts. `0` starts on press.
    pub activation_distance: f32,
}

impl PointerSensorOptions {
    pub fn activation_distance(mut self, distance: f32) -> Self {
        self.activation_distance = distance.max(0.0);
        self
    }
}

/// Drags with the primary button of the primary pointer.
///
/// Escape, blur and pointer-cancel cancel the drag.
#[derive(Debug)]
pub struct PointerSensor {
    options: PointerSensorOptions,
    core: SensorCore,
}

impl PointerSensor {
    pub fn new(options: PointerSensorOptions) -> Self {
        Self {
            options,
            core: SensorCore::new(SensorKind::Pointer),
        }
    }

    pub fn options(&self) -> &PointerSensorOptions {
        &self.options
    }

    /// Whether a press is waiting for the activation distance.
    pub fn is_pending(&self) -> bool {
        self.core.is_pending()
    }

    fn release(&self, input: &InputEvent) -> bool {
        if self.core.abort_pending() {
            return true;
        }
        self.core.end(Some(input.clone())).is_some()
    }

    fn cancel(&self, reason: CancelReason, input: &InputEvent) -> bool {
        if self.core.abort_pending() {
            return true;
        }
        self.core.cancel(reason, Some(input.clone())).is_some()
    }
}

impl Default for PointerSensor {
    fn default() -> Self {
        Self::new(PointerSensorOptions::default())
    }
}

impl Sensor for PointerSensor {
    fn kind(&self) -> SensorKind {
        self.core.kind()
    }

    fn attach(&self, kernel: &Kernel) {
        self.core.attach(kernel);
    }

    fn detach(&self) {
        self.core.abort_pending();
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
        let InputKind::Pointer(pointer) = &input.kind else {
            return false;
        };
        if pointer.phase != PointerPhase::Down
            || pointer.button != PointerButton::Primary
            || !pointer.is_primary
            || !self.core.is_idle()
        {
            return false;
        }
        let Some(draggable) = self.core.resolve(element) else {
            return false;
        };

        if self.options.activation_distance > 0.0 {
            self.core.press(
                &draggable,
                pointer.position,
                Some(pointer.pointer_id),
                input.clone(),
            );
            return true;
        }
        self.core.start(
            draggable.id(),
            pointer.position,
            Some(pointer.pointer_id),
            Some(input.clone()),
        )
    }

    fn handle_input(&self, input: &InputEvent) -> bool {
        if !self.core.is_attached() || self.core.is_idle() {
            return false;
        }

        match &input.kind {
            InputKind::Pointer(pointer) => {
                if self.core.contact() != Some(pointer.pointer_id) {
                    return false;
                }
                match pointer.phase {
                    PointerPhase::Move => {
                        if let Some(pending) = self.core.pending() {
                            if pending
                                .moved_beyond(pointer.position, self.options.activation_distance)
                            {
                                return self.core.promote(pointer.position, Some(input.clone()));
                            }
                            return true;
                        }
                        self.core.move_to(pointer.position, Some(input.clone()))
                    }
                    PointerPhase::Up => self.release(input),
                    PointerPhase::Cancel => self.cancel(CancelReason::Blur, input),
                    PointerPhase::Down => false,
                }
            }
            InputKind::Key(Key::Escape) => self.cancel(CancelReason::Escape, input),
            InputKind::Blur => self.cancel(CancelReason::Blur, input),
            _ => false,
        }
    }

    fn deactivate(&self) {
        self.core.abort_pending();
        self.core.cancel(CancelReason::Programmatic, None);
    }
}

impl Plugin for PointerSensor {
    fn name(&self) -> &str {
        POINTER_SENSOR
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
