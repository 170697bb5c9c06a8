//! Touch input with an optional press-and-hold delay.

use std::time::{Duration, Instant};

use grapple_core::element::ElementRef;

use crate::error::KernelResult;
use crate::event::CancelReason;
use crate::input::{InputEvent, InputKind, TouchPhase};
use crate::kernel::Kernel;
use crate::options::SensorKind;
use crate::plugin::{Plugin, PluginCategory};
use crate::plugins::BUILTIN_VERSION;

use super::gesture::SensorCore;
use super::{Sensor, TOUCH_SENSOR};

#[derive(Debug, Clone, PartialEq)]
pub struct TouchSensorOptions {
    /// How long the touch must be held before the drag starts. Zero starts
    /// on touch.
    pub delay: Duration,
    /// Movement allowed during the delay before the press is abandoned.
    pub tolerance: f32,
}

impl Default for TouchSensorOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            tolerance: 5.0,
        }
    }
}

impl TouchSensorOptions {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }
}

/// Drags with a single touch contact.
#[derive(Debug)]
pub struct TouchSensor {
    options: TouchSensorOptions,
    core: SensorCore,
}

impl TouchSensor {
    pub fn new(options: TouchSensorOptions) -> Self {
        Self {
            options,
            core: SensorCore::new(SensorKind::Touch),
        }
    }

    pub fn options(&self) -> &TouchSensorOptions {
        &self.options
    }

    /// Whether a touch is being held, waiting for the delay.
    pub fn is_pending(&self) -> bool {
        self.core.is_pending()
    }

    /// Start a held touch whose delay has elapsed by `now`.
    ///
    /// Hosts without a steady stream of touch moves call this from a timer.
    pub fn poll(&self, now: Instant) -> bool {
        let Some(pending) = self.core.pending() else {
            return false;
        };
        if pending.elapsed(now) < self.options.delay {
            return false;
        }
        self.core.promote(pending.origin, None)
    }
}

impl Default for TouchSensor {
    fn default() -> Self {
        Self::new(TouchSensorOptions::default())
    }
}

impl Sensor for TouchSensor {
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
        let InputKind::Touch(touch) = &input.kind else {
            return false;
        };
        if touch.phase != TouchPhase::Start || !self.core.is_idle() {
            return false;
        }
        let Some(draggable) = self.core.resolve(element) else {
            return false;
        };

        if self.options.delay > Duration::ZERO {
            self.core
                .press(&draggable, touch.position, Some(touch.touch_id), input.clone());
            return true;
        }
        self.core.start(
            draggable.id(),
            touch.position,
            Some(touch.touch_id),
            Some(input.clone()),
        )
    }

    fn handle_input(&self, input: &InputEvent) -> bool {
        if !self.core.is_attached() || self.core.is_idle() {
            return false;
        }

        match &input.kind {
            InputKind::Touch(touch) => {
                if self.core.contact() != Some(touch.touch_id) {
                    return false;
                }

                if let Some(pending) = self.core.pending() {
                    return match touch.phase {
                        TouchPhase::Move
                            if pending.moved_beyond(touch.position, self.options.tolerance) =>
                        {
                            tracing::trace!(touch = touch.touch_id, "Touch moved before delay");
                            self.core.abort_pending()
                        }
                        TouchPhase::Move
                            if pending.elapsed(input.timestamp) >= self.options.delay =>
                        {
                            self.core.promote(touch.position, Some(input.clone()))
                        }
                        TouchPhase::Move => true,
                        TouchPhase::End | TouchPhase::Cancel => self.core.abort_pending(),
                        TouchPhase::Start => false,
                    };
                }

                match touch.phase {
                    TouchPhase::Move => self.core.move_to(touch.position, Some(input.clone())),
                    TouchPhase::End => self.core.end(Some(input.clone())).is_some(),
                    TouchPhase::Cancel => self
                        .core
                        .cancel(CancelReason::Blur, Some(input.clone()))
                        .is_some(),
                    TouchPhase::Start => false,
                }
            }
            InputKind::Blur => {
                self.core.abort_pending()
                    || self
                        .core
                        .cancel(CancelReason::Blur, Some(input.clone()))
                        .is_some()
            }
            _ => false,
        }
    }

    fn deactivate(&self) {
        self.core.abort_pending();
        self.core.cancel(CancelReason::Programmatic, None);
    }
}

impl Plugin for TouchSensor {
    fn name(&self) -> &str {
        TOUCH_SENSOR
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::DraggableOptions;
    use grapple_core::Rect;
    use grapple_core::math::Vec2;
    use grapple_test_utils::MockElement;
    use std::sync::Arc;

    fn kernel_with(options: TouchSensorOptions) -> (Kernel, Arc<MockElement>, Arc<TouchSensor>) {
        let kernel = Kernel::builder()
            .sensors([SensorKind::Touch])
            .touch_options(options)
            .build()
            .unwrap();
        let card = MockElement::new("card", Rect::new(0.0, 0.0, 20.0, 20.0));
        kernel
            .draggable(card.as_element(), DraggableOptions::new("card"))
            .unwrap();
        let sensor = kernel.plugin_as::<TouchSensor>(TOUCH_SENSOR).unwrap();
        (kernel, card, sensor)
    }

    #[test]
    fn test_touch_without_delay() {
        let (kernel, card, _) = kernel_with(TouchSensorOptions::default());
        assert!(kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO)));
        assert!(kernel.is_dragging());

        kernel.handle_input(&InputEvent::touch_move(Vec2::new(0.0, 30.0)));
        assert_eq!(card.translation(), Some(Vec2::new(0.0, 30.0)));

        assert!(kernel.handle_input(&InputEvent::touch_end(Vec2::new(0.0, 30.0))));
        assert!(!kernel.is_dragging());
    }

    #[test]
    fn test_delay_waits_for_hold() {
        let options = TouchSensorOptions::default().delay(Duration::from_millis(200));
        let (kernel, card, sensor) = kernel_with(options);
        let t0 = Instant::now();

        kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO).at(t0));
        assert!(sensor.is_pending());
        assert!(!kernel.is_dragging());

        // Within tolerance, before the delay.
        kernel.handle_input(
            &InputEvent::touch_move(Vec2::new(2.0, 0.0)).at(t0 + Duration::from_millis(50)),
        );
        assert!(!kernel.is_dragging());

        assert!(!sensor.poll(t0 + Duration::from_millis(100)));
        assert!(sensor.poll(t0 + Duration::from_millis(250)));
        assert!(kernel.is_dragging());
    }

    #[test]
    fn test_move_beyond_tolerance_aborts() {
        let options = TouchSensorOptions::default()
            .delay(Duration::from_millis(200))
            .tolerance(5.0);
        let (kernel, card, sensor) = kernel_with(options);
        let t0 = Instant::now();

        kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO).at(t0));
        kernel.handle_input(
            &InputEvent::touch_move(Vec2::new(20.0, 0.0)).at(t0 + Duration::from_millis(50)),
        );
        assert!(!sensor.is_pending());
        assert!(!sensor.poll(t0 + Duration::from_secs(1)));
        assert!(!kernel.is_dragging());
    }

    #[test]
    fn test_move_after_delay_promotes() {
        let options = TouchSensorOptions::default().delay(Duration::from_millis(100));
        let (kernel, card, _) = kernel_with(options);
        let t0 = Instant::now();

        kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO).at(t0));
        kernel.handle_input(
            &InputEvent::touch_move(Vec2::new(3.0, 0.0)).at(t0 + Duration::from_millis(150)),
        );
        assert!(kernel.is_dragging());
        assert_eq!(card.translation(), Some(Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_touch_cancel_and_blur() {
        let (kernel, card, _) = kernel_with(TouchSensorOptions::default());
        kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO));
        assert!(kernel.handle_input(&InputEvent::touch_cancel(Vec2::ZERO)));
        assert!(!kernel.is_dragging());

        kernel.activate(&card.as_element(), &InputEvent::touch_start(Vec2::ZERO));
        assert!(kernel.handle_input(&InputEvent::blur()));
        assert!(!kernel.is_dragging());
    }
}
