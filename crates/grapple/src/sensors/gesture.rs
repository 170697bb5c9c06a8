//! Gesture state machine shared by every sensor.
//!
//! A gesture is idle, pending (pressed but not yet past the activation
//! constraint) or active. Only an active gesture emits drag events, in the
//! order start, moves, then exactly one of end or cancel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use grapple_core::element::ElementRef;
use grapple_core::math::Vec2;
use grapple_core::profiling::profile_function;
use parking_lot::{Mutex, RwLock};

use crate::event::{CancelReason, DragEvent, EventData};
use crate::hook::{Hook, HookContext};
use crate::input::InputEvent;
use crate::kernel::{Kernel, WeakKernel};
use crate::options::SensorKind;
use crate::plugins::drag_manager::Draggable;

/// Result of a gesture that ended with a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    pub draggable: String,
    /// Target under the draggable at release, `None` when vetoed.
    pub droppable: Option<String>,
    pub dropped: bool,
}

/// A press waiting for its activation constraint.
#[derive(Debug, Clone)]
pub(crate) struct PendingGesture {
    pub draggable: String,
    pub origin: Vec2,
    pub since: Instant,
    /// Pointer or touch id the gesture follows.
    pub contact: Option<u64>,
    pub source: InputEvent,
}

impl PendingGesture {
    pub fn moved_beyond(&self, position: Vec2, distance: f32) -> bool {
        (position - self.origin).length() > distance
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.since)
    }
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    draggable: String,
    origin: Vec2,
    position: Vec2,
    over: Option<String>,
    contact: Option<u64>,
}

#[derive(Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Pending(PendingGesture),
    Active(ActiveGesture),
}

pub(crate) struct SensorCore {
    kind: SensorKind,
    kernel: RwLock<Option<WeakKernel>>,
    gesture: Mutex<Gesture>,
}

impl SensorCore {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            kernel: RwLock::new(None),
            gesture: Mutex::new(Gesture::Idle),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn attach(&self, kernel: &Kernel) {
        *self.kernel.write() = Some(kernel.downgrade());
        tracing::debug!(sensor = %self.kind, "Sensor attached");
    }

    /// Cancel any gesture and stop listening.
    pub fn detach(&self) {
        if !self.is_attached() {
            return;
        }
        self.cancel(CancelReason::Programmatic, None);
        *self.kernel.write() = None;
        tracing::debug!(sensor = %self.kind, "Sensor detached");
    }

    pub fn is_attached(&self) -> bool {
        self.kernel.read().is_some()
    }

    pub fn kernel(&self) -> Option<Kernel> {
        self.kernel.read().as_ref()?.upgrade()
    }

    pub fn is_idle(&self) -> bool {
        matches!(*self.gesture.lock(), Gesture::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.gesture.lock(), Gesture::Active(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.gesture.lock(), Gesture::Pending(_))
    }

    pub fn pending(&self) -> Option<PendingGesture> {
        match &*self.gesture.lock() {
            Gesture::Pending(pending) => Some(pending.clone()),
            _ => None,
        }
    }

    /// Contact id of the pending or active gesture.
    pub fn contact(&self) -> Option<u64> {
        match &*self.gesture.lock() {
            Gesture::Idle => None,
            Gesture::Pending(pending) => pending.contact,
            Gesture::Active(active) => active.contact,
        }
    }

    pub fn active_draggable(&self) -> Option<String> {
        match &*self.gesture.lock() {
            Gesture::Active(active) => Some(active.draggable.clone()),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<String> {
        match &*self.gesture.lock() {
            Gesture::Idle => None,
            Gesture::Pending(pending) => Some(pending.draggable.clone()),
            Gesture::Active(active) => Some(active.draggable.clone()),
        }
    }

    pub fn position(&self) -> Option<Vec2> {
        match &*self.gesture.lock() {
            Gesture::Active(active) => Some(active.position),
            _ => None,
        }
    }

    /// Droppable the active gesture is currently over.
    pub fn over(&self) -> Option<String> {
        match &*self.gesture.lock() {
            Gesture::Active(active) => active.over.clone(),
            _ => None,
        }
    }

    /// The enabled draggable a gesture on `element` picks up.
    pub fn resolve(&self, element: &ElementRef) -> Option<Arc<Draggable>> {
        let kernel = self.kernel()?;
        let draggable = kernel.drag_manager().ok()?.find_activator(element)?;
        if draggable.is_disabled() {
            tracing::trace!(draggable = %draggable.id(), "Ignoring disabled draggable");
            return None;
        }
        Some(draggable)
    }

    /// Record a press that activates later.
    pub fn press(&self, draggable: &Draggable, origin: Vec2, contact: Option<u64>, source: InputEvent) {
        *self.gesture.lock() = Gesture::Pending(PendingGesture {
            draggable: draggable.id().to_string(),
            origin,
            since: source.timestamp,
            contact,
            source,
        });
    }

    /// Drop a pending press. Returns `false` if nothing was pending.
    pub fn abort_pending(&self) -> bool {
        let mut gesture = self.gesture.lock();
        if matches!(*gesture, Gesture::Pending(_)) {
            *gesture = Gesture::Idle;
            true
        } else {
            false
        }
    }

    /// Activate the pending press, then move to `position` if it differs from
    /// the press origin.
    pub fn promote(&self, position: Vec2, source: Option<InputEvent>) -> bool {
        let pending = {
            let mut gesture = self.gesture.lock();
            match std::mem::take(&mut *gesture) {
                Gesture::Pending(pending) => pending,
                other => {
                    *gesture = other;
                    return false;
                }
            }
        };

        let started = self.start(
            &pending.draggable,
            pending.origin,
            pending.contact,
            Some(pending.source),
        );
        if started && position != pending.origin {
            self.move_to(position, source);
        }
        started
    }

    /// Begin a drag of `draggable` at `origin`.
    ///
    /// Fails if the sensor is detached or busy, another sensor holds the
    /// claim, or a `BeforeDragStart` hook vetoes.
    pub fn start(
        &self,
        draggable: &str,
        origin: Vec2,
        contact: Option<u64>,
        source: Option<InputEvent>,
    ) -> bool {
        let Some(kernel) = self.kernel() else {
            return false;
        };
        if self.is_active() {
            return false;
        }
        if !kernel.claim_sensor(self.kind) {
            tracing::debug!(sensor = %self.kind, draggable, "Another sensor is driving a drag");
            self.abort_pending();
            return false;
        }
        if !kernel.run_hook(
            Hook::BeforeDragStart,
            &HookContext::before(draggable, Some(origin)),
        ) {
            tracing::debug!(sensor = %self.kind, draggable, "Drag start vetoed");
            kernel.release_sensor(self.kind);
            self.abort_pending();
            return false;
        }

        if let Ok(detector) = kernel.collision_detector() {
            detector.set_pointer(Some(origin));
        }
        *self.gesture.lock() = Gesture::Active(ActiveGesture {
            draggable: draggable.to_string(),
            origin,
            position: origin,
            over: None,
            contact,
        });

        tracing::debug!(sensor = %self.kind, draggable, "Drag started");
        kernel.emit(
            DragEvent::new(EventData::DragStart {
                draggable: draggable.to_string(),
                position: origin,
            })
            .with_source(source),
        );
        true
    }

    /// Move the active drag to `position` and recompute its drop target.
    ///
    /// Returns `false` if no drag is active. A `BeforeDragMove` veto drops
    /// the frame but still counts as handled.
    pub fn move_to(&self, position: Vec2, source: Option<InputEvent>) -> bool {
        profile_function!();
        let Some(kernel) = self.kernel() else {
            return false;
        };
        let Some((draggable, origin)) = self.update_active(|active| {
            (active.draggable.clone(), active.origin)
        }) else {
            return false;
        };

        if !kernel.run_hook(
            Hook::BeforeDragMove,
            &HookContext::before(&draggable, Some(position)),
        ) {
            tracing::trace!(draggable = %draggable, "Drag move vetoed");
            return true;
        }

        if self
            .update_active(|active| active.position = position)
            .is_none()
        {
            return true;
        }
        if let Ok(detector) = kernel.collision_detector() {
            detector.set_pointer(Some(position));
        }

        kernel.emit(
            DragEvent::new(EventData::DragMove {
                draggable: draggable.clone(),
                position,
                delta: position - origin,
            })
            .with_source(source.clone()),
        );

        let target = self.collide(&kernel, &draggable);
        let Some(previous) = self.update_active(|active| {
            std::mem::replace(&mut active.over, target.clone())
        }) else {
            return true;
        };

        if previous != target {
            if let Some(previous) = previous {
                kernel.emit(
                    DragEvent::new(EventData::DragLeave {
                        draggable: draggable.clone(),
                        droppable: previous,
                    })
                    .with_source(source.clone()),
                );
            }
            if let Some(target) = &target {
                kernel.emit(
                    DragEvent::new(EventData::DragEnter {
                        draggable: draggable.clone(),
                        droppable: target.clone(),
                    })
                    .with_source(source.clone()),
                );
            }
        }
        kernel.emit(
            DragEvent::new(EventData::DragOver {
                draggable,
                droppable: target,
            })
            .with_source(source),
        );
        true
    }

    /// Release the active drag over whatever it currently collides with.
    ///
    /// A pending press is dropped without events.
    pub fn end(&self, source: Option<InputEvent>) -> Option<DropOutcome> {
        let active = self.take_active()?;
        let Some(kernel) = self.kernel() else {
            return None;
        };

        let target = self.collide(&kernel, &active.draggable);
        let allowed = kernel.run_hook(
            Hook::BeforeDragEnd,
            &HookContext::before(&active.draggable, Some(active.position)),
        );
        let (droppable, dropped) = if allowed {
            let dropped = target.is_some();
            (target, dropped)
        } else {
            tracing::debug!(draggable = %active.draggable, "Drop vetoed");
            (None, false)
        };

        kernel.release_sensor(self.kind);
        tracing::debug!(
            sensor = %self.kind,
            draggable = %active.draggable,
            droppable = ?droppable,
            dropped,
            "Drag ended"
        );
        kernel.emit(
            DragEvent::new(EventData::DragEnd {
                draggable: active.draggable.clone(),
                droppable: droppable.clone(),
                dropped,
            })
            .with_source(source),
        );
        if let Ok(detector) = kernel.collision_detector() {
            detector.set_pointer(None);
        }

        Some(DropOutcome {
            draggable: active.draggable,
            droppable,
            dropped,
        })
    }

    /// Cancel the active drag. Returns the draggable id if one was active.
    pub fn cancel(&self, reason: CancelReason, source: Option<InputEvent>) -> Option<String> {
        let active = self.take_active()?;
        let Some(kernel) = self.kernel() else {
            return Some(active.draggable);
        };

        kernel.release_sensor(self.kind);
        tracing::debug!(
            sensor = %self.kind,
            draggable = %active.draggable,
            reason = ?reason,
            "Drag cancelled"
        );
        kernel.emit(
            DragEvent::new(EventData::DragCancel {
                draggable: active.draggable.clone(),
                reason,
            })
            .with_source(source),
        );
        if let Ok(detector) = kernel.collision_detector() {
            detector.set_pointer(None);
        }
        Some(active.draggable)
    }

    /// Move out of the active state, also clearing a pending press.
    fn take_active(&self) -> Option<ActiveGesture> {
        match std::mem::take(&mut *self.gesture.lock()) {
            Gesture::Active(active) => Some(active),
            _ => None,
        }
    }

    fn update_active<R>(&self, f: impl FnOnce(&mut ActiveGesture) -> R) -> Option<R> {
        match &mut *self.gesture.lock() {
            Gesture::Active(active) => Some(f(active)),
            _ => None,
        }
    }

    fn collide(&self, kernel: &Kernel, draggable: &str) -> Option<String> {
        let draggable = kernel.drag_manager().ok()?.get(draggable)?;
        let candidates = kernel.drop_manager().ok()?.accepting(&draggable);
        kernel
            .collision_detector()
            .ok()?
            .detect(&draggable, &candidates)
            .map(|droppable| droppable.id().to_string())
    }
}

impl std::fmt::Debug for SensorCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorCore")
            .field("kind", &self.kind)
            .field("attached", &self.is_attached())
            .field("gesture", &*self.gesture.lock())
            .finish()
    }
}
