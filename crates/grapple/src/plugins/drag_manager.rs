//! Draggable elements and the drag state machine.
//!
//! Each draggable is idle until a `drag:start` names it, follows `drag:move`
//! deltas while dragging, and returns to idle on `drag:end` or `drag:cancel`.
//! At most one draggable is active at a time.

use std::fmt;
use std::sync::{Arc, Weak};

use grapple_core::element::{ElementRef, same_element};
use grapple_core::geometry::{Axis, Rect};
use grapple_core::math::Vec2;
use parking_lot::{Mutex, RwLock};

use crate::bus::Subscription;
use crate::data::{DataMap, DataValue};
use crate::error::{KernelError, KernelResult};
use crate::event::{DragEvent, EventData, EventKind};
use crate::kernel::{Kernel, WeakKernel};
use crate::plugin::{Plugin, PluginCategory};

use super::{BUILTIN_VERSION, DRAG_MANAGER, InstanceMap};

/// Marker attribute set on every registered draggable element.
pub const DRAGGABLE_ATTRIBUTE: &str = "data-grapple-draggable";

/// Per-phase draggable callback.
pub type DragCallback = Arc<dyn Fn(&Draggable, &DragEvent) + Send + Sync>;

/// Options for [`Kernel::draggable`](crate::Kernel::draggable).
#[derive(Clone, Default)]
pub struct DraggableOptions {
    pub id: String,
    pub data: DataMap,
    /// Type tag matched by droppable accept rules.
    pub kind: Option<String>,
    /// When set, only this element starts a drag.
    pub handle: Option<ElementRef>,
    pub disabled: bool,
    pub axis: Axis,
    /// Class applied while dragging.
    pub drag_class: Option<String>,
    /// Keep the platform's native drag behaviour enabled.
    pub allow_native_drag: bool,
    pub on_drag_start: Option<DragCallback>,
    pub on_drag_move: Option<DragCallback>,
    /// Runs on both end and cancel.
    pub on_drag_end: Option<DragCallback>,
}

impl DraggableOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn handle(mut self, handle: ElementRef) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn drag_class(mut self, class: impl Into<String>) -> Self {
        self.drag_class = Some(class.into());
        self
    }

    pub fn allow_native_drag(mut self, allow: bool) -> Self {
        self.allow_native_drag = allow;
        self
    }

    pub fn on_drag_start<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Draggable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drag_start = Some(Arc::new(callback));
        self
    }

    pub fn on_drag_move<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Draggable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drag_move = Some(Arc::new(callback));
        self
    }

    pub fn on_drag_end<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Draggable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drag_end = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for DraggableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraggableOptions")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("kind", &self.kind)
            .field("handle", &self.handle.is_some())
            .field("disabled", &self.disabled)
            .field("axis", &self.axis)
            .field("drag_class", &self.drag_class)
            .field("allow_native_drag", &self.allow_native_drag)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct DraggableState {
    data: DataMap,
    disabled: bool,
    dragging: bool,
    transform: Option<Vec2>,
}

/// A registered draggable element.
pub struct Draggable {
    id: String,
    element: ElementRef,
    handle: Option<ElementRef>,
    kind: Option<String>,
    axis: Axis,
    drag_class: Option<String>,
    allow_native_drag: bool,
    on_drag_start: Option<DragCallback>,
    on_drag_move: Option<DragCallback>,
    on_drag_end: Option<DragCallback>,
    state: Mutex<DraggableState>,
    registry: Weak<DraggableRegistry>,
}

impl Draggable {
    fn new(element: ElementRef, options: DraggableOptions, registry: Weak<DraggableRegistry>) -> Self {
        Self {
            id: options.id,
            element,
            handle: options.handle,
            kind: options.kind,
            axis: options.axis,
            drag_class: options.drag_class,
            allow_native_drag: options.allow_native_drag,
            on_drag_start: options.on_drag_start,
            on_drag_move: options.on_drag_move,
            on_drag_end: options.on_drag_end,
            state: Mutex::new(DraggableState {
                data: options.data,
                disabled: options.disabled,
                ..Default::default()
            }),
            registry,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    pub fn handle(&self) -> Option<&ElementRef> {
        self.handle.as_ref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Current rect of the element, including the drag transform.
    pub fn rect(&self) -> Rect {
        self.element.rect()
    }

    pub fn data(&self) -> DataMap {
        self.state.lock().data.clone()
    }

    pub fn data_value(&self, key: &str) -> Option<DataValue> {
        self.state.lock().data.get(key).cloned()
    }

    pub fn set_data(&self, key: impl Into<String>, value: impl Into<DataValue>) {
        self.state.lock().data.insert(key.into(), value.into());
    }

    pub fn is_disabled(&self) -> bool {
        self.state.lock().disabled
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.state.lock().disabled = disabled;
    }

    pub fn is_dragging(&self) -> bool {
        self.state.lock().dragging
    }

    pub fn transform(&self) -> Option<Vec2> {
        self.state.lock().transform
    }

    /// Whether a gesture on `target` may pick this draggable up.
    ///
    /// With a handle configured only the handle qualifies.
    pub fn is_activator(&self, target: &ElementRef) -> bool {
        match &self.handle {
            Some(handle) => same_element(handle, target),
            None => same_element(&self.element, target),
        }
    }

    /// Offset the element, zeroing the component locked by the axis.
    pub fn set_transform(&self, offset: Vec2) {
        let offset = self.axis.constrain(offset);
        self.state.lock().transform = Some(offset);
        self.element.set_translation(Some(offset));
    }

    /// Restore the element's un-offset appearance.
    pub fn reset_transform(&self) {
        self.state.lock().transform = None;
        self.element.set_translation(None);
    }

    pub fn apply_visual_state(&self) {
        if let Some(class) = &self.drag_class {
            self.element.add_class(class);
        }
    }

    pub fn clear_visual_state(&self) {
        if let Some(class) = &self.drag_class {
            self.element.remove_class(class);
        }
    }

    /// Unregister this draggable. Does nothing if it was already removed or
    /// replaced by a newer registration under the same id.
    pub fn destroy(&self) {
        match self.registry.upgrade() {
            Some(registry) => {
                registry.remove_instance(self);
            }
            None => self.detach(),
        }
    }

    fn attach(&self) {
        self.element.set_attribute(DRAGGABLE_ATTRIBUTE, &self.id);
        if !self.allow_native_drag {
            self.element.set_native_drag(false);
        }
    }

    fn detach(&self) {
        self.state.lock().dragging = false;
        self.element.remove_attribute(DRAGGABLE_ATTRIBUTE);
        self.clear_visual_state();
        self.reset_transform();
        if !self.allow_native_drag {
            self.element.set_native_drag(true);
        }
    }

    fn begin_drag(&self) {
        self.state.lock().dragging = true;
        self.apply_visual_state();
    }

    fn finish_drag(&self) {
        self.state.lock().dragging = false;
        self.reset_transform();
        self.clear_visual_state();
    }

    fn notify(&self, callback: Option<&DragCallback>, event: &DragEvent) {
        if let Some(callback) = callback {
            callback(self, event);
        }
    }
}

impl fmt::Debug for Draggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draggable")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("axis", &self.axis)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct DraggableRegistry {
    instances: RwLock<InstanceMap<Draggable>>,
    active: RwLock<Option<String>>,
    kernel: RwLock<Option<WeakKernel>>,
}

impl DraggableRegistry {
    fn get(&self, id: &str) -> Option<Arc<Draggable>> {
        self.instances.read().get(id).cloned()
    }

    fn remove(&self, id: &str) -> bool {
        let removed = self.instances.write().shift_remove(id);
        match removed {
            Some(instance) => {
                self.finish_removal(&instance);
                true
            }
            None => false,
        }
    }

    fn remove_instance(&self, instance: &Draggable) -> bool {
        let removed = {
            let mut instances = self.instances.write();
            let is_current = instances
                .get(&instance.id)
                .is_some_and(|stored| std::ptr::eq(Arc::as_ptr(stored), instance));
            if is_current {
                instances.shift_remove(&instance.id)
            } else {
                None
            }
        };
        match removed {
            Some(instance) => {
                self.finish_removal(&instance);
                true
            }
            None => false,
        }
    }

    fn finish_removal(&self, instance: &Draggable) {
        instance.detach();
        // A sensor may still be pressing or dragging the removed instance.
        let kernel = self.kernel.read().as_ref().and_then(WeakKernel::upgrade);
        if let Some(kernel) = kernel {
            kernel.cancel_gesture(&instance.id);
        }
        self.clear_active(&instance.id);
        tracing::debug!(draggable = %instance.id, "Unregistered draggable");
    }

    fn clear_active(&self, id: &str) {
        let mut active = self.active.write();
        if active.as_deref() == Some(id) {
            *active = None;
        }
    }

    fn clear(&self) {
        let instances = std::mem::take(&mut *self.instances.write());
        *self.active.write() = None;
        for instance in instances.values() {
            instance.detach();
        }
    }

    fn handle_event(&self, event: &DragEvent) {
        match &event.data {
            EventData::DragStart { draggable, .. } => {
                let Some(instance) = self.get(draggable) else {
                    tracing::warn!(draggable = %draggable, "drag:start for unknown draggable");
                    return;
                };
                *self.active.write() = Some(draggable.clone());
                instance.begin_drag();
                instance.notify(instance.on_drag_start.as_ref(), event);
            }
            EventData::DragMove {
                draggable, delta, ..
            } => {
                if let Some(instance) = self.get(draggable) {
                    instance.set_transform(*delta);
                    instance.notify(instance.on_drag_move.as_ref(), event);
                }
            }
            EventData::DragEnd { draggable, .. } | EventData::DragCancel { draggable, .. } => {
                self.clear_active(draggable);
                if let Some(instance) = self.get(draggable) {
                    instance.finish_drag();
                    instance.notify(instance.on_drag_end.as_ref(), event);
                }
            }
            _ => {}
        }
    }
}

/// Plugin owning every [`Draggable`] and the active-draggable state.
pub struct DragManager {
    registry: Arc<DraggableRegistry>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DragManager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(DraggableRegistry::default()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register a draggable.
    ///
    /// Sets the marker attribute and, unless allowed by the options,
    /// disables native drag on the element.
    ///
    /// # Errors
    ///
    /// [`KernelError::DuplicateDraggable`] if the id is taken.
    pub fn register(
        &self,
        element: ElementRef,
        options: DraggableOptions,
    ) -> KernelResult<Arc<Draggable>> {
        let id = options.id.clone();
        let instance = Arc::new(Draggable::new(
            element,
            options,
            Arc::downgrade(&self.registry),
        ));

        {
            let mut instances = self.registry.instances.write();
            if instances.contains_key(&id) {
                return Err(KernelError::DuplicateDraggable(id));
            }
            instances.insert(id.clone(), Arc::clone(&instance));
        }

        instance.attach();
        tracing::debug!(draggable = %id, "Registered draggable");
        Ok(instance)
    }

    /// Destroy the draggable with this id. Returns `false` if unknown.
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Draggable>> {
        self.registry.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.instances.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.registry.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.instances.read().is_empty()
    }

    /// All draggables in registration order.
    pub fn all(&self) -> Vec<Arc<Draggable>> {
        self.registry.instances.read().values().cloned().collect()
    }

    /// The draggable currently being dragged.
    pub fn active(&self) -> Option<Arc<Draggable>> {
        let id = self.registry.active.read().clone()?;
        self.registry.get(&id)
    }

    /// The draggable a gesture on `target` would pick up.
    pub fn find_activator(&self, target: &ElementRef) -> Option<Arc<Draggable>> {
        self.registry
            .instances
            .read()
            .values()
            .find(|draggable| draggable.is_activator(target))
            .cloned()
    }
}

impl Default for DragManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DragManager {
    fn name(&self) -> &str {
        DRAG_MANAGER
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Core
    }

    fn install(&self, kernel: &Kernel) -> KernelResult<()> {
        *self.registry.kernel.write() = Some(kernel.downgrade());
        let mut subscriptions = self.subscriptions.lock();
        for kind in [
            EventKind::DragStart,
            EventKind::DragMove,
            EventKind::DragEnd,
            EventKind::DragCancel,
        ] {
            let registry = Arc::clone(&self.registry);
            subscriptions.push(kernel.on(kind, move |event| {
                registry.handle_event(event);
                Ok(())
            }));
        }
        Ok(())
    }

    fn uninstall(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        *self.registry.kernel.write() = None;
        self.registry.clear();
    }
}
