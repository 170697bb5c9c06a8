//! Drop targets.

use std::fmt;
use std::sync::{Arc, Weak};

use grapple_core::element::{ElementRef, same_element};
use grapple_core::geometry::Rect;
use parking_lot::{Mutex, RwLock};

use crate::bus::Subscription;
use crate::data::{DataMap, DataValue};
use crate::error::{KernelError, KernelResult};
use crate::event::{DragEvent, EventData, EventKind};
use crate::kernel::Kernel;
use crate::plugin::{Plugin, PluginCategory};

use super::drag_manager::Draggable;
use super::{BUILTIN_VERSION, DROP_MANAGER, InstanceMap};

/// Marker attribute set on every registered droppable element.
pub const DROPPABLE_ATTRIBUTE: &str = "data-grapple-droppable";

/// Per-phase droppable callback.
pub type DropCallback = Arc<dyn Fn(&Droppable, &DragEvent) + Send + Sync>;

/// Custom accept predicate.
pub type AcceptFn = Arc<dyn Fn(&Draggable) -> bool + Send + Sync>;

/// Which draggables a droppable accepts.
#[derive(Clone, Default)]
pub enum AcceptRule {
    #[default]
    Any,
    /// Draggables whose kind equals this tag.
    Type(String),
    /// Draggables whose kind is one of these tags.
    Types(Vec<String>),
    Predicate(AcceptFn),
}

impl AcceptRule {
    pub fn predicate<F>(accept: F) -> Self
    where
        F: Fn(&Draggable) -> bool + Send + Sync + 'static,
    {
        AcceptRule::Predicate(Arc::new(accept))
    }

    /// Evaluate the rule. A draggable without a kind never matches a type
    /// rule.
    pub fn accepts(&self, draggable: &Draggable) -> bool {
        match self {
            AcceptRule::Any => true,
            AcceptRule::Type(kind) => draggable.kind() == Some(kind.as_str()),
            AcceptRule::Types(kinds) => draggable
                .kind()
                .is_some_and(|kind| kinds.iter().any(|k| k == kind)),
            AcceptRule::Predicate(accept) => accept(draggable),
        }
    }
}

impl fmt::Debug for AcceptRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptRule::Any => f.write_str("Any"),
            AcceptRule::Type(kind) => f.debug_tuple("Type").field(kind).finish(),
            AcceptRule::Types(kinds) => f.debug_tuple("Types").field(kinds).finish(),
            AcceptRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Options for [`Kernel::droppable`](crate::Kernel::droppable).
#[derive(Clone, Default)]
pub struct DroppableOptions {
    pub id: String,
    pub data: DataMap,
    pub disabled: bool,
    pub accept: AcceptRule,
    /// Class applied while an accepted draggable hovers.
    pub over_class: Option<String>,
    /// Class applied to every accepting droppable while a drag is active.
    pub active_class: Option<String>,
    pub on_drag_enter: Option<DropCallback>,
    pub on_drag_leave: Option<DropCallback>,
    pub on_drop: Option<DropCallback>,
}

impl DroppableOptions {
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

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn accept(mut self, accept: AcceptRule) -> Self {
        self.accept = accept;
        self
    }

    pub fn over_class(mut self, class: impl Into<String>) -> Self {
        self.over_class = Some(class.into());
        self
    }

    pub fn active_class(mut self, class: impl Into<String>) -> Self {
        self.active_class = Some(class.into());
        self
    }

    pub fn on_drag_enter<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Droppable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drag_enter = Some(Arc::new(callback));
        self
    }

    pub fn on_drag_leave<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Droppable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drag_leave = Some(Arc::new(callback));
        self
    }

    pub fn on_drop<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Droppable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_drop = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for DroppableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DroppableOptions")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("disabled", &self.disabled)
            .field("accept", &self.accept)
            .field("over_class", &self.over_class)
            .field("active_class", &self.active_class)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct DroppableState {
    data: DataMap,
    disabled: bool,
    over: bool,
    highlighted: bool,
}

/// A registered drop target.
pub struct Droppable {
    id: String,
    element: ElementRef,
    accept: AcceptRule,
    over_class: Option<String>,
    active_class: Option<String>,
    on_drag_enter: Option<DropCallback>,
    on_drag_leave: Option<DropCallback>,
    on_drop: Option<DropCallback>,
    state: Mutex<DroppableState>,
    registry: Weak<DroppableRegistry>,
}

impl Droppable {
    fn new(element: ElementRef, options: DroppableOptions, registry: Weak<DroppableRegistry>) -> Self {
        Self {
            id: options.id,
            element,
            accept: options.accept,
            over_class: options.over_class,
            active_class: options.active_class,
            on_drag_enter: options.on_drag_enter,
            on_drag_leave: options.on_drag_leave,
            on_drop: options.on_drop,
            state: Mutex::new(DroppableState {
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

    pub fn rect(&self) -> Rect {
        self.element.rect()
    }

    pub fn accept_rule(&self) -> &AcceptRule {
        &self.accept
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

    /// Whether `draggable` may be dropped here. Disabled droppables accept
    /// nothing.
    pub fn can_accept(&self, draggable: &Draggable) -> bool {
        !self.is_disabled() && self.accept.accepts(draggable)
    }

    pub fn is_over(&self) -> bool {
        self.state.lock().over
    }

    /// Set the hover flag and toggle the over class.
    pub fn set_over(&self, over: bool) {
        self.state.lock().over = over;
        if let Some(class) = &self.over_class {
            if over {
                self.element.add_class(class);
            } else {
                self.element.remove_class(class);
            }
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.state.lock().highlighted
    }

    /// Set the "can receive the current drag" flag and toggle the active
    /// class.
    pub fn set_highlighted(&self, highlighted: bool) {
        self.state.lock().highlighted = highlighted;
        if let Some(class) = &self.active_class {
            if highlighted {
                self.element.add_class(class);
            } else {
                self.element.remove_class(class);
            }
        }
    }

    /// Unregister this droppable. Does nothing if it was already removed or
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
        self.element.set_attribute(DROPPABLE_ATTRIBUTE, &self.id);
    }

    fn detach(&self) {
        self.element.remove_attribute(DROPPABLE_ATTRIBUTE);
        self.reset();
    }

    /// Clear hover and highlight, touching the element only where needed.
    fn reset(&self) {
        let (over, highlighted) = {
            let state = self.state.lock();
            (state.over, state.highlighted)
        };
        if over {
            self.set_over(false);
        }
        if highlighted {
            self.set_highlighted(false);
        }
    }

    fn notify(&self, callback: Option<&DropCallback>, event: &DragEvent) {
        if let Some(callback) = callback {
            callback(self, event);
        }
    }
}

impl fmt::Debug for Droppable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Droppable")
            .field("id", &self.id)
            .field("accept", &self.accept)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct DroppableRegistry {
    instances: RwLock<InstanceMap<Droppable>>,
    active: RwLock<Option<String>>,
}

impl DroppableRegistry {
    fn get(&self, id: &str) -> Option<Arc<Droppable>> {
        self.instances.read().get(id).cloned()
    }

    fn snapshot(&self) -> Vec<Arc<Droppable>> {
        self.instances.read().values().cloned().collect()
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

    fn remove_instance(&self, instance: &Droppable) -> bool {
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

    fn finish_removal(&self, instance: &Droppable) {
        self.clear_active(&instance.id);
        instance.detach();
        tracing::debug!(droppable = %instance.id, "Unregistered droppable");
    }

    fn clear_active(&self, id: &str) {
        let mut active = self.active.write();
        if active.as_deref() == Some(id) {
            *active = None;
        }
    }

    fn accepting(&self, draggable: &Draggable) -> Vec<Arc<Droppable>> {
        self.snapshot()
            .into_iter()
            .filter(|droppable| {
                !same_element(&droppable.element, draggable.element())
                    && droppable.can_accept(draggable)
            })
            .collect()
    }

    fn reset_all(&self) {
        *self.active.write() = None;
        for droppable in self.snapshot() {
            droppable.reset();
        }
    }

    fn clear(&self) {
        let instances = std::mem::take(&mut *self.instances.write());
        *self.active.write() = None;
        for instance in instances.values() {
            instance.detach();
        }
    }

    /// Move the hover from the current target to `next`.
    fn hover(&self, next: Option<&str>) {
        let previous = {
            let mut active = self.active.write();
            if active.as_deref() == next {
                return;
            }
            std::mem::replace(&mut *active, next.map(str::to_string))
        };
        if let Some(previous) = previous.and_then(|id| self.get(&id)) {
            previous.set_over(false);
        }
        if let Some(next) = next.and_then(|id| self.get(id)) {
            next.set_over(true);
        }
    }

    fn handle_event(&self, event: &DragEvent, kernel: Option<Kernel>) {
        match &event.data {
            EventData::DragStart { draggable, .. } => {
                let Some(draggable) = kernel
                    .and_then(|kernel| kernel.drag_manager().ok())
                    .and_then(|manager| manager.get(draggable))
                else {
                    return;
                };
                for droppable in self.accepting(&draggable) {
                    droppable.set_highlighted(true);
                }
            }
            EventData::DragEnter { droppable, .. } => {
                self.hover(Some(droppable.as_str()));
                if let Some(target) = self.get(droppable) {
                    target.notify(target.on_drag_enter.as_ref(), event);
                }
            }
            EventData::DragLeave { droppable, .. } => {
                self.clear_active(droppable);
                if let Some(target) = self.get(droppable) {
                    target.set_over(false);
                    target.notify(target.on_drag_leave.as_ref(), event);
                }
            }
            EventData::DragOver { droppable, .. } => {
                self.hover(droppable.as_deref());
            }
            EventData::DragEnd {
                droppable, dropped, ..
            } => {
                if *dropped
                    && let Some(target) = droppable.as_deref().and_then(|id| self.get(id))
                {
                    target.notify(target.on_drop.as_ref(), event);
                }
                self.reset_all();
            }
            EventData::DragCancel { .. } => self.reset_all(),
            _ => {}
        }
    }
}

/// Plugin owning every [`Droppable`] and the active-droppable state.
pub struct DropManager {
    registry: Arc<DroppableRegistry>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DropManager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(DroppableRegistry::default()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register a droppable.
    ///
    /// # Errors
    ///
    /// [`KernelError::DuplicateDroppable`] if the id is taken.
    pub fn register(
        &self,
        element: ElementRef,
        options: DroppableOptions,
    ) -> KernelResult<Arc<Droppable>> {
        let id = options.id.clone();
        let instance = Arc::new(Droppable::new(
            element,
            options,
            Arc::downgrade(&self.registry),
        ));

        {
            let mut instances = self.registry.instances.write();
            if instances.contains_key(&id) {
                return Err(KernelError::DuplicateDroppable(id));
            }
            instances.insert(id.clone(), Arc::clone(&instance));
        }

        instance.attach();
        tracing::debug!(droppable = %id, "Registered droppable");
        Ok(instance)
    }

    /// Destroy the droppable with this id. Returns `false` if unknown.
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Droppable>> {
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

    /// All droppables in registration order.
    pub fn all(&self) -> Vec<Arc<Droppable>> {
        self.registry.snapshot()
    }

    /// The droppable currently hovered by the active draggable.
    pub fn active(&self) -> Option<Arc<Droppable>> {
        let id = self.registry.active.read().clone()?;
        self.registry.get(&id)
    }

    /// Collision candidates for `draggable`: enabled droppables accepting it,
    /// in registration order, excluding one bound to the draggable's own element.
    pub fn accepting(&self, draggable: &Draggable) -> Vec<Arc<Droppable>> {
        self.registry.accepting(draggable)
    }
}

impl Default for DropManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DropManager {
    fn name(&self) -> &str {
        DROP_MANAGER
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Core
    }

    fn install(&self, kernel: &Kernel) -> KernelResult<()> {
        let mut subscriptions = self.subscriptions.lock();
        for kind in [
            EventKind::DragStart,
            EventKind::DragEnter,
            EventKind::DragLeave,
            EventKind::DragOver,
            EventKind::DragEnd,
            EventKind::DragCancel,
        ] {
            let registry = Arc::clone(&self.registry);
            let weak = kernel.downgrade();
            subscriptions.push(kernel.on(kind, move |event| {
                registry.handle_event(event, weak.upgrade());
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
        self.registry.clear();
    }
}
