//! Sortable lists and grids.
//!
//! A sortable container owns an ordered sequence of item ids. Each item is
//! expected to be registered by the host as both a draggable and a droppable
//! under the same id; the engine listens to the resulting drag events and
//! turns them into `sort:*` events.
//!
//! While an item is dragged only the displacement of its siblings changes
//! ([`Sortable::item_shift`], [`Sortable::item_offset`]); the order itself is
//! committed on drop.

use std::fmt;
use std::sync::{Arc, Weak};

use grapple_core::element::ElementRef;
use grapple_core::math::Vec2;
use grapple_core::profiling::profile_function;
use parking_lot::{Mutex, RwLock};

use crate::bus::Subscription;
use crate::error::{KernelError, KernelResult};
use crate::event::{DragEvent, EventData, EventKind};
use crate::kernel::Kernel;
use crate::plugin::{Plugin, PluginCategory};

use super::{BUILTIN_VERSION, InstanceMap, SORTABLE_ENGINE};

/// Marker attribute set on every registered sortable container.
pub const SORTABLE_ATTRIBUTE: &str = "data-grapple-sortable";

/// Callback invoked after every `sort:end` of a container.
pub type SortCallback = Arc<dyn Fn(&Sortable, &DragEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortLayout {
    List(Orientation),
    /// Row-major grid; `columns` is at least 1.
    Grid { columns: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

/// Options for [`Kernel::sortable`](crate::Kernel::sortable).
#[derive(Clone, Default)]
pub struct SortableOptions {
    pub id: String,
    pub items: Vec<String>,
    pub orientation: Orientation,
    pub disabled: bool,
    pub on_sort_end: Option<SortCallback>,
}

impl SortableOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn on_sort_end<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Sortable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_sort_end = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for SortableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableOptions")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("orientation", &self.orientation)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Options for [`Kernel::sortable_grid`](crate::Kernel::sortable_grid).
#[derive(Clone)]
pub struct SortableGridOptions {
    pub id: String,
    pub items: Vec<String>,
    /// Clamped to at least 1.
    pub columns: usize,
    pub disabled: bool,
    pub on_sort_end: Option<SortCallback>,
}

impl SortableGridOptions {
    pub fn new(id: impl Into<String>, columns: usize) -> Self {
        Self {
            id: id.into(),
            items: Vec::new(),
            columns,
            disabled: false,
            on_sort_end: None,
        }
    }

    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn on_sort_end<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Sortable, &DragEvent) + Send + Sync + 'static,
    {
        self.on_sort_end = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for SortableGridOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableGridOptions")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("columns", &self.columns)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// An in-progress sort within one container.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSort {
    item: String,
    from: usize,
    over: usize,
}

#[derive(Debug, Default)]
struct SortState {
    items: Vec<String>,
    disabled: bool,
    active: Option<ActiveSort>,
}

/// First occurrence wins.
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// A registered sortable container.
pub struct Sortable {
    id: String,
    element: ElementRef,
    layout: SortLayout,
    on_sort_end: Option<SortCallback>,
    state: Mutex<SortState>,
    registry: Weak<SortableRegistry>,
}

impl Sortable {
    fn new(
        id: String,
        element: ElementRef,
        layout: SortLayout,
        items: Vec<String>,
        disabled: bool,
        on_sort_end: Option<SortCallback>,
        registry: Weak<SortableRegistry>,
    ) -> Self {
        Self {
            id,
            element,
            layout,
            on_sort_end,
            state: Mutex::new(SortState {
                items: dedup(items),
                disabled,
                active: None,
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

    pub fn layout(&self) -> SortLayout {
        self.layout
    }

    pub fn items(&self) -> Vec<String> {
        self.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.state.lock().items.iter().any(|i| i == item)
    }

    pub fn index_of(&self, item: &str) -> Option<usize> {
        self.state.lock().items.iter().position(|i| i == item)
    }

    pub fn is_disabled(&self) -> bool {
        self.state.lock().disabled
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.state.lock().disabled = disabled;
    }

    /// Replace the sequence. Duplicate ids keep their first position.
    pub fn set_items<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = dedup(items.into_iter().map(Into::into).collect());
        let mut state = self.state.lock();
        if let Some(active) = &state.active
            && !items.contains(&active.item)
        {
            state.active = None;
        }
        state.items = items;
    }

    /// Insert `item` at `index` (clamped to the length) or append it.
    ///
    /// Returns `false` and leaves the sequence alone if the id is present.
    pub fn add_item(&self, item: impl Into<String>, index: Option<usize>) -> bool {
        let item = item.into();
        let mut state = self.state.lock();
        if state.items.contains(&item) {
            return false;
        }
        let index = index.unwrap_or(state.items.len()).min(state.items.len());
        state.items.insert(index, item);
        true
    }

    /// Remove `item`, returning its former index. Absent ids are ignored.
    pub fn remove_item(&self, item: &str) -> Option<usize> {
        let mut state = self.state.lock();
        let index = state.items.iter().position(|i| i == item)?;
        state.items.remove(index);
        if state.active.as_ref().is_some_and(|active| active.item == item) {
            state.active = None;
        }
        Some(index)
    }

    /// Remove the item at `from`, then insert it at `to` in the shortened
    /// sequence (`to` is clamped). An out-of-range `from` does nothing.
    pub fn move_item(&self, from: usize, to: usize) -> bool {
        profile_function!();
        let mut state = self.state.lock();
        if from >= state.items.len() {
            return false;
        }
        let item = state.items.remove(from);
        let to = to.min(state.items.len());
        state.items.insert(to, item);
        true
    }

    /// Row and column of `item`. Vertical lists are a single column,
    /// horizontal lists a single row.
    pub fn item_position(&self, item: &str) -> Option<GridPosition> {
        self.index_of(item).map(|index| self.position_at(index))
    }

    fn position_at(&self, index: usize) -> GridPosition {
        match self.layout {
            SortLayout::List(Orientation::Vertical) => GridPosition {
                row: index,
                column: 0,
            },
            SortLayout::List(Orientation::Horizontal) => GridPosition {
                row: 0,
                column: index,
            },
            SortLayout::Grid { columns } => GridPosition {
                row: index / columns,
                column: index % columns,
            },
        }
    }

    /// Item being sorted in this container.
    pub fn active_item(&self) -> Option<String> {
        self.state.lock().active.as_ref().map(|active| active.item.clone())
    }

    /// Index currently hovered by the sorted item.
    pub fn over_index(&self) -> Option<usize> {
        self.state.lock().active.as_ref().map(|active| active.over)
    }

    pub fn is_sorting(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Slots `item` is displaced by during the current sort.
    ///
    /// Items after the original index up to and including the hovered one
    /// move back one slot when dragging forward; items from the hovered index
    /// up to the original one move forward one slot when dragging backward.
    /// The dragged item itself reports 0.
    pub fn item_shift(&self, item: &str) -> isize {
        let state = self.state.lock();
        let Some(active) = &state.active else {
            return 0;
        };
        let Some(index) = state.items.iter().position(|i| i == item) else {
            return 0;
        };

        let (from, over) = (active.from, active.over);
        if from < over && index > from && index <= over {
            -1
        } else if over < from && index >= over && index < from {
            1
        } else {
            0
        }
    }

    /// Visual offset of `item` for the current sort, given the size of one
    /// slot.
    pub fn item_offset(&self, item: &str, slot: Vec2) -> Vec2 {
        profile_function!();
        let shift = self.item_shift(item);
        if shift == 0 {
            return Vec2::ZERO;
        }
        let Some(index) = self.index_of(item) else {
            return Vec2::ZERO;
        };

        let current = self.position_at(index);
        let target = self.position_at(index.saturating_add_signed(shift));
        Vec2::new(
            (target.column as f32 - current.column as f32) * slot.x,
            (target.row as f32 - current.row as f32) * slot.y,
        )
    }

    /// Unregister this container. Does nothing if it was already removed or
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
        self.element.set_attribute(SORTABLE_ATTRIBUTE, &self.id);
    }

    fn detach(&self) {
        self.state.lock().active = None;
        self.element.remove_attribute(SORTABLE_ATTRIBUTE);
    }

    fn begin_sort(&self, item: &str) -> Option<usize> {
        let mut state = self.state.lock();
        if state.disabled {
            return None;
        }
        let index = state.items.iter().position(|i| i == item)?;
        state.active = Some(ActiveSort {
            item: item.to_string(),
            from: index,
            over: index,
        });
        Some(index)
    }

    /// Move the hover to `over`; returns the original index if it changed.
    fn update_over(&self, over: usize) -> Option<usize> {
        let mut state = self.state.lock();
        let active = state.active.as_mut()?;
        if active.over == over {
            return None;
        }
        active.over = over;
        Some(active.from)
    }

    /// Point the hovered slot back at the item's origin. Returns the origin
    /// index if the slot changed.
    fn reset_over(&self) -> Option<usize> {
        let mut state = self.state.lock();
        let active = state.active.as_mut()?;
        if active.over == active.from {
            return None;
        }
        active.over = active.from;
        Some(active.from)
    }

    fn finish_sort(&self) -> Option<ActiveSort> {
        self.state.lock().active.take()
    }

    fn is_sorting_item(&self, item: &str) -> bool {
        self.state
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| active.item == item)
    }
}

impl fmt::Debug for Sortable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sortable")
            .field("id", &self.id)
            .field("layout", &self.layout)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SortableRegistry {
    instances: RwLock<InstanceMap<Sortable>>,
}

impl SortableRegistry {
    fn get(&self, id: &str) -> Option<Arc<Sortable>> {
        self.instances.read().get(id).cloned()
    }

    fn snapshot(&self) -> Vec<Arc<Sortable>> {
        self.instances.read().values().cloned().collect()
    }

    fn remove(&self, id: &str) -> bool {
        let removed = self.instances.write().shift_remove(id);
        match removed {
            Some(instance) => {
                instance.detach();
                tracing::debug!(sortable = %id, "Unregistered sortable");
                true
            }
            None => false,
        }
    }

    fn remove_instance(&self, instance: &Sortable) -> bool {
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
                instance.detach();
                tracing::debug!(sortable = %instance.id, "Unregistered sortable");
                true
            }
            None => false,
        }
    }

    fn clear(&self) {
        let instances = std::mem::take(&mut *self.instances.write());
        for instance in instances.values() {
            instance.detach();
        }
    }

    fn container_of(&self, item: &str) -> Option<Arc<Sortable>> {
        self.snapshot()
            .into_iter()
            .find(|sortable| sortable.contains(item))
    }

    fn sorting(&self, item: &str) -> Option<Arc<Sortable>> {
        self.snapshot()
            .into_iter()
            .find(|sortable| sortable.is_sorting_item(item))
    }

    fn handle_event(&self, event: &DragEvent, kernel: Option<Kernel>) {
        let emit = |data: EventData| -> DragEvent {
            let event = DragEvent::new(data);
            if let Some(kernel) = &kernel {
                kernel.emit(event.clone());
            }
            event
        };

        match &event.data {
            EventData::DragStart { draggable, .. } => {
                let Some(container) = self.container_of(draggable) else {
                    return;
                };
                if let Some(index) = container.begin_sort(draggable) {
                    emit(EventData::SortStart {
                        sortable: container.id.clone(),
                        item: draggable.clone(),
                        index,
                    });
                }
            }
            EventData::DragOver {
                draggable,
                droppable: Some(target),
            } => {
                let Some(container) = self.sorting(draggable) else {
                    return;
                };
                let Some(to) = container.index_of(target) else {
                    return;
                };
                if let Some(from) = container.update_over(to) {
                    emit(EventData::SortMove {
                        sortable: container.id.clone(),
                        item: draggable.clone(),
                        from,
                        to,
                    });
                }
            }
            EventData::DragOver {
                draggable,
                droppable: None,
            } => {
                let Some(container) = self.sorting(draggable) else {
                    return;
                };
                if let Some(from) = container.reset_over() {
                    emit(EventData::SortMove {
                        sortable: container.id.clone(),
                        item: draggable.clone(),
                        from,
                        to: from,
                    });
                }
            }
            EventData::DragEnd {
                draggable,
                droppable,
                dropped,
            } => {
                let target = if *dropped { droppable.as_deref() } else { None };
                self.finish(draggable, target, &emit);
            }
            EventData::DragCancel { draggable, .. } => {
                self.finish(draggable, None, &emit);
            }
            _ => {}
        }
    }

    /// Commit, transfer or restore the sort of `item`, dropped on `target`.
    fn finish(&self, item: &str, target: Option<&str>, emit: &dyn Fn(EventData) -> DragEvent) {
        let Some(source) = self.sorting(item) else {
            return;
        };
        let Some(active) = source.finish_sort() else {
            return;
        };
        let from = active.from;

        let mut to = from;
        if let Some(target) = target {
            if let Some(index) = source.index_of(target) {
                source.move_item(from, index);
                to = index;
            } else if let Some(destination) = self.transfer_target(&source, item, target) {
                let index = match destination.index_of(target) {
                    Some(index) => index,
                    None => destination.len(),
                };
                if let Some(removed_at) = source.remove_item(item) {
                    emit(EventData::SortRemove {
                        sortable: source.id.clone(),
                        item: item.to_string(),
                        index: removed_at,
                    });
                }
                destination.add_item(item, Some(index));
                emit(EventData::SortAdd {
                    sortable: destination.id.clone(),
                    item: item.to_string(),
                    index,
                });
                to = index;
            }
        }

        let end = emit(EventData::SortEnd {
            sortable: source.id.clone(),
            item: item.to_string(),
            from,
            to,
        });
        if let Some(callback) = &source.on_sort_end {
            callback(&source, &end);
        }
    }

    /// Another enabled container that `target` (an item or the container
    /// itself) belongs to, which does not already hold `item`.
    fn transfer_target(&self, source: &Sortable, item: &str, target: &str) -> Option<Arc<Sortable>> {
        let destination = self
            .get(target)
            .or_else(|| self.container_of(target))?;
        if destination.id == source.id || destination.is_disabled() || destination.contains(item) {
            return None;
        }
        Some(destination)
    }
}

/// Plugin owning every [`Sortable`] container.
pub struct SortableEngine {
    registry: Arc<SortableRegistry>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SortableEngine {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SortableRegistry::default()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Register a sortable list.
    ///
    /// # Errors
    ///
    /// [`KernelError::DuplicateSortable`] if the id is taken.
    pub fn register(
        &self,
        element: ElementRef,
        options: SortableOptions,
    ) -> KernelResult<Arc<Sortable>> {
        self.insert(Sortable::new(
            options.id,
            element,
            SortLayout::List(options.orientation),
            options.items,
            options.disabled,
            options.on_sort_end,
            Arc::downgrade(&self.registry),
        ))
    }

    /// Register a sortable grid.
    ///
    /// # Errors
    ///
    /// [`KernelError::DuplicateSortable`] if the id is taken.
    pub fn register_grid(
        &self,
        element: ElementRef,
        options: SortableGridOptions,
    ) -> KernelResult<Arc<Sortable>> {
        self.insert(Sortable::new(
            options.id,
            element,
            SortLayout::Grid {
                columns: options.columns.max(1),
            },
            options.items,
            options.disabled,
            options.on_sort_end,
            Arc::downgrade(&self.registry),
        ))
    }

    fn insert(&self, sortable: Sortable) -> KernelResult<Arc<Sortable>> {
        let instance = Arc::new(sortable);
        {
            let mut instances = self.registry.instances.write();
            if instances.contains_key(&instance.id) {
                return Err(KernelError::DuplicateSortable(instance.id.clone()));
            }
            instances.insert(instance.id.clone(), Arc::clone(&instance));
        }

        instance.attach();
        tracing::debug!(sortable = %instance.id, layout = ?instance.layout, "Registered sortable");
        Ok(instance)
    }

    /// Destroy the container with this id. Returns `false` if unknown.
    pub fn unregister(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Sortable>> {
        self.registry.get(id)
    }

    pub fn len(&self) -> usize {
        self.registry.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.instances.read().is_empty()
    }

    /// All containers in registration order.
    pub fn all(&self) -> Vec<Arc<Sortable>> {
        self.registry.snapshot()
    }

    /// The first container holding `item`.
    pub fn container_of(&self, item: &str) -> Option<Arc<Sortable>> {
        self.registry.container_of(item)
    }
}

impl Default for SortableEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SortableEngine {
    fn name(&self) -> &str {
        SORTABLE_ENGINE
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
