//! Kernel core - owns the event bus and plugin registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use grapple_core::element::ElementRef;
use parking_lot::{Mutex, RwLock};

use crate::bus::{EventBus, HandlerId, Subscription};
use crate::error::{HandlerResult, KernelError, KernelResult};
use crate::event::{DragEvent, EventKind};
use crate::hook::{Hook, HookContext};
use crate::input::{InputEvent, InputKind};
use crate::options::{
    AnimationOptions, AutoScroll, CollisionStrategy, KernelOptions, OptionsPatch, SensorKind,
};
use crate::plugin::{Plugin, PluginInfo, PluginRegistry};
use crate::plugins::collision::CollisionDetector;
use crate::plugins::drag_manager::{DragManager, Draggable, DraggableOptions};
use crate::plugins::drop_manager::{DropManager, Droppable, DroppableOptions};
use crate::plugins::sortable::{Sortable, SortableEngine, SortableGridOptions, SortableOptions};
use crate::plugins::{COLLISION_DETECTOR, DRAG_MANAGER, DROP_MANAGER, SORTABLE_ENGINE};
use crate::sensors::{
    KEYBOARD_SENSOR, KeyboardSensor, KeyboardSensorOptions, POINTER_SENSOR, PointerSensor,
    PointerSensorOptions, Sensor, TOUCH_SENSOR, TouchSensor, TouchSensorOptions,
};

struct KernelShared {
    bus: EventBus,
    registry: PluginRegistry,
    options: RwLock<KernelOptions>,
    initialized: AtomicBool,
    /// Sensor currently driving a drag.
    active_sensor: Mutex<Option<SensorKind>>,
}

/// The drag-and-drop kernel.
///
/// `Kernel` is a cheap, cloneable handle; clones share the same state. Every
/// feature (drag tracking, drop targets, collision, sorting, sensors) is a
/// plugin installed by [`Kernel::initialize`].
///
/// # Example
///
/// ```
/// use grapple::{DraggableOptions, Kernel};
/// use grapple_core::Rect;
/// use grapple_test_utils::MockElement;
///
/// let kernel = Kernel::builder().build().unwrap();
/// let card = MockElement::new("card", Rect::new(0.0, 0.0, 50.0, 50.0));
///
/// kernel
///     .draggable(card.as_element(), DraggableOptions::new("card"))
///     .unwrap();
///
/// assert_eq!(card.attribute("data-grapple-draggable").as_deref(), Some("card"));
/// assert!(!kernel.is_dragging());
/// ```
#[derive(Clone)]
pub struct Kernel {
    shared: Arc<KernelShared>,
}

/// Non-owning kernel handle held by plugins and sensors.
#[derive(Clone, Default)]
pub struct WeakKernel {
    shared: Weak<KernelShared>,
}

impl WeakKernel {
    pub fn upgrade(&self) -> Option<Kernel> {
        self.shared.upgrade().map(|shared| Kernel { shared })
    }
}

impl std::fmt::Debug for WeakKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakKernel")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

static_assertions::assert_impl_all!(Kernel: Send, Sync, Clone);
static_assertions::assert_impl_all!(WeakKernel: Send, Sync, Clone);

impl Kernel {
    /// Create an uninitialized kernel.
    pub fn new(options: KernelOptions) -> Self {
        let kernel = Self {
            shared: Arc::new(KernelShared {
                bus: EventBus::new(),
                registry: PluginRegistry::new(),
                options: RwLock::new(options),
                initialized: AtomicBool::new(false),
                active_sensor: Mutex::new(None),
            }),
        };
        kernel.shared.registry.attach(kernel.downgrade());
        kernel
    }

    /// Create a new kernel builder.
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    pub fn downgrade(&self) -> WeakKernel {
        WeakKernel {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Whether two handles refer to the same kernel.
    pub fn ptr_eq(&self, other: &Kernel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Install the built-in plugins, attach the configured sensors and install
    /// the plugins listed in the options.
    ///
    /// Calling this on an initialized kernel does nothing. On failure every
    /// plugin installed so far is uninstalled again.
    pub fn initialize(&self) -> KernelResult<()> {
        if self.shared.initialized.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.shared.registry.attach(self.downgrade());
        if let Err(err) = self.install_plugins() {
            tracing::error!("Kernel initialization failed: {}", err);
            self.shared.registry.uninstall_all();
            *self.shared.active_sensor.lock() = None;
            self.shared.initialized.store(false, Ordering::Release);
            return Err(err);
        }

        tracing::info!(
            plugins = self.shared.registry.len(),
            "Kernel initialized"
        );
        Ok(())
    }

    fn install_plugins(&self) -> KernelResult<()> {
        let options = self.options();

        let mut builtins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(DragManager::new()),
            Arc::new(DropManager::new()),
            Arc::new(CollisionDetector::new(options.collision.clone())),
            Arc::new(PointerSensor::new(options.pointer.clone())),
            Arc::new(TouchSensor::new(options.touch.clone())),
            Arc::new(SortableEngine::new()),
        ];
        if options.has_sensor(SensorKind::Keyboard) {
            builtins.push(Arc::new(KeyboardSensor::new(options.keyboard.clone())));
        }
        for plugin in builtins {
            self.shared.registry.register(plugin)?;
        }

        for kind in &options.sensors {
            self.attach_sensor(*kind)?;
        }

        for plugin in options.plugins {
            self.shared.registry.register(plugin)?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::Acquire)
    }

    fn ensure_initialized(&self) -> KernelResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(KernelError::NotInitialized)
        }
    }

    /// Uninstall every plugin, drop all subscriptions and release the sensor
    /// claim. A drag in progress is cancelled first.
    ///
    /// The kernel can be initialized again afterwards.
    pub fn destroy(&self) {
        // Sensors are uninstalled before the managers, so a drag in progress
        // is cancelled while its listeners still exist.
        self.shared.registry.uninstall_all();
        self.shared.bus.clear();
        *self.shared.active_sensor.lock() = None;
        self.shared.initialized.store(false, Ordering::Release);
        tracing::info!("Kernel destroyed");
    }

    // Element registration

    /// Make `element` draggable.
    pub fn draggable(
        &self,
        element: ElementRef,
        options: DraggableOptions,
    ) -> KernelResult<Arc<Draggable>> {
        self.ensure_initialized()?;
        self.drag_manager()?.register(element, options)
    }

    /// Make `element` a drop target.
    pub fn droppable(
        &self,
        element: ElementRef,
        options: DroppableOptions,
    ) -> KernelResult<Arc<Droppable>> {
        self.ensure_initialized()?;
        self.drop_manager()?.register(element, options)
    }

    /// Make `element` a sortable list.
    pub fn sortable(
        &self,
        element: ElementRef,
        options: SortableOptions,
    ) -> KernelResult<Arc<Sortable>> {
        self.ensure_initialized()?;
        self.sortable_engine()?.register(element, options)
    }

    /// Make `element` a sortable grid.
    pub fn sortable_grid(
        &self,
        element: ElementRef,
        options: SortableGridOptions,
    ) -> KernelResult<Arc<Sortable>> {
        self.ensure_initialized()?;
        self.sortable_engine()?.register_grid(element, options)
    }

    /// Returns `false` if no draggable has this id.
    pub fn remove_draggable(&self, id: &str) -> bool {
        self.drag_manager()
            .map(|manager| manager.unregister(id))
            .unwrap_or(false)
    }

    pub fn remove_droppable(&self, id: &str) -> bool {
        self.drop_manager()
            .map(|manager| manager.unregister(id))
            .unwrap_or(false)
    }

    pub fn remove_sortable(&self, id: &str) -> bool {
        self.sortable_engine()
            .map(|engine| engine.unregister(id))
            .unwrap_or(false)
    }

    // State queries

    pub fn active_draggable(&self) -> Option<Arc<Draggable>> {
        self.drag_manager().ok()?.active()
    }

    pub fn active_droppable(&self) -> Option<Arc<Droppable>> {
        self.drop_manager().ok()?.active()
    }

    /// Whether a drag has started and not yet ended or been cancelled.
    pub fn is_dragging(&self) -> bool {
        self.active_draggable().is_some()
    }

    // Typed plugin capabilities

    /// Resolve a plugin by name and downcast it.
    pub fn plugin_as<P: Plugin>(&self, name: &str) -> KernelResult<Arc<P>> {
        self.shared.registry.require::<P>(name)
    }

    pub fn drag_manager(&self) -> KernelResult<Arc<DragManager>> {
        self.plugin_as(DRAG_MANAGER)
    }

    pub fn drop_manager(&self) -> KernelResult<Arc<DropManager>> {
        self.plugin_as(DROP_MANAGER)
    }

    pub fn collision_detector(&self) -> KernelResult<Arc<CollisionDetector>> {
        self.plugin_as(COLLISION_DETECTOR)
    }

    pub fn sortable_engine(&self) -> KernelResult<Arc<SortableEngine>> {
        self.plugin_as(SORTABLE_ENGINE)
    }

    pub fn sensor(&self, kind: SensorKind) -> KernelResult<Arc<dyn Sensor>> {
        let sensor: Arc<dyn Sensor> = match kind {
            SensorKind::Pointer => self.plugin_as::<PointerSensor>(POINTER_SENSOR)?,
            SensorKind::Touch => self.plugin_as::<TouchSensor>(TOUCH_SENSOR)?,
            SensorKind::Keyboard => self.plugin_as::<KeyboardSensor>(KEYBOARD_SENSOR)?,
        };
        Ok(sensor)
    }

    // Sensors

    /// Attach a sensor so it starts recognizing gestures.
    ///
    /// The keyboard sensor is installed on first attach if it was not
    /// configured at initialization.
    pub fn attach_sensor(&self, kind: SensorKind) -> KernelResult<()> {
        self.ensure_initialized()?;
        if kind == SensorKind::Keyboard && !self.shared.registry.contains(KEYBOARD_SENSOR) {
            let options = self.shared.options.read().keyboard.clone();
            self.shared
                .registry
                .register(Arc::new(KeyboardSensor::new(options)))?;
        }
        self.sensor(kind)?.attach(self);
        Ok(())
    }

    /// Detach a sensor, cancelling its drag if it has one. Sensors that are
    /// not installed are ignored.
    pub fn detach_sensor(&self, kind: SensorKind) {
        if let Ok(sensor) = self.sensor(kind) {
            sensor.detach();
        }
    }

    /// Claim the kernel-wide drag slot for `kind`.
    ///
    /// Returns `false` if any sensor, including `kind` itself, already holds it.
    pub fn claim_sensor(&self, kind: SensorKind) -> bool {
        let mut slot = self.shared.active_sensor.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(kind);
        true
    }

    /// Release the drag slot if `kind` holds it.
    pub fn release_sensor(&self, kind: SensorKind) {
        let mut slot = self.shared.active_sensor.lock();
        if *slot == Some(kind) {
            *slot = None;
        }
    }

    pub fn active_sensor(&self) -> Option<SensorKind> {
        *self.shared.active_sensor.lock()
    }

    /// Cancel every gesture on `draggable`. A drag in progress ends with
    /// `drag:cancel` (`Programmatic`) and frees the claim; a pending press is
    /// dropped. Returns `true` if any sensor was holding it.
    pub fn cancel_gesture(&self, draggable: &str) -> bool {
        let mut cancelled = false;
        for kind in [SensorKind::Pointer, SensorKind::Touch, SensorKind::Keyboard] {
            if let Ok(sensor) = self.sensor(kind)
                && sensor.target().as_deref() == Some(draggable)
            {
                tracing::debug!(sensor = %kind, draggable, "Cancelling gesture on removed draggable");
                sensor.deactivate();
                cancelled = true;
            }
        }
        cancelled
    }

    /// Offer an activation gesture on `element` to the sensor matching the
    /// input type. Returns `true` if a drag started or is pending.
    pub fn activate(&self, element: &ElementRef, input: &InputEvent) -> bool {
        let kind = match &input.kind {
            InputKind::Pointer(_) => SensorKind::Pointer,
            InputKind::Touch(_) => SensorKind::Touch,
            InputKind::Key(_) => SensorKind::Keyboard,
            InputKind::Blur => return false,
        };
        match self.sensor(kind) {
            Ok(sensor) if sensor.is_attached() => sensor.activate(element, input),
            _ => false,
        }
    }

    /// Feed continuous input (moves, releases, keys, blur) to every attached
    /// sensor. Returns `true` if any sensor consumed it.
    pub fn handle_input(&self, input: &InputEvent) -> bool {
        let mut handled = false;
        for kind in [SensorKind::Pointer, SensorKind::Touch, SensorKind::Keyboard] {
            if let Ok(sensor) = self.sensor(kind)
                && sensor.is_attached()
            {
                handled |= sensor.handle_input(input);
            }
        }
        handled
    }

    // Collision

    /// Swap the collision algorithm, effective from the next move.
    pub fn set_collision(&self, strategy: impl Into<CollisionStrategy>) -> KernelResult<()> {
        let strategy = strategy.into();
        self.shared.options.write().collision = strategy.clone();
        if self.is_initialized() {
            self.collision_detector()?.set_strategy(strategy);
        }
        Ok(())
    }

    // Plugins

    pub fn plugins(&self) -> &PluginRegistry {
        &self.shared.registry
    }

    /// Install and register a plugin.
    pub fn register(&self, plugin: impl Plugin) -> KernelResult<()> {
        self.register_arc(Arc::new(plugin))
    }

    pub fn register_arc(&self, plugin: Arc<dyn Plugin>) -> KernelResult<()> {
        self.ensure_initialized()?;
        self.shared.registry.register(plugin)
    }

    /// Unregister a plugin. Unknown names are ignored.
    pub fn unregister(&self, name: &str) {
        self.shared.registry.unregister(name);
    }

    pub fn plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.shared.registry.get(name)
    }

    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.shared.registry.list_plugins()
    }

    pub fn enable_plugin(&self, name: &str) -> bool {
        self.shared.registry.enable(name)
    }

    pub fn disable_plugin(&self, name: &str) -> bool {
        self.shared.registry.disable(name)
    }

    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        self.shared.registry.is_enabled(name)
    }

    /// Run a hook across enabled plugins. Returns `false` on veto.
    pub fn run_hook(&self, hook: Hook, ctx: &HookContext<'_>) -> bool {
        self.shared.registry.run_hook(hook, ctx)
    }

    // Events

    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&DragEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared.bus.on(kind, handler)
    }

    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        self.shared.bus.off(kind, id)
    }

    /// Run the event's "after" hook, then deliver it to subscribers.
    pub fn emit(&self, event: DragEvent) {
        let kind = event.kind();
        tracing::trace!(kind = %kind, draggable = ?event.draggable(), "Emitting event");

        if let Some(hook) = kind.hook() {
            self.shared
                .registry
                .run_hook(hook, &HookContext::for_event(&event));
        }
        self.shared.bus.emit(&event);
    }

    // Configuration

    /// Snapshot of the current options.
    pub fn options(&self) -> KernelOptions {
        self.shared.options.read().clone()
    }

    pub fn accessibility(&self) -> bool {
        self.shared.options.read().accessibility
    }

    /// Merge `patch` into the options and apply it live: the collision
    /// algorithm is swapped, sensors are attached or detached to match the
    /// new list, and new plugins are installed.
    pub fn configure(&self, patch: OptionsPatch) -> KernelResult<()> {
        let collision = patch.collision.clone();
        let sensors = patch.sensors.clone();
        let plugins = patch.plugins.clone();

        let previous_sensors = {
            let mut options = self.shared.options.write();
            let previous = options.sensors.clone();
            options.apply(patch);
            previous
        };

        if !self.is_initialized() {
            return Ok(());
        }

        if let Some(strategy) = collision {
            self.collision_detector()?.set_strategy(strategy);
        }

        if let Some(sensors) = sensors {
            for kind in previous_sensors.iter().filter(|kind| !sensors.contains(kind)) {
                self.detach_sensor(*kind);
            }
            for kind in &sensors {
                self.attach_sensor(*kind)?;
            }
        }

        for plugin in plugins {
            if !self.shared.registry.contains(plugin.name()) {
                self.shared.registry.register(plugin)?;
            }
        }

        tracing::debug!("Kernel reconfigured");
        Ok(())
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("initialized", &self.is_initialized())
            .field("active_sensor", &self.active_sensor())
            .field("plugins", &self.shared.registry)
            .field("bus", &self.shared.bus)
            .finish()
    }
}

/// Builder for constructing a [`Kernel`].
///
/// # Example
///
/// ```
/// use grapple::{CollisionAlgorithm, KernelBuilder, SensorKind};
///
/// let kernel = KernelBuilder::new()
///     .sensor(SensorKind::Keyboard)
///     .collision(CollisionAlgorithm::Closest)
///     .build()
///     .unwrap();
///
/// assert!(kernel.options().has_sensor(SensorKind::Keyboard));
/// ```
#[derive(Default)]
pub struct KernelBuilder {
    options: KernelOptions,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options.
    pub fn from_options(options: KernelOptions) -> Self {
        Self { options }
    }

    /// Replace the sensor list.
    pub fn sensors(mut self, sensors: impl Into<Vec<SensorKind>>) -> Self {
        self.options.sensors = sensors.into();
        self
    }

    /// Add one sensor to the list.
    pub fn sensor(mut self, kind: SensorKind) -> Self {
        if !self.options.sensors.contains(&kind) {
            self.options.sensors.push(kind);
        }
        self
    }

    pub fn collision(mut self, strategy: impl Into<CollisionStrategy>) -> Self {
        self.options.collision = strategy.into();
        self
    }

    pub fn auto_scroll(mut self, auto_scroll: impl Into<AutoScroll>) -> Self {
        self.options.auto_scroll = auto_scroll.into();
        self
    }

    pub fn accessibility(mut self, enabled: bool) -> Self {
        self.options.accessibility = enabled;
        self
    }

    pub fn animation(mut self, animation: Option<AnimationOptions>) -> Self {
        self.options.animation = animation;
        self
    }

    pub fn pointer_options(mut self, options: PointerSensorOptions) -> Self {
        self.options.pointer = options;
        self
    }

    pub fn touch_options(mut self, options: TouchSensorOptions) -> Self {
        self.options.touch = options;
        self
    }

    pub fn keyboard_options(mut self, options: KeyboardSensorOptions) -> Self {
        self.options.keyboard = options;
        self
    }

    /// Add a plugin, installed after the built-ins in the order added.
    pub fn add_plugin(mut self, plugin: impl Plugin) -> Self {
        self.options.plugins.push(Arc::new(plugin));
        self
    }

    /// Build the kernel without initializing it.
    pub fn build_uninitialized(self) -> Kernel {
        Kernel::new(self.options)
    }

    /// Build and initialize the kernel.
    pub fn build(self) -> KernelResult<Kernel> {
        let kernel = Kernel::new(self.options);
        kernel.initialize()?;
        Ok(kernel)
    }
}
