//! Plugin system for extending kernel functionality.
//!
//! Every feature of the kernel, including drag tracking, drop targets,
//! collision detection, sorting and the input sensors, is a plugin. Plugins
//! are installed against a [`Kernel`], can subscribe to its event bus, and may
//! declare [`Hook`]s to observe or veto lifecycle steps.

use std::any::{Any, type_name};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{KernelError, KernelResult, panic_message};
use crate::hook::{Hook, HookContext, HookFlow, HookResult};
use crate::kernel::{Kernel, WeakKernel};

/// Upcast support for plugin trait objects.
///
/// Implemented automatically for every sized `Send + Sync` type.
pub trait AsAny: Any + Send + Sync {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Whether a plugin ships with the kernel or was added by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PluginCategory {
    Core,
    #[default]
    Optional,
}

/// Trait for kernel plugins.
///
/// # Example
///
/// ```
/// use grapple::{Hook, HookContext, HookFlow, HookResult, Kernel, KernelResult, Plugin};
///
/// /// Refuses to let anything named "locked" start dragging.
/// struct LockPlugin;
///
/// impl Plugin for LockPlugin {
///     fn name(&self) -> &str {
///         "lock"
///     }
///
///     fn version(&self) -> &str {
///         "1.0.0"
///     }
///
///     fn install(&self, _kernel: &Kernel) -> KernelResult<()> {
///         Ok(())
///     }
///
///     fn hooks(&self) -> &[Hook] {
///         &[Hook::BeforeDragStart]
///     }
///
///     fn call_hook(&self, _hook: Hook, ctx: &HookContext<'_>) -> HookResult {
///         if ctx.draggable == Some("locked") {
///             Ok(HookFlow::Veto)
///         } else {
///             Ok(HookFlow::Continue)
///         }
///     }
/// }
///
/// let kernel = Kernel::builder().build().unwrap();
/// kernel.register(LockPlugin).unwrap();
/// assert!(kernel.plugins().contains("lock"));
/// ```
pub trait Plugin: AsAny {
    /// Unique name of this plugin.
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn category(&self) -> PluginCategory {
        PluginCategory::Optional
    }

    /// Called once when the plugin is registered.
    ///
    /// Use this to subscribe to the kernel's event bus. An error aborts the
    /// registration.
    fn install(&self, kernel: &Kernel) -> KernelResult<()>;

    /// Called when the plugin is unregistered or the kernel is destroyed.
    fn uninstall(&self) {}

    /// Hooks this plugin wants [`Plugin::call_hook`] invoked for.
    fn hooks(&self) -> &[Hook] {
        &[]
    }

    /// Run a declared hook. Returning [`HookFlow::Veto`] from a "before" hook
    /// cancels the step; other hooks cannot veto.
    #[allow(unused_variables)]
    fn call_hook(&self, hook: Hook, ctx: &HookContext<'_>) -> HookResult {
        Ok(HookFlow::Continue)
    }
}

static_assertions::assert_obj_safe!(Plugin);

/// Snapshot of a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub category: PluginCategory,
    pub enabled: bool,
}

struct PluginEntry {
    name: String,
    plugin: Arc<dyn Plugin>,
    enabled: bool,
}

/// Registry of installed plugins, in registration order.
///
/// Plugin code (install, uninstall, hooks) always runs with no registry lock
/// held, so plugins may call back into the kernel freely.
#[derive(Default)]
pub struct PluginRegistry {
    entries: RwLock<Vec<PluginEntry>>,
    kernel: RwLock<Option<WeakKernel>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the kernel that plugins are installed against.
    pub fn attach(&self, kernel: WeakKernel) {
        *self.kernel.write() = Some(kernel);
    }

    /// Install and register a plugin.
    ///
    /// # Errors
    ///
    /// - [`KernelError::KernelNotAttached`] if no kernel is attached
    /// - [`KernelError::DuplicatePlugin`] if the name is taken
    /// - any error returned by [`Plugin::install`]
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> KernelResult<()> {
        let kernel = self
            .kernel
            .read()
            .as_ref()
            .and_then(WeakKernel::upgrade)
            .ok_or(KernelError::KernelNotAttached)?;

        let name = plugin.name().to_string();
        if self.contains(&name) {
            return Err(KernelError::DuplicatePlugin(name));
        }

        plugin.install(&kernel)?;

        let mut entries = self.entries.write();
        // Another thread may have registered the same name during install.
        if entries.iter().any(|entry| entry.name == name) {
            drop(entries);
            plugin.uninstall();
            return Err(KernelError::DuplicatePlugin(name));
        }

        tracing::debug!(
            plugin = %name,
            version = plugin.version(),
            category = ?plugin.category(),
            "Registered plugin"
        );
        entries.push(PluginEntry {
            name,
            plugin,
            enabled: true,
        });
        Ok(())
    }

    /// Uninstall and remove a plugin. Unknown names are ignored.
    pub fn unregister(&self, name: &str) {
        let removed = {
            let mut entries = self.entries.write();
            let index = entries.iter().position(|entry| entry.name == name);
            index.map(|index| entries.remove(index))
        };

        if let Some(entry) = removed {
            entry.plugin.uninstall();
            tracing::debug!(plugin = %name, "Unregistered plugin");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.plugin))
    }

    /// Get a plugin by name, downcast to its concrete type.
    pub fn get_as<P: Plugin>(&self, name: &str) -> Option<Arc<P>> {
        self.get(name)?.as_any_arc().downcast::<P>().ok()
    }

    /// Like [`PluginRegistry::get_as`], distinguishing a missing plugin from
    /// one of the wrong type.
    pub fn require<P: Plugin>(&self, name: &str) -> KernelResult<Arc<P>> {
        let plugin = self
            .get(name)
            .ok_or_else(|| KernelError::PluginNotFound(name.to_string()))?;
        plugin
            .as_any_arc()
            .downcast::<P>()
            .map_err(|_| KernelError::PluginTypeMismatch {
                name: name.to_string(),
                expected: type_name::<P>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().iter().any(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.entries
            .read()
            .iter()
            .map(|entry| PluginInfo {
                name: entry.name.clone(),
                version: entry.plugin.version().to_string(),
                category: entry.plugin.category(),
                enabled: entry.enabled,
            })
            .collect()
    }

    /// Enable a plugin's hooks. Returns `false` for unknown names.
    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable a plugin's hooks. Its bus subscriptions stay active. Returns
    /// `false` for unknown names.
    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries
            .read()
            .iter()
            .any(|entry| entry.name == name && entry.enabled)
    }

    /// Run `hook` on every enabled plugin that declares it, in registration
    /// order.
    ///
    /// Returns `false` as soon as a plugin vetoes; later plugins are not
    /// called. Failing or panicking plugins are logged and skipped.
    pub fn run_hook(&self, hook: Hook, ctx: &HookContext<'_>) -> bool {
        let candidates: Vec<(String, Arc<dyn Plugin>)> = self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.enabled && entry.plugin.hooks().contains(&hook))
            .map(|entry| (entry.name.clone(), Arc::clone(&entry.plugin)))
            .collect();

        for (name, plugin) in candidates {
            match panic::catch_unwind(AssertUnwindSafe(|| plugin.call_hook(hook, ctx))) {
                Ok(Ok(HookFlow::Continue)) => {}
                Ok(Ok(HookFlow::Veto)) => {
                    if hook.is_vetoable() {
                        tracing::debug!(plugin = %name, hook = %hook, "Plugin vetoed");
                        return false;
                    }
                    tracing::warn!(plugin = %name, hook = %hook, "Ignoring veto from non-vetoable hook");
                }
                Ok(Err(err)) => {
                    tracing::error!(plugin = %name, hook = %hook, "Plugin hook failed: {}", err);
                }
                Err(payload) => {
                    tracing::error!(
                        plugin = %name,
                        hook = %hook,
                        "Plugin hook panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        true
    }

    /// Uninstall every plugin, most recently registered first.
    pub fn uninstall_all(&self) {
        let entries = std::mem::take(&mut *self.entries.write());
        for entry in entries.into_iter().rev() {
            entry.plugin.uninstall();
            tracing::trace!(plugin = %entry.name, "Uninstalled plugin");
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.list_plugins())
            .finish()
    }
}

type HookFn = dyn Fn(&HookContext<'_>) -> HookResult + Send + Sync;

/// A closure-based plugin for simple hook logic.
///
/// # Example
///
/// ```
/// use grapple::{Hook, HookFlow, HookPlugin, Kernel};
///
/// let kernel = Kernel::builder().build().unwrap();
/// kernel
///     .register(HookPlugin::new("no-trash", "1.0.0").on_hook(
///         Hook::BeforeDragEnd,
///         |ctx| {
///             if ctx.draggable == Some("trash") {
///                 Ok(HookFlow::Veto)
///             } else {
///                 Ok(HookFlow::Continue)
///             }
///         },
///     ))
///     .unwrap();
/// ```
pub struct HookPlugin {
    name: String,
    version: String,
    hooks: Vec<Hook>,
    handlers: Vec<(Hook, Box<HookFn>)>,
}

impl HookPlugin {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            hooks: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Add a handler for `hook`. Several handlers may share a hook; they run
    /// in the order added.
    pub fn on_hook<F>(mut self, hook: Hook, handler: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> HookResult + Send + Sync + 'static,
    {
        if !self.hooks.contains(&hook) {
            self.hooks.push(hook);
        }
        self.handlers.push((hook, Box::new(handler)));
        self
    }
}

impl Plugin for HookPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn install(&self, _kernel: &Kernel) -> KernelResult<()> {
        Ok(())
    }

    fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    fn call_hook(&self, hook: Hook, ctx: &HookContext<'_>) -> HookResult {
        for (_, handler) in self.handlers.iter().filter(|(h, _)| *h == hook) {
            if handler(ctx)? == HookFlow::Veto {
                return Ok(HookFlow::Veto);
            }
        }
        Ok(HookFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use parking_lot::Mutex;

    struct CountingPlugin {
        installs: Mutex<u32>,
        uninstalls: Mutex<u32>,
    }

    impl CountingPlugin {
        fn new() -> Self {
            Self {
                installs: Mutex::new(0),
                uninstalls: Mutex::new(0),
            }
        }
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &str {
            "counting"
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn install(&self, _kernel: &Kernel) -> KernelResult<()> {
            *self.installs.lock() += 1;
            Ok(())
        }

        fn uninstall(&self) {
            *self.uninstalls.lock() += 1;
        }
    }

    fn attached_registry(kernel: &Kernel) -> PluginRegistry {
        let registry = PluginRegistry::new();
        registry.attach(kernel.downgrade());
        registry
    }

    #[test]
    fn test_register_requires_kernel() {
        let registry = PluginRegistry::new();
        let result = registry.register(Arc::new(CountingPlugin::new()));
        assert_eq!(result, Err(KernelError::KernelNotAttached));
    }

    #[test]
    fn test_register_installs_once() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        let plugin = Arc::new(CountingPlugin::new());

        registry.register(plugin.clone()).unwrap();
        assert_eq!(
            registry.register(plugin.clone()),
            Err(KernelError::DuplicatePlugin("counting".into()))
        );
        assert_eq!(*plugin.installs.lock(), 1);

        let info = registry.list_plugins();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].name, "counting");
        assert_eq!(info[0].category, PluginCategory::Optional);
        assert!(info[0].enabled);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        let plugin = Arc::new(CountingPlugin::new());
        registry.register(plugin.clone()).unwrap();

        registry.unregister("missing");
        assert_eq!(registry.len(), 1);

        registry.unregister("counting");
        assert!(registry.is_empty());
        assert_eq!(*plugin.uninstalls.lock(), 1);
    }

    #[test]
    fn test_get_as_downcasts() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        registry.register(Arc::new(CountingPlugin::new())).unwrap();

        assert!(registry.get_as::<CountingPlugin>("counting").is_some());
        assert!(registry.get_as::<HookPlugin>("counting").is_none());
        assert!(matches!(
            registry.require::<HookPlugin>("counting"),
            Err(KernelError::PluginTypeMismatch { .. })
        ));
        assert!(matches!(
            registry.require::<HookPlugin>("missing"),
            Err(KernelError::PluginNotFound(_))
        ));
    }

    #[test]
    fn test_enable_disable() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        registry.register(Arc::new(CountingPlugin::new())).unwrap();

        assert!(registry.disable("counting"));
        assert!(!registry.is_enabled("counting"));
        assert!(registry.enable("counting"));
        assert!(registry.is_enabled("counting"));
        assert!(!registry.enable("missing"));
        assert!(!registry.disable("missing"));
    }

    #[test]
    fn test_run_hook_veto_short_circuits() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let log = calls.clone();
        registry
            .register(Arc::new(HookPlugin::new("first", "1").on_hook(
                Hook::BeforeDragStart,
                move |_| {
                    log.lock().push("first");
                    Ok(HookFlow::Veto)
                },
            )))
            .unwrap();
        let log = calls.clone();
        registry
            .register(Arc::new(HookPlugin::new("second", "1").on_hook(
                Hook::BeforeDragStart,
                move |_| {
                    log.lock().push("second");
                    Ok(HookFlow::Continue)
                },
            )))
            .unwrap();

        assert!(!registry.run_hook(Hook::BeforeDragStart, &HookContext::default()));
        assert_eq!(*calls.lock(), vec!["first"]);

        registry.disable("first");
        assert!(registry.run_hook(Hook::BeforeDragStart, &HookContext::default()));
        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_run_hook_isolates_failures() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        let reached = Arc::new(Mutex::new(false));

        registry
            .register(Arc::new(
                HookPlugin::new("broken", "1")
                    .on_hook(Hook::BeforeDragMove, |_| Err("bad state".into())),
            ))
            .unwrap();
        registry
            .register(Arc::new(
                HookPlugin::new("panicky", "1")
                    .on_hook(Hook::BeforeDragMove, |_| panic!("hook exploded")),
            ))
            .unwrap();
        let flag = reached.clone();
        registry
            .register(Arc::new(HookPlugin::new("ok", "1").on_hook(
                Hook::BeforeDragMove,
                move |_| {
                    *flag.lock() = true;
                    Ok(HookFlow::Continue)
                },
            )))
            .unwrap();

        assert!(registry.run_hook(Hook::BeforeDragMove, &HookContext::default()));
        assert!(*reached.lock());
    }

    #[test]
    fn test_after_hooks_cannot_veto() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        registry
            .register(Arc::new(
                HookPlugin::new("stubborn", "1")
                    .on_hook(Hook::AfterDragEnd, |_| Ok(HookFlow::Veto)),
            ))
            .unwrap();

        assert!(registry.run_hook(Hook::AfterDragEnd, &HookContext::default()));
    }

    #[test]
    fn test_uninstall_all() {
        let kernel = Kernel::new(Default::default());
        let registry = attached_registry(&kernel);
        let plugin = Arc::new(CountingPlugin::new());
        registry.register(plugin.clone()).unwrap();

        registry.uninstall_all();
        assert!(registry.is_empty());
        assert_eq!(*plugin.uninstalls.lock(), 1);
    }
}
