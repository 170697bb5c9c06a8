//! Error types for the kernel.

use std::any::Any;
use std::fmt;

/// Errors returned synchronously to callers that misuse the kernel.
///
/// These indicate programming errors (duplicate ids, missing setup) rather
/// than runtime conditions; best-effort operations such as unregistering an
/// unknown id never produce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A draggable with this id is already registered.
    DuplicateDraggable(String),
    /// A droppable with this id is already registered.
    DuplicateDroppable(String),
    /// A sortable container with this id is already registered.
    DuplicateSortable(String),
    /// A plugin with this name is already registered.
    DuplicatePlugin(String),
    /// The plugin registry has no kernel attached yet.
    KernelNotAttached,
    /// The kernel has not been initialized, or was destroyed.
    NotInitialized,
    /// No plugin is registered under this name.
    PluginNotFound(String),
    /// A plugin exists under this name but has a different concrete type.
    PluginTypeMismatch {
        /// The registered plugin name.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
    },
    /// A plugin's install step failed.
    PluginInstall {
        /// The plugin name.
        name: String,
        /// Description of the failure.
        message: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::DuplicateDraggable(id) => {
                write!(f, "Draggable '{}' is already registered", id)
            }
            KernelError::DuplicateDroppable(id) => {
                write!(f, "Droppable '{}' is already registered", id)
            }
            KernelError::DuplicateSortable(id) => {
                write!(f, "Sortable '{}' is already registered", id)
            }
            KernelError::DuplicatePlugin(name) => {
                write!(f, "Plugin '{}' is already registered", name)
            }
            KernelError::KernelNotAttached => {
                write!(f, "Plugin registry has no kernel attached")
            }
            KernelError::NotInitialized => write!(f, "Kernel is not initialized"),
            KernelError::PluginNotFound(name) => write!(f, "Plugin '{}' not found", name),
            KernelError::PluginTypeMismatch { name, expected } => {
                write!(f, "Plugin '{}' is not a {}", name, expected)
            }
            KernelError::PluginInstall { name, message } => {
                write!(f, "Failed to install plugin '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for KernelError {}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Error type returned by event handlers and plugin hooks.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by event handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            KernelError::DuplicateDraggable("card".into()).to_string(),
            "Draggable 'card' is already registered"
        );
        assert_eq!(
            KernelError::PluginTypeMismatch {
                name: "drag-manager".into(),
                expected: "DropManager",
            }
            .to_string(),
            "Plugin 'drag-manager' is not a DropManager"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
