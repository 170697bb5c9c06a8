//! Host element abstraction.
//!
//! The kernel never talks to a concrete UI toolkit. Anything that can be
//! dragged, dropped onto or sorted is represented by an [`ElementRef`], a
//! shared handle to a host object implementing [`Element`]. Hosts typically
//! wrap a DOM node, a retained-mode widget id or a scene-graph node.
//!
//! Element identity is the identity of the `Arc` allocation, see
//! [`same_element`].

use std::sync::Arc;

use crate::geometry::Rect;
use crate::math::Vec2;

/// Visual element owned by the host application.
///
/// Every method takes `&self`; implementations use interior mutability for
/// the state they mirror.
pub trait Element: Send + Sync {
    /// Current bounding rectangle, including any translation applied through
    /// [`Element::set_translation`].
    fn rect(&self) -> Rect;

    /// Set a marker attribute.
    fn set_attribute(&self, name: &str, value: &str);

    /// Remove a marker attribute. Missing attributes are ignored.
    fn remove_attribute(&self, name: &str);

    /// Add a style class.
    fn add_class(&self, class: &str);

    /// Remove a style class. Missing classes are ignored.
    fn remove_class(&self, class: &str);

    /// Offset the element's visual position. `None` restores the un-offset
    /// appearance.
    fn set_translation(&self, offset: Option<Vec2>);

    /// Enable or disable the platform's native drag behaviour.
    fn set_native_drag(&self, _enabled: bool) {}
}

static_assertions::assert_obj_safe!(Element);

/// Shared handle to a host element.
pub type ElementRef = Arc<dyn Element>;

/// Whether two handles point at the same host element.
pub fn same_element(a: &ElementRef, b: &ElementRef) -> bool {
    Arc::ptr_eq(a, b)
}
