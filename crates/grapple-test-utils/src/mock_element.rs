//! Mock implementation of [`Element`] for testing.
//!
//! This module provides a host element that records every side effect the
//! kernel performs on it, without any real UI toolkit behind it.

use std::sync::Arc;

use grapple_core::alloc::{HashMap, HashSet};
use grapple_core::element::{Element, ElementRef};
use grapple_core::geometry::Rect;
use grapple_core::math::Vec2;
use parking_lot::Mutex;

/// Records an element side effect for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementCall {
    SetAttribute { name: String, value: String },
    RemoveAttribute { name: String },
    AddClass(String),
    RemoveClass(String),
    SetTranslation(Option<Vec2>),
    SetNativeDrag(bool),
}

/// Mock host element.
///
/// # Interior Mutability
///
/// [`Element`] methods take `&self` and the trait requires `Send + Sync`, so
/// all recorded state sits behind `parking_lot::Mutex`.
///
/// # Example
///
/// ```rust
/// use grapple_core::{Element, Rect};
/// use grapple_test_utils::MockElement;
///
/// let mock = MockElement::new("card", Rect::new(0.0, 0.0, 100.0, 40.0));
/// mock.add_class("dragging");
///
/// assert!(mock.has_class("dragging"));
/// assert_eq!(mock.call_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockElement {
    label: String,
    /// Layout rect before translation.
    layout: Mutex<Rect>,
    translation: Mutex<Option<Vec2>>,
    attributes: Mutex<HashMap<String, String>>,
    classes: Mutex<HashSet<String>>,
    native_drag: Mutex<bool>,
    /// Recorded calls for verification
    calls: Mutex<Vec<ElementCall>>,
}

impl MockElement {
    /// Create a new mock element with the given layout rect.
    pub fn new(label: impl Into<String>, layout: Rect) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            layout: Mutex::new(layout),
            translation: Mutex::new(None),
            attributes: Mutex::new(HashMap::new()),
            classes: Mutex::new(HashSet::new()),
            native_drag: Mutex::new(true),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Shared handle usable wherever the kernel expects an element.
    pub fn as_element(self: &Arc<Self>) -> ElementRef {
        self.clone()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Simulate a host layout change.
    pub fn set_layout(&self, layout: Rect) {
        *self.layout.lock() = layout;
    }

    pub fn layout(&self) -> Rect {
        *self.layout.lock()
    }

    pub fn translation(&self) -> Option<Vec2> {
        *self.translation.lock()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.lock().get(name).cloned()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.lock().contains(class)
    }

    pub fn native_drag_enabled(&self) -> bool {
        *self.native_drag.lock()
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<ElementCall> {
        self.calls.lock().clone()
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: ElementCall) {
        self.calls.lock().push(call);
    }
}

impl Element for MockElement {
    fn rect(&self) -> Rect {
        let layout = *self.layout.lock();
        match *self.translation.lock() {
            Some(offset) => layout.translate(offset),
            None => layout,
        }
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .lock()
            .insert(name.to_string(), value.to_string());
        self.record(ElementCall::SetAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.lock().remove(name);
        self.record(ElementCall::RemoveAttribute {
            name: name.to_string(),
        });
    }

    fn add_class(&self, class: &str) {
        self.classes.lock().insert(class.to_string());
        self.record(ElementCall::AddClass(class.to_string()));
    }

    fn remove_class(&self, class: &str) {
        self.classes.lock().remove(class);
        self.record(ElementCall::RemoveClass(class.to_string()));
    }

    fn set_translation(&self, offset: Option<Vec2>) {
        *self.translation.lock() = offset;
        self.record(ElementCall::SetTranslation(offset));
    }

    fn set_native_drag(&self, enabled: bool) {
        *self.native_drag.lock() = enabled;
        self.record(ElementCall::SetNativeDrag(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_includes_translation() {
        let mock = MockElement::new("a", Rect::new(10.0, 10.0, 20.0, 20.0));
        mock.set_translation(Some(Vec2::new(5.0, -5.0)));
        assert_eq!(mock.rect(), Rect::new(15.0, 5.0, 20.0, 20.0));

        mock.set_translation(None);
        assert_eq!(mock.rect(), Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_records_calls() {
        let mock = MockElement::new("a", Rect::ZERO);
        mock.set_attribute("data-id", "a");
        mock.add_class("over");
        mock.remove_class("over");

        assert_eq!(mock.attribute("data-id").as_deref(), Some("a"));
        assert!(!mock.has_class("over"));
        assert_eq!(
            mock.calls(),
            vec![
                ElementCall::SetAttribute {
                    name: "data-id".to_string(),
                    value: "a".to_string()
                },
                ElementCall::AddClass("over".to_string()),
                ElementCall::RemoveClass("over".to_string()),
            ]
        );

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_element_identity() {
        let mock = MockElement::new("a", Rect::ZERO);
        let a = mock.as_element();
        let b = mock.as_element();
        let other = MockElement::new("b", Rect::ZERO).as_element();

        assert!(grapple_core::same_element(&a, &b));
        assert!(!grapple_core::same_element(&a, &other));
    }
}
