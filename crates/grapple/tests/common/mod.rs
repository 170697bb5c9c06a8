//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use grapple::prelude::*;
use grapple::{Droppable, Subscription};
use grapple_test_utils::MockElement;
use parking_lot::Mutex;

/// Records every event emitted on a kernel, in delivery order.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<DragEvent>>>,
    _subscriptions: Vec<Subscription>,
}

impl EventRecorder {
    pub fn attach(kernel: &Kernel) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let events = Arc::clone(&events);
                kernel.on(kind, move |event| {
                    events.lock().push(event.clone());
                    Ok(())
                })
            })
            .collect();
        Self {
            events,
            _subscriptions: subscriptions,
        }
    }

    pub fn events(&self) -> Vec<DragEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(DragEvent::kind).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<DragEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .cloned()
            .collect()
    }

    /// Events of the `sort:*` family only.
    pub fn sort_kinds(&self) -> Vec<EventKind> {
        self.kinds()
            .into_iter()
            .filter(|kind| kind.as_str().starts_with("sort:"))
            .collect()
    }

    pub fn last(&self) -> Option<DragEvent> {
        self.events.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// A kernel with only the pointer sensor attached.
pub fn pointer_kernel() -> Kernel {
    Kernel::builder()
        .sensors([SensorKind::Pointer])
        .build()
        .unwrap()
}

pub fn add_draggable(kernel: &Kernel, id: &str, rect: Rect) -> Arc<MockElement> {
    let element = MockElement::new(id, rect);
    kernel
        .draggable(element.as_element(), DraggableOptions::new(id))
        .unwrap();
    element
}

pub fn add_droppable(kernel: &Kernel, id: &str, rect: Rect) -> (Arc<MockElement>, Arc<Droppable>) {
    let element = MockElement::new(id, rect);
    let droppable = kernel
        .droppable(element.as_element(), DroppableOptions::new(id))
        .unwrap();
    (element, droppable)
}

/// Press on `element`, move to each point in turn, then release at the last.
pub fn pointer_drag(kernel: &Kernel, element: &Arc<MockElement>, from: Vec2, path: &[Vec2]) {
    assert!(
        kernel.activate(&element.as_element(), &InputEvent::pointer_down(from)),
        "pointer press was not accepted"
    );
    for point in path {
        kernel.handle_input(&InputEvent::pointer_move(*point));
    }
    let release = path.last().copied().unwrap_or(from);
    kernel.handle_input(&InputEvent::pointer_up(release));
}
