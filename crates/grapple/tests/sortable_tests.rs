//! Sortable containers driven by real drag gestures.

mod common;

use std::sync::Arc;

use common::{EventRecorder, pointer_kernel};
use grapple::prelude::*;
use grapple::{Sortable, Vec2};
use grapple_test_utils::MockElement;
use parking_lot::Mutex;

const ROW: f32 = 50.0;

/// Register `items` as a vertical list at `x`, each item both draggable and
/// droppable.
fn list(kernel: &Kernel, id: &str, x: f32, items: &[&str]) -> (Arc<Sortable>, Vec<Arc<MockElement>>) {
    let container = MockElement::new(id, Rect::new(x, 0.0, 100.0, ROW * items.len() as f32));
    let sortable = kernel
        .sortable(
            container.as_element(),
            SortableOptions::new(id).items(items.iter().copied()),
        )
        .unwrap();

    let elements = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let element = MockElement::new(*item, Rect::new(x, index as f32 * ROW, 100.0, 40.0));
            kernel
                .draggable(element.as_element(), DraggableOptions::new(*item))
                .unwrap();
            kernel
                .droppable(element.as_element(), DroppableOptions::new(*item))
                .unwrap();
            element
        })
        .collect();
    (sortable, elements)
}

fn press(kernel: &Kernel, element: &Arc<MockElement>) -> Vec2 {
    let at = element.rect().center();
    assert!(kernel.activate(&element.as_element(), &InputEvent::pointer_down(at)));
    at
}

#[test]
fn test_reorder_within_list() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let ended = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ended);

    let container = MockElement::new("todo", Rect::new(0.0, 0.0, 100.0, 150.0));
    let sortable = kernel
        .sortable(
            container.as_element(),
            SortableOptions::new("todo")
                .items(["a", "b", "c"])
                .on_sort_end(move |sortable, _| sink.lock().push(sortable.items())),
        )
        .unwrap();
    let elements: Vec<_> = ["a", "b", "c"]
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let element = MockElement::new(*id, Rect::new(0.0, index as f32 * ROW, 100.0, 40.0));
            kernel
                .draggable(element.as_element(), DraggableOptions::new(*id))
                .unwrap();
            kernel
                .droppable(element.as_element(), DroppableOptions::new(*id))
                .unwrap();
            element
        })
        .collect();

    let start = press(&kernel, &elements[0]);
    assert_eq!(sortable.active_item().as_deref(), Some("a"));

    kernel.handle_input(&InputEvent::pointer_move(start + vec2(0.0, 2.0 * ROW)));
    assert_eq!(sortable.over_index(), Some(2));
    assert_eq!(sortable.item_shift("b"), -1);
    assert_eq!(sortable.item_shift("c"), -1);
    assert_eq!(sortable.item_offset("b", vec2(100.0, ROW)), vec2(0.0, -ROW));
    assert_eq!(sortable.items(), vec!["a", "b", "c"]);

    kernel.handle_input(&InputEvent::pointer_up(start + vec2(0.0, 2.0 * ROW)));

    assert_eq!(sortable.items(), vec!["b", "c", "a"]);
    assert!(!sortable.is_sorting());
    assert_eq!(
        recorder.sort_kinds(),
        vec![EventKind::SortStart, EventKind::SortMove, EventKind::SortEnd]
    );
    assert_eq!(
        recorder.of_kind(EventKind::SortEnd)[0].data,
        EventData::SortEnd {
            sortable: "todo".into(),
            item: "a".into(),
            from: 0,
            to: 2,
        }
    );
    assert_eq!(*ended.lock(), vec![vec!["b", "c", "a"]]);
}

#[test]
fn test_cancel_restores_order() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let (sortable, elements) = list(&kernel, "todo", 0.0, &["a", "b", "c"]);

    let start = press(&kernel, &elements[2]);
    kernel.handle_input(&InputEvent::pointer_move(start - vec2(0.0, 2.0 * ROW)));
    assert_eq!(sortable.item_shift("a"), 1);
    assert_eq!(sortable.item_shift("b"), 1);

    kernel.handle_input(&InputEvent::key(Key::Escape));

    assert_eq!(sortable.items(), vec!["a", "b", "c"]);
    assert_eq!(sortable.item_shift("a"), 0);
    assert_eq!(
        recorder.of_kind(EventKind::SortEnd)[0].data,
        EventData::SortEnd {
            sortable: "todo".into(),
            item: "c".into(),
            from: 2,
            to: 2,
        }
    );
}

#[test]
fn test_drop_outside_items_restores() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let (sortable, elements) = list(&kernel, "todo", 0.0, &["a", "b"]);

    let start = press(&kernel, &elements[0]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(500.0, 500.0)));
    kernel.handle_input(&InputEvent::pointer_up(start + vec2(500.0, 500.0)));

    assert_eq!(sortable.items(), vec!["a", "b"]);
    match &recorder.of_kind(EventKind::SortEnd)[0].data {
        EventData::SortEnd { from, to, .. } => assert_eq!(from, to),
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_leaving_all_items_clears_displacement() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let (sortable, elements) = list(&kernel, "todo", 0.0, &["a", "b", "c"]);

    let start = press(&kernel, &elements[0]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(0.0, 2.0 * ROW)));
    assert_eq!(sortable.item_shift("c"), -1);

    kernel.handle_input(&InputEvent::pointer_move(start + vec2(500.0, 0.0)));
    assert_eq!(sortable.over_index(), Some(0));
    assert_eq!(sortable.item_shift("b"), 0);
    assert_eq!(sortable.item_shift("c"), 0);
    assert_eq!(
        recorder.of_kind(EventKind::SortMove).last().unwrap().data,
        EventData::SortMove {
            sortable: "todo".into(),
            item: "a".into(),
            from: 0,
            to: 0,
        }
    );

    // Coming back resumes displacement.
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(0.0, ROW)));
    assert_eq!(sortable.item_shift("b"), -1);
}

#[test]
fn test_transfer_between_lists() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let (left, left_elements) = list(&kernel, "left", 0.0, &["a", "b"]);
    let (right, _) = list(&kernel, "right", 200.0, &["x", "y"]);

    let start = press(&kernel, &left_elements[0]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(200.0, 0.0)));
    // Hovering a foreign item does not reorder the source.
    assert_eq!(left.over_index(), Some(0));
    kernel.handle_input(&InputEvent::pointer_up(start + vec2(200.0, 0.0)));

    assert_eq!(left.items(), vec!["b"]);
    assert_eq!(right.items(), vec!["a", "x", "y"]);
    assert_eq!(
        recorder.sort_kinds(),
        vec![
            EventKind::SortStart,
            EventKind::SortRemove,
            EventKind::SortAdd,
            EventKind::SortEnd,
        ]
    );
    let events = recorder.events();
    let add = events
        .iter()
        .find(|event| event.kind() == EventKind::SortAdd)
        .unwrap();
    assert_eq!(
        add.data,
        EventData::SortAdd {
            sortable: "right".into(),
            item: "a".into(),
            index: 0,
        }
    );
}

#[test]
fn test_drop_on_empty_container_appends() {
    let kernel = pointer_kernel();
    let (source, elements) = list(&kernel, "source", 0.0, &["a", "b"]);

    let empty = MockElement::new("empty", Rect::new(200.0, 0.0, 100.0, 200.0));
    let target = kernel
        .sortable(empty.as_element(), SortableOptions::new("empty"))
        .unwrap();
    kernel
        .droppable(empty.as_element(), DroppableOptions::new("empty"))
        .unwrap();

    let start = press(&kernel, &elements[1]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(200.0, 0.0)));
    kernel.handle_input(&InputEvent::pointer_up(start + vec2(200.0, 0.0)));

    assert_eq!(source.items(), vec!["a"]);
    assert_eq!(target.items(), vec!["b"]);
}

#[test]
fn test_disabled_list_does_not_sort() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let (sortable, elements) = list(&kernel, "todo", 0.0, &["a", "b"]);
    sortable.set_disabled(true);

    let start = press(&kernel, &elements[0]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(0.0, ROW)));
    kernel.handle_input(&InputEvent::pointer_up(start + vec2(0.0, ROW)));

    assert!(recorder.sort_kinds().is_empty());
    assert_eq!(sortable.items(), vec!["a", "b"]);
    // The plain drag still happened.
    assert_eq!(recorder.of_kind(EventKind::DragEnd)[0].droppable(), Some("b"));
}

#[test]
fn test_grid_reorder() {
    let kernel = pointer_kernel();
    let grid_element = MockElement::new("grid", Rect::new(0.0, 0.0, 300.0, 300.0));
    let grid = kernel
        .sortable_grid(
            grid_element.as_element(),
            SortableGridOptions::new("grid", 3).items((0..6).map(|i| format!("i{}", i))),
        )
        .unwrap();

    let mut elements = Vec::new();
    for index in 0..6 {
        let id = format!("i{}", index);
        let rect = Rect::new(
            (index % 3) as f32 * 100.0,
            (index / 3) as f32 * 100.0,
            90.0,
            90.0,
        );
        let element = MockElement::new(&id, rect);
        kernel
            .draggable(element.as_element(), DraggableOptions::new(&id))
            .unwrap();
        kernel
            .droppable(element.as_element(), DroppableOptions::new(&id))
            .unwrap();
        elements.push(element);
    }

    assert_eq!(
        grid.item_position("i4"),
        Some(grapple::GridPosition { row: 1, column: 1 })
    );

    // Drag i0 onto i4, one row down and one column right.
    let start = press(&kernel, &elements[0]);
    kernel.handle_input(&InputEvent::pointer_move(start + vec2(100.0, 100.0)));
    assert_eq!(grid.item_offset("i3", vec2(100.0, 100.0)), vec2(200.0, -100.0));
    kernel.handle_input(&InputEvent::pointer_up(start + vec2(100.0, 100.0)));

    assert_eq!(grid.items(), vec!["i1", "i2", "i3", "i4", "i0", "i5"]);
}
