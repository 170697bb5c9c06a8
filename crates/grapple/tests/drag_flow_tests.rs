//! End-to-end drag gestures driven through the kernel's input entry points.

mod common;

use std::sync::Arc;

use common::{EventRecorder, add_draggable, add_droppable, pointer_drag, pointer_kernel};
use grapple::prelude::*;
use grapple::{InputKind, PointerPhase};
use grapple_test_utils::MockElement;
use parking_lot::Mutex;

#[test]
fn test_drop_on_target() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    add_droppable(&kernel, "zone", Rect::new(100.0, 0.0, 40.0, 40.0));

    pointer_drag(&kernel, &card, vec2(10.0, 10.0), &[vec2(110.0, 10.0)]);

    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::DragStart,
            EventKind::DragMove,
            EventKind::DragEnter,
            EventKind::DragOver,
            EventKind::DragEnd,
        ]
    );
    match &recorder.last().unwrap().data {
        EventData::DragEnd {
            draggable,
            droppable,
            dropped,
        } => {
            assert_eq!(draggable, "card");
            assert_eq!(droppable.as_deref(), Some("zone"));
            assert!(*dropped);
        }
        other => panic!("unexpected terminal event {:?}", other),
    }
    assert!(!kernel.is_dragging());
    assert!(kernel.active_droppable().is_none());
}

#[test]
fn test_drop_outside_any_target() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    add_droppable(&kernel, "zone", Rect::new(100.0, 0.0, 40.0, 40.0));

    pointer_drag(&kernel, &card, vec2(10.0, 10.0), &[vec2(10.0, 300.0)]);

    let end = recorder.of_kind(EventKind::DragEnd);
    assert_eq!(end.len(), 1);
    assert_eq!(
        end[0].data,
        EventData::DragEnd {
            draggable: "card".into(),
            droppable: None,
            dropped: false,
        }
    );
    assert!(recorder.of_kind(EventKind::DragEnter).is_empty());
}

#[test]
fn test_droppable_sharing_draggable_id_is_a_target() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "a", Rect::new(0.0, 0.0, 50.0, 50.0));
    add_droppable(&kernel, "a", Rect::new(100.0, 0.0, 50.0, 50.0));

    pointer_drag(&kernel, &card, vec2(10.0, 10.0), &[vec2(110.0, 10.0)]);

    assert_eq!(
        recorder.last().unwrap().data,
        EventData::DragEnd {
            draggable: "a".into(),
            droppable: Some("a".into()),
            dropped: true,
        }
    );
}

#[test]
fn test_move_delta_is_signed() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(100.0, 100.0, 40.0, 40.0));

    kernel.activate(&card.as_element(), &InputEvent::pointer_down(vec2(120.0, 120.0)));
    kernel.handle_input(&InputEvent::pointer_move(vec2(90.0, 100.0)));

    let moves = recorder.of_kind(EventKind::DragMove);
    match &moves[0].data {
        EventData::DragMove { delta, position, .. } => {
            assert_eq!(*delta, vec2(-30.0, -20.0));
            assert_eq!(*position, vec2(90.0, 100.0));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(card.translation(), Some(vec2(-30.0, -20.0)));
}

#[test]
fn test_events_carry_source_input() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));

    pointer_drag(&kernel, &card, vec2(5.0, 5.0), &[vec2(15.0, 5.0)]);

    let phases: Vec<Option<PointerPhase>> = recorder
        .events()
        .iter()
        .map(|event| match event.source.as_ref().map(|source| &source.kind) {
            Some(InputKind::Pointer(pointer)) => Some(pointer.phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases.first(), Some(&Some(PointerPhase::Down)));
    assert_eq!(phases.last(), Some(&Some(PointerPhase::Up)));
}

#[test]
fn test_moving_between_targets_leaves_then_enters() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let (_, first) = add_droppable(&kernel, "first", Rect::new(100.0, 0.0, 40.0, 40.0));
    let (_, second) = add_droppable(&kernel, "second", Rect::new(300.0, 0.0, 40.0, 40.0));

    kernel.activate(&card.as_element(), &InputEvent::pointer_down(vec2(0.0, 0.0)));
    kernel.handle_input(&InputEvent::pointer_move(vec2(100.0, 0.0)));
    assert!(first.is_over());
    assert_eq!(kernel.active_droppable().unwrap().id(), "first");

    recorder.clear();
    kernel.handle_input(&InputEvent::pointer_move(vec2(300.0, 0.0)));
    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::DragMove,
            EventKind::DragLeave,
            EventKind::DragEnter,
            EventKind::DragOver,
        ]
    );
    assert!(!first.is_over());
    assert!(second.is_over());
    assert_eq!(kernel.active_droppable().unwrap().id(), "second");
}

#[test]
fn test_cancel_leaves_same_idle_state_as_end() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = MockElement::new("card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let draggable = kernel
        .draggable(
            card.as_element(),
            DraggableOptions::new("card").drag_class("dragging"),
        )
        .unwrap();
    let zone = MockElement::new("zone", Rect::new(100.0, 0.0, 40.0, 40.0));
    let droppable = kernel
        .droppable(
            zone.as_element(),
            DroppableOptions::new("zone")
                .over_class("over")
                .active_class("can-drop"),
        )
        .unwrap();

    kernel.activate(&card.as_element(), &InputEvent::pointer_down(vec2(0.0, 0.0)));
    kernel.handle_input(&InputEvent::pointer_move(vec2(100.0, 0.0)));
    assert!(card.has_class("dragging"));
    assert!(zone.has_class("over"));
    assert!(zone.has_class("can-drop"));

    assert!(kernel.handle_input(&InputEvent::key(Key::Escape)));

    assert!(!kernel.is_dragging());
    assert!(!draggable.is_dragging());
    assert_eq!(draggable.transform(), None);
    assert_eq!(card.translation(), None);
    assert!(!card.has_class("dragging"));
    assert!(!droppable.is_over());
    assert!(!droppable.is_highlighted());
    assert!(!zone.has_class("over"));
    assert!(!zone.has_class("can-drop"));
    assert!(kernel.active_droppable().is_none());
    assert_eq!(kernel.active_sensor(), None);

    let cancel = recorder.of_kind(EventKind::DragCancel);
    assert_eq!(
        cancel[0].data,
        EventData::DragCancel {
            draggable: "card".into(),
            reason: CancelReason::Escape,
        }
    );
    assert!(recorder.of_kind(EventKind::DragEnd).is_empty());
}

#[test]
fn test_is_dragging_only_between_start_and_end() {
    let kernel = pointer_kernel();
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let observed = Arc::new(Mutex::new(Vec::new()));

    for kind in [EventKind::DragStart, EventKind::DragMove, EventKind::DragEnd] {
        let observed = Arc::clone(&observed);
        let weak = kernel.downgrade();
        kernel.on(kind, move |_| {
            if let Some(kernel) = weak.upgrade() {
                observed.lock().push((kind, kernel.is_dragging()));
            }
            Ok(())
        });
    }

    assert!(!kernel.is_dragging());
    pointer_drag(&kernel, &card, vec2(0.0, 0.0), &[vec2(5.0, 5.0)]);
    assert!(!kernel.is_dragging());

    assert_eq!(
        *observed.lock(),
        vec![
            (EventKind::DragStart, true),
            (EventKind::DragMove, true),
            (EventKind::DragEnd, false),
        ]
    );
}

#[test]
fn test_failing_handlers_do_not_break_the_drag() {
    let kernel = pointer_kernel();
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    add_droppable(&kernel, "zone", Rect::new(100.0, 0.0, 40.0, 40.0));

    kernel.on(EventKind::DragMove, |_| Err("handler failed".into()));
    kernel.on(EventKind::DragMove, |_| panic!("handler panicked"));
    let recorder = EventRecorder::attach(&kernel);

    pointer_drag(&kernel, &card, vec2(0.0, 0.0), &[vec2(100.0, 0.0)]);

    assert_eq!(recorder.of_kind(EventKind::DragMove).len(), 1);
    assert_eq!(recorder.of_kind(EventKind::DragEnd).len(), 1);
    assert!(!kernel.is_dragging());
}

#[test]
fn test_accept_rule_filters_targets() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let photo = MockElement::new("photo", Rect::new(0.0, 0.0, 40.0, 40.0));
    kernel
        .draggable(photo.as_element(), DraggableOptions::new("photo").kind("image"))
        .unwrap();
    let docs = MockElement::new("docs", Rect::new(100.0, 0.0, 40.0, 40.0));
    kernel
        .droppable(
            docs.as_element(),
            DroppableOptions::new("docs").accept(AcceptRule::Type("document".into())),
        )
        .unwrap();
    let gallery = MockElement::new("gallery", Rect::new(100.0, 0.0, 40.0, 40.0));
    kernel
        .droppable(
            gallery.as_element(),
            DroppableOptions::new("gallery")
                .accept(AcceptRule::Types(vec!["image".into(), "video".into()])),
        )
        .unwrap();

    pointer_drag(&kernel, &photo, vec2(0.0, 0.0), &[vec2(100.0, 0.0)]);

    let end = recorder.of_kind(EventKind::DragEnd);
    assert_eq!(end[0].droppable(), Some("gallery"));
}

#[test]
fn test_on_drop_callback_receives_event() {
    let kernel = pointer_kernel();
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let dropped = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dropped);
    let zone = MockElement::new("zone", Rect::new(100.0, 0.0, 40.0, 40.0));
    kernel
        .droppable(
            zone.as_element(),
            DroppableOptions::new("zone").on_drop(move |droppable, event| {
                sink.lock()
                    .push((droppable.id().to_string(), event.draggable().map(str::to_string)));
            }),
        )
        .unwrap();

    pointer_drag(&kernel, &card, vec2(0.0, 0.0), &[vec2(100.0, 0.0)]);
    assert_eq!(
        *dropped.lock(),
        vec![("zone".to_string(), Some("card".to_string()))]
    );
}

#[test]
fn test_axis_lock_and_handle() {
    let kernel = pointer_kernel();
    let card = MockElement::new("card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let grip = MockElement::new("grip", Rect::new(0.0, 0.0, 10.0, 10.0));
    kernel
        .draggable(
            card.as_element(),
            DraggableOptions::new("card")
                .axis(Axis::X)
                .handle(grip.as_element()),
        )
        .unwrap();

    // With a handle only the handle activates.
    assert!(!kernel.activate(&card.as_element(), &InputEvent::pointer_down(Vec2::ZERO)));
    assert!(kernel.activate(&grip.as_element(), &InputEvent::pointer_down(Vec2::ZERO)));

    kernel.handle_input(&InputEvent::pointer_move(vec2(30.0, 50.0)));
    assert_eq!(card.translation(), Some(vec2(30.0, 0.0)));
}

#[test]
fn test_live_collision_switch() {
    let kernel = pointer_kernel();
    let recorder = EventRecorder::attach(&kernel);
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 100.0, 100.0));
    // Overlaps the card from the start, but never contains the pointer.
    add_droppable(&kernel, "wide", Rect::new(50.0, 50.0, 200.0, 200.0));
    add_droppable(&kernel, "small", Rect::new(5.0, 5.0, 10.0, 10.0));

    kernel
        .set_collision(CollisionAlgorithm::Pointer)
        .unwrap();
    kernel.activate(&card.as_element(), &InputEvent::pointer_down(vec2(0.0, 0.0)));
    kernel.handle_input(&InputEvent::pointer_move(vec2(10.0, 10.0)));
    assert_eq!(kernel.active_droppable().unwrap().id(), "small");

    kernel
        .set_collision(CollisionStrategy::custom(|args| {
            args.candidates.iter().position(|candidate| candidate.id == "wide")
        }))
        .unwrap();
    kernel.handle_input(&InputEvent::pointer_move(vec2(12.0, 12.0)));
    assert_eq!(kernel.active_droppable().unwrap().id(), "wide");

    kernel.handle_input(&InputEvent::pointer_up(vec2(12.0, 12.0)));
    assert_eq!(recorder.last().unwrap().droppable(), Some("wide"));
}

#[test]
fn test_second_sensor_cannot_start_while_dragging() {
    let kernel = Kernel::builder().build().unwrap();
    let card = add_draggable(&kernel, "card", Rect::new(0.0, 0.0, 40.0, 40.0));
    let other = add_draggable(&kernel, "other", Rect::new(100.0, 0.0, 40.0, 40.0));

    assert!(kernel.activate(&card.as_element(), &InputEvent::pointer_down(Vec2::ZERO)));
    assert!(!kernel.activate(&other.as_element(), &InputEvent::touch_start(vec2(110.0, 10.0))));
    assert_eq!(kernel.active_draggable().unwrap().id(), "card");
    assert_eq!(kernel.active_sensor(), Some(SensorKind::Pointer));
}
