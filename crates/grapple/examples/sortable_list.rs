//! Sortable List Example
//!
//! Drives a small to-do list through a pointer drag and a keyboard drag,
//! printing every event the kernel emits.
//!
//! Run with `RUST_LOG=grapple=trace` to also see the kernel's own logging.

use std::sync::Arc;

use grapple::prelude::*;
use grapple_core::{logging, profiling};
use grapple_test_utils::MockElement;

const ROW_HEIGHT: f32 = 48.0;

fn main() {
    logging::init();
    profiling::set_enabled(true);

    let kernel = Kernel::builder()
        .sensors([SensorKind::Pointer, SensorKind::Keyboard])
        .keyboard_options(
            grapple::KeyboardSensorOptions::default()
                .step(ROW_HEIGHT)
                .announcer(|message| println!("  [screen reader] {}", message)),
        )
        .build()
        .expect("kernel should initialize");

    for kind in EventKind::ALL {
        kernel.on(kind, |event| {
            println!("{:<12} {:?}", event.kind().as_str(), event.data);
            Ok(())
        });
    }

    let tasks = ["write docs", "fix bug", "ship release"];
    let list = MockElement::new("todo", Rect::new(0.0, 0.0, 240.0, ROW_HEIGHT * 3.0));
    let sortable = kernel
        .sortable(
            list.as_element(),
            SortableOptions::new("todo")
                .items(tasks)
                .on_sort_end(|sortable, _| println!("order is now {:?}", sortable.items())),
        )
        .expect("sortable should register");

    let rows: Vec<Arc<MockElement>> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            let row = MockElement::new(
                *task,
                Rect::new(0.0, index as f32 * ROW_HEIGHT, 240.0, ROW_HEIGHT - 8.0),
            );
            kernel
                .draggable(row.as_element(), DraggableOptions::new(*task))
                .expect("draggable should register");
            kernel
                .droppable(row.as_element(), DroppableOptions::new(*task))
                .expect("droppable should register");
            row
        })
        .collect();

    println!("--- pointer: move \"ship release\" to the top");
    let start = rows[2].rect().center();
    kernel.activate(&rows[2].as_element(), &InputEvent::pointer_down(start));
    kernel.handle_input(&InputEvent::pointer_move(start - vec2(0.0, ROW_HEIGHT * 2.0)));
    kernel.handle_input(&InputEvent::pointer_up(start - vec2(0.0, ROW_HEIGHT * 2.0)));
    profiling::new_frame();

    println!("--- keyboard: move \"write docs\" down one row");
    let row = kernel
        .drag_manager()
        .ok()
        .and_then(|manager| manager.get("write docs"))
        .expect("row is registered");
    kernel.activate(row.element(), &InputEvent::key(Key::Space));
    kernel.handle_input(&InputEvent::key(Key::ArrowDown));
    kernel.handle_input(&InputEvent::key(Key::Enter));
    profiling::new_frame();

    println!("final order: {:?}", sortable.items());
    kernel.destroy();
}
