use block_graph::arena::NodeId;
use block_graph::error::GraphError;
use block_graph::geometry::{link_endpoints, LinkView};
use block_graph::interaction::{Gesture, Interaction, PointerEvent, PointerTarget};
use block_graph::project::Point;
use block_graph::store::Store;

fn down(position: Point, target: PointerTarget) -> PointerEvent {
    PointerEvent::Down {
        position,
        target: Some(target),
    }
}

fn up(position: Point, target: Option<PointerTarget>) -> PointerEvent {
    PointerEvent::Up { position, target }
}

fn mv(position: Point) -> PointerEvent {
    PointerEvent::Move { position }
}

/// add (0) at (100,100) and multiply (4) at (400,100), with add.c -> multiply.a
fn linked_pair(store: &mut Store) -> (NodeId, NodeId, NodeId, NodeId) {
    let add = store.add_block("add").unwrap();
    let mul = store.add_block("multiply").unwrap();
    let c = store.block(add).unwrap().properties[2];
    let a = store.block(mul).unwrap().properties[0];
    store.link_properties(c, a).unwrap();
    (add, mul, c, a)
}

#[test]
fn test_block_drag_through_pointer_events() {
    let mut store = Store::default();
    let (add, mul, _, a) = linked_pair(&mut store);
    let mut ui = Interaction::new();
    let grab = Point::new(410.0, 105.0);

    ui.handle(&mut store, down(grab, PointerTarget::BlockHeader(mul))).unwrap();
    assert!(matches!(ui.gesture(), Gesture::BlockDrag { .. }));

    ui.handle(&mut store, mv(grab + Point::new(30.0, -10.0))).unwrap();
    ui.handle(&mut store, mv(grab + Point::new(50.0, -20.0))).unwrap();

    // link follows the live offset, persisted position does not move
    let snapshot = store.snapshot();
    let line = link_endpoints(&snapshot.project, &snapshot.editing, &store.config().layout, a)
        .unwrap()
        .unwrap();
    assert_eq!(line.from, Point::new(300.0, 184.0));
    assert_eq!(line.to, Point::new(450.0, 116.0));
    assert_eq!(store.block(mul).unwrap().position, Point::new(400.0, 100.0));

    ui.handle(&mut store, up(grab + Point::new(50.0, -20.0), None)).unwrap();
    assert!(ui.is_idle());
    assert!(store.editing().dragging.is_none());
    assert_eq!(store.block(mul).unwrap().position, Point::new(450.0, 80.0));
    assert_eq!(store.block(add).unwrap().position, Point::new(100.0, 100.0));
}

#[test]
fn test_cancel_and_focus_loss_abandon_drag() {
    for abort in [PointerEvent::Cancel, PointerEvent::FocusLost] {
        let mut store = Store::default();
        let block = store.add_block("add").unwrap();
        let mut ui = Interaction::new();

        ui.handle(&mut store, down(Point::ZERO, PointerTarget::BlockHeader(block))).unwrap();
        ui.handle(&mut store, mv(Point::new(40.0, 40.0))).unwrap();
        ui.handle(&mut store, abort).unwrap();

        assert!(ui.is_idle());
        assert!(store.editing().dragging.is_none());
        assert_eq!(store.block(block).unwrap().position, Point::new(100.0, 100.0));
    }
}

#[test]
fn test_link_drag_connects_output_to_input() {
    let mut store = Store::default();
    let constant = store.add_block("constant").unwrap();
    let add = store.add_block("add").unwrap();
    let value = store.block(constant).unwrap().properties[0];
    let b = store.block(add).unwrap().properties[1];
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::new(300.0, 136.0), PointerTarget::Socket(value))).unwrap();
    ui.handle(&mut store, mv(Point::new(380.0, 160.0))).unwrap();
    assert!(ui.preview().is_some());

    ui.handle(&mut store, up(Point::new(400.0, 160.0), Some(PointerTarget::Socket(b)))).unwrap();
    assert!(ui.is_idle());
    assert!(ui.preview().is_none());
    assert_eq!(store.property(b).unwrap().link, Some(value));
}

#[test]
fn test_link_drag_released_on_canvas_does_nothing() {
    let mut store = Store::default();
    let constant = store.add_block("constant").unwrap();
    let value = store.block(constant).unwrap().properties[0];
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::ZERO, PointerTarget::Socket(value))).unwrap();
    ui.handle(&mut store, up(Point::new(5.0, 5.0), None)).unwrap();
    assert!(ui.is_idle());
    assert!(store.links().is_empty());
}

#[test]
fn test_rejected_link_returns_error_and_goes_idle() {
    let mut store = Store::default();
    let first = store.add_block("constant").unwrap();
    let second = store.add_block("constant").unwrap();
    let out1 = store.block(first).unwrap().properties[0];
    let out2 = store.block(second).unwrap().properties[0];
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::ZERO, PointerTarget::Socket(out1))).unwrap();
    let err = ui
        .handle(&mut store, up(Point::ZERO, Some(PointerTarget::Socket(out2))))
        .unwrap_err();
    assert!(matches!(err, GraphError::LinkTypeMismatch { .. }));
    assert!(ui.is_idle());
    assert!(store.links().is_empty());
}

#[test]
fn test_click_on_linked_input_unlinks() {
    let mut store = Store::default();
    let (_, _, _, a) = linked_pair(&mut store);
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::new(400.0, 136.0), PointerTarget::Socket(a))).unwrap();
    assert_eq!(ui.gesture(), Gesture::SocketPress { sink: a });
    ui.handle(&mut store, up(Point::new(400.0, 136.0), Some(PointerTarget::Socket(a)))).unwrap();

    assert!(ui.is_idle());
    assert_eq!(store.property(a).unwrap().link, None);
}

#[test]
fn test_press_released_elsewhere_keeps_link() {
    let mut store = Store::default();
    let (_, _, c, a) = linked_pair(&mut store);
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::ZERO, PointerTarget::Socket(a))).unwrap();
    ui.handle(&mut store, up(Point::new(90.0, 0.0), None)).unwrap();
    assert_eq!(store.property(a).unwrap().link, Some(c));
}

#[test]
fn test_block_removed_mid_drag_resets_gesture() {
    let mut store = Store::default();
    let (add, _, _, _) = linked_pair(&mut store);
    let mut ui = Interaction::new();

    ui.handle(&mut store, down(Point::ZERO, PointerTarget::BlockHeader(add))).unwrap();
    ui.handle(&mut store, mv(Point::new(10.0, 10.0))).unwrap();
    store.remove_block(add).unwrap();

    ui.handle(&mut store, mv(Point::new(20.0, 20.0))).unwrap();
    assert!(ui.is_idle());
    ui.handle(&mut store, up(Point::new(20.0, 20.0), None)).unwrap();
    assert!(store.editing().dragging.is_none());
    assert!(store.links().is_empty());
}

#[test]
fn test_link_view_follows_store() {
    let mut store = Store::default();
    let (_, mul, _, a) = linked_pair(&mut store);
    let mut view = LinkView::new(store.subscribe(), store.config().layout.clone());

    let lines = view.lines().to_vec();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, a);
    assert_eq!(lines[0].1.to, Point::new(400.0, 136.0));

    store.move_block().start(mul).unwrap();
    store.move_block().update(Point::new(0.0, 50.0)).unwrap();
    let lines = view.lines().to_vec();
    assert_eq!(lines[0].1.to, Point::new(400.0, 186.0));

    store.unlink_property(a).unwrap();
    assert!(view.lines().is_empty());
}
