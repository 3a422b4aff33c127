//! Pointer interaction state machine.
//!
//! Turns raw pointer events into store operations. At most one gesture is in
//! flight at a time:
//!
//! - **Block drag**: pointer-down on a block header starts a drag session in
//!   the store, moves report the rounded displacement since the press, and
//!   pointer-up commits it. Cancel and focus loss abandon the session.
//! - **Link drag**: pointer-down on an output socket starts a preview line;
//!   releasing over an input socket links the two properties. The preview is
//!   local to this machine and never enters the store.
//! - **Unlink click**: press and release on a linked input socket clears
//!   its link.
//!
//! The store is passed to [`Interaction::handle`] on every call rather than
//! held, so the machine owns no editor state besides the gesture itself.

use tracing::{debug, warn};

use crate::arena::NodeId;
use crate::error::{GraphError, GraphResult};
use crate::geometry::LinkLine;
use crate::project::Point;
use crate::registry::Direction;
use crate::store::Store;

/// What the pointer is over, as reported by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// Draggable header of a block.
    BlockHeader(NodeId),
    /// Link socket of a property.
    Socket(NodeId),
}

/// Input event from the pointer device or window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Button pressed.
    Down {
        /// Canvas position of the press.
        position: Point,
        /// What was hit, if anything.
        target: Option<PointerTarget>,
    },
    /// Pointer moved.
    Move {
        /// Current canvas position.
        position: Point,
    },
    /// Button released.
    Up {
        /// Canvas position of the release.
        position: Point,
        /// What the pointer is over on release.
        target: Option<PointerTarget>,
    },
    /// Pointer capture lost or gesture cancelled by the platform.
    Cancel,
    /// Window blur.
    FocusLost,
}

/// Gesture currently in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Nothing pressed.
    Idle,
    /// A block header is held.
    BlockDrag {
        /// Block being moved.
        block_id: NodeId,
        /// Pointer position at the press.
        origin: Point,
    },
    /// A link is being pulled out of an output socket.
    LinkDrag {
        /// Output property the link starts at.
        source: NodeId,
        /// Pointer position at the press.
        origin: Point,
        /// Latest pointer position.
        current: Point,
    },
    /// A linked input socket is held; releasing on it unlinks.
    SocketPress {
        /// Pressed input property.
        sink: NodeId,
    },
}

/// Pointer-driven gesture tracker.
#[derive(Debug)]
pub struct Interaction {
    gesture: Gesture,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    /// Idle tracker.
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }

    /// Gesture in progress.
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Whether no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Line from the press point to the pointer while a link is dragged.
    pub fn preview(&self) -> Option<LinkLine> {
        match self.gesture {
            Gesture::LinkDrag { origin, current, .. } => Some(LinkLine {
                from: origin,
                to: current,
            }),
            _ => None,
        }
    }

    /// Feed one event through the machine.
    ///
    /// A store error ends the current gesture; the machine is idle
    /// afterwards and the error is returned to the caller.
    pub fn handle(&mut self, store: &mut Store, event: PointerEvent) -> GraphResult<()> {
        match event {
            PointerEvent::Down { position, target } => self.on_down(store, position, target),
            PointerEvent::Move { position } => self.on_move(store, position),
            PointerEvent::Up { position, target } => self.on_up(store, position, target),
            PointerEvent::Cancel | PointerEvent::FocusLost => {
                self.abort(store);
                Ok(())
            }
        }
    }

    fn on_down(&mut self, store: &mut Store, position: Point, target: Option<PointerTarget>) -> GraphResult<()> {
        if !self.is_idle() {
            warn!(gesture = ?self.gesture, "Pointer down during an active gesture, ignored");
            return Ok(());
        }
        match target {
            Some(PointerTarget::BlockHeader(block_id)) => {
                debug_assert!(
                    store.editing().dragging.is_none(),
                    "idle interaction with an active drag session"
                );
                store.move_block().start(block_id)?;
                self.gesture = Gesture::BlockDrag {
                    block_id,
                    origin: position,
                };
            }
            Some(PointerTarget::Socket(id)) => match store.project().direction_of(store.registry(), id)? {
                Direction::Output => {
                    self.gesture = Gesture::LinkDrag {
                        source: id,
                        origin: position,
                        current: position,
                    };
                }
                Direction::Input => {
                    if store.property(id)?.link.is_some() {
                        self.gesture = Gesture::SocketPress { sink: id };
                    }
                }
            },
            None => {}
        }
        Ok(())
    }

    fn on_move(&mut self, store: &mut Store, position: Point) -> GraphResult<()> {
        match self.gesture {
            Gesture::BlockDrag { block_id, origin } => {
                if store.editing().dragged_block() != Some(block_id) {
                    // Session ended behind our back, e.g. the block was removed.
                    debug!(block_id = %block_id, "Drag session gone, resetting gesture");
                    self.gesture = Gesture::Idle;
                    return Ok(());
                }
                let delta = (position - origin).round();
                if let Err(err) = store.move_block().update(delta) {
                    self.gesture = Gesture::Idle;
                    return Err(err);
                }
            }
            Gesture::LinkDrag { source, origin, .. } => {
                self.gesture = Gesture::LinkDrag {
                    source,
                    origin,
                    current: position,
                };
            }
            Gesture::SocketPress { .. } | Gesture::Idle => {}
        }
        Ok(())
    }

    fn on_up(&mut self, store: &mut Store, position: Point, target: Option<PointerTarget>) -> GraphResult<()> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => Ok(()),
            Gesture::BlockDrag { block_id, origin } => {
                if store.editing().dragged_block() != Some(block_id) {
                    debug!(block_id = %block_id, "Drag session gone before release");
                    return Ok(());
                }
                let delta = (position - origin).round();
                store.move_block().update(delta)?;
                store.move_block().commit()
            }
            Gesture::LinkDrag { source, .. } => match target {
                Some(PointerTarget::Socket(sink)) => store.link_properties(source, sink).map_err(|err| {
                    warn!(source = %source, sink = %sink, error = %err, "Link rejected");
                    err
                }),
                _ => Ok(()),
            },
            Gesture::SocketPress { sink } => {
                if target == Some(PointerTarget::Socket(sink)) {
                    store.unlink_property(sink)?;
                }
                Ok(())
            }
        }
    }

    fn abort(&mut self, store: &mut Store) {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if let Gesture::BlockDrag { block_id, .. } = gesture {
            match store.move_block().cancel() {
                Ok(()) => debug!(block_id = %block_id, "Drag cancelled"),
                Err(GraphError::NoActiveDrag) => {}
                Err(err) => warn!(error = %err, "Failed to cancel drag"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f64, y: f64, target: PointerTarget) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            target: Some(target),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_move_rounds_displacement() {
        let mut store = Store::default();
        let id = store.add_block("add").unwrap();
        let mut ui = Interaction::new();

        ui.handle(&mut store, down(10.0, 10.0, PointerTarget::BlockHeader(id))).unwrap();
        ui.handle(&mut store, mv(20.4, 7.6)).unwrap();
        let drag = store.editing().dragging.unwrap();
        assert_eq!(drag.delta, Point::new(10.0, -2.0));
    }

    #[test]
    fn test_down_on_empty_canvas_stays_idle() {
        let mut store = Store::default();
        let mut ui = Interaction::new();
        ui.handle(
            &mut store,
            PointerEvent::Down {
                position: Point::ZERO,
                target: None,
            },
        )
        .unwrap();
        assert!(ui.is_idle());
    }

    #[test]
    fn test_link_preview_tracks_pointer() {
        let mut store = Store::default();
        let id = store.add_block("add").unwrap();
        let c = store.block(id).unwrap().properties[2];
        let mut ui = Interaction::new();

        ui.handle(&mut store, down(300.0, 184.0, PointerTarget::Socket(c))).unwrap();
        ui.handle(&mut store, mv(350.0, 190.0)).unwrap();
        assert_eq!(
            ui.preview(),
            Some(LinkLine {
                from: Point::new(300.0, 184.0),
                to: Point::new(350.0, 190.0),
            })
        );
        // nothing persisted while dragging a link
        assert!(store.links().is_empty());
    }
}
