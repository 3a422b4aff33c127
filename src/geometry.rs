//! Link geometry.
//!
//! Maps a linked sink property to the two endpoints of the line drawn for
//! it. The source end sits on the right edge of the source block, the sink
//! end on the left edge of the sink block, each vertically centred on the
//! property's row. Positions include the live drag offset, so links follow a
//! block while it is being dragged even though the project has not changed.
//!
//! The projection is a pure function of a [`Snapshot`]; [`LinkView`] caches
//! it per published snapshot.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::arena::NodeId;
use crate::config::LayoutConfig;
use crate::error::GraphResult;
use crate::project::{Point, Project};
use crate::store::{EditingState, Snapshot};

/// Endpoints of one rendered link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkLine {
    /// End at the source (output) property.
    pub from: Point,
    /// End at the sink (input) property.
    pub to: Point,
}

/// Vertical offset of property row `index` from the block's top edge.
pub fn row_offset(index: usize, layout: &LayoutConfig) -> f64 {
    (index as f64 + 1.5) * layout.property_height
}

/// Anchor of property `id` on its block, including any live drag offset.
///
/// `right_edge` selects the output side of the block.
fn anchor(
    project: &Project,
    editing: &EditingState,
    layout: &LayoutConfig,
    id: NodeId,
    right_edge: bool,
) -> GraphResult<Point> {
    let (block_id, block, index) = project.owner_of(id)?;
    let origin = block.position + editing.delta_for(block_id);
    let x = if right_edge { layout.block_width } else { 0.0 };
    Ok(origin + Point::new(x, row_offset(index, layout)))
}

/// Endpoints of the link stored on `sink`, or `None` if it is unlinked.
pub fn link_endpoints(
    project: &Project,
    editing: &EditingState,
    layout: &LayoutConfig,
    sink: NodeId,
) -> GraphResult<Option<LinkLine>> {
    let Some(source) = project.property(sink)?.link else {
        return Ok(None);
    };
    Ok(Some(LinkLine {
        from: anchor(project, editing, layout, source, true)?,
        to: anchor(project, editing, layout, sink, false)?,
    }))
}

/// Every link line of a snapshot, keyed by sink property, in block order.
pub fn project_links(snapshot: &Snapshot, layout: &LayoutConfig) -> GraphResult<Vec<(NodeId, LinkLine)>> {
    let mut lines = Vec::new();
    for sink in snapshot.project.links() {
        if let Some(line) = link_endpoints(&snapshot.project, &snapshot.editing, layout, sink)? {
            lines.push((sink, line));
        }
    }
    Ok(lines)
}

/// Link lines kept in step with a store.
///
/// Recomputes lazily: [`lines`](Self::lines) only reprojects when the store
/// has published a snapshot since the last call.
pub struct LinkView {
    receiver: watch::Receiver<Arc<Snapshot>>,
    layout: LayoutConfig,
    lines: Vec<(NodeId, LinkLine)>,
    stale: bool,
}

impl LinkView {
    /// View over the snapshots published on `receiver`.
    pub fn new(receiver: watch::Receiver<Arc<Snapshot>>, layout: LayoutConfig) -> Self {
        Self {
            receiver,
            layout,
            lines: Vec::new(),
            stale: true,
        }
    }

    /// Current link lines.
    ///
    /// A snapshot that fails to project (an internal consistency error)
    /// is logged and yields no lines.
    pub fn lines(&mut self) -> &[(NodeId, LinkLine)] {
        // A closed channel means the store is gone; keep the last lines.
        let changed = self.receiver.has_changed().unwrap_or(false);
        if changed || self.stale {
            let snapshot = self.receiver.borrow_and_update().clone();
            self.lines = match project_links(&snapshot, &self.layout) {
                Ok(lines) => lines,
                Err(err) => {
                    warn!(error = %err, "Failed to project links");
                    Vec::new()
                }
            };
            self.stale = false;
        }
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn linked_store() -> (Store, NodeId, NodeId) {
        let mut store = Store::default();
        let add = store.add_block("add").unwrap();
        let mul = store.add_block("multiply").unwrap();
        let c = store.block(add).unwrap().properties[2];
        let b = store.block(mul).unwrap().properties[1];
        store.link_properties(c, b).unwrap();
        (store, c, b)
    }

    #[test]
    fn test_link_endpoints() {
        let (store, _, b) = linked_store();
        let layout = LayoutConfig::default();
        let line = link_endpoints(store.project(), store.editing(), &layout, b)
            .unwrap()
            .unwrap();
        // source: add at (100,100), property index 2
        assert_eq!(line.from, Point::new(300.0, 100.0 + 3.5 * 24.0));
        // sink: multiply at (400,100), property index 1
        assert_eq!(line.to, Point::new(400.0, 100.0 + 2.5 * 24.0));
    }

    #[test]
    fn test_unlinked_sink_has_no_line() {
        let (store, c, _) = linked_store();
        let layout = LayoutConfig::default();
        assert_eq!(link_endpoints(store.project(), store.editing(), &layout, c).unwrap(), None);
    }

    #[test]
    fn test_endpoints_follow_drag() {
        let (mut store, _, b) = linked_store();
        let layout = LayoutConfig::default();
        let mul = store.property(b).unwrap().block_id;

        store.move_block().start(mul).unwrap();
        store.move_block().update(Point::new(-30.0, 12.0)).unwrap();
        let line = link_endpoints(store.project(), store.editing(), &layout, b)
            .unwrap()
            .unwrap();
        assert_eq!(line.from, Point::new(300.0, 184.0));
        assert_eq!(line.to, Point::new(370.0, 172.0));
    }

    #[test]
    fn test_link_view_recomputes_on_publish() {
        let (mut store, _, b) = linked_store();
        let mut view = LinkView::new(store.subscribe(), LayoutConfig::default());
        assert_eq!(view.lines().len(), 1);

        store.unlink_property(b).unwrap();
        assert!(view.lines().is_empty());
    }
}
