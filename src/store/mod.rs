//! Project store: the mutation engine of the editor.
//!
//! The store owns the current [`Snapshot`] (persisted [`Project`] plus the
//! transient [`EditingState`]) and applies [`Action`]s to it. Each action
//! builds a complete next snapshot from the previous one; only a successful
//! action replaces the current snapshot, so every failure is all-or-nothing.
//!
//! New snapshots are published on a `tokio::sync::watch` channel. Derived
//! views such as [`LinkView`](crate::geometry::LinkView) subscribe with
//! [`Store::subscribe`] and recompute when they see a new revision.
//!
//! ```
//! use block_graph::store::Store;
//! use block_graph::project::Point;
//!
//! # fn main() -> Result<(), block_graph::error::GraphError> {
//! let mut store = Store::default();
//! let add = store.add_block("add")?;
//! let mul = store.add_block("multiply")?;
//!
//! let c = store.project().block(add)?.properties[2];
//! let a = store.project().block(mul)?.properties[0];
//! store.link_properties(c, a)?;
//!
//! store.move_block().start(mul)?;
//! store.move_block().update(Point::new(50.0, -20.0))?;
//! store.move_block().commit()?;
//! # Ok(())
//! # }
//! ```

pub mod actions;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::arena::NodeId;
use crate::config::EditorConfig;
use crate::error::GraphResult;
use crate::persistence;
use crate::project::{Block, Point, Project, Property, TypedValue};
use crate::registry::Registry;

pub use actions::Action;

/// Live drag offset of one block. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragState {
    /// Block being dragged.
    pub block_id: NodeId,
    /// Cumulative pointer displacement since the drag started.
    pub delta: Point,
}

/// Transient editing state. Absent at rest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditingState {
    /// Active block drag, if any.
    pub dragging: Option<DragState>,
}

impl EditingState {
    /// Block being dragged, if any.
    pub fn dragged_block(&self) -> Option<NodeId> {
        self.dragging.map(|drag| drag.block_id)
    }

    /// Live offset of `block_id`, zero unless it is being dragged.
    pub fn delta_for(&self, block_id: NodeId) -> Point {
        match self.dragging {
            Some(drag) if drag.block_id == block_id => drag.delta,
            _ => Point::ZERO,
        }
    }
}

/// One immutable value of the whole editor state.
///
/// Cloning is cheap: the project is shared until an action edits it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Persisted graph.
    pub project: Arc<Project>,
    /// Transient editing state.
    pub editing: EditingState,
}

/// Owner of the current snapshot and the only writer of editor state.
pub struct Store {
    registry: Arc<Registry>,
    config: EditorConfig,
    current: Arc<Snapshot>,
    publisher: watch::Sender<Arc<Snapshot>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::with_registry(Registry::builtin(), EditorConfig::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("blocks", &self.current.project.block_order.len())
            .field("nodes", &self.current.project.nodes.len())
            .field("dragging", &self.current.editing.dragging)
            .finish()
    }
}

impl Store {
    /// Build a store whose registry is the built-in one extended with the
    /// block kinds listed in `config`.
    pub fn new(config: EditorConfig) -> GraphResult<Self> {
        let registry = config.registry()?;
        Ok(Self::with_registry(registry, config))
    }

    /// Build a store around an explicit registry.
    pub fn with_registry(registry: Registry, config: EditorConfig) -> Self {
        let current = Arc::new(Snapshot::default());
        let (publisher, _) = watch::channel(current.clone());
        Self {
            registry: Arc::new(registry),
            config,
            current,
            publisher,
        }
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.clone()
    }

    /// Current persisted project.
    pub fn project(&self) -> &Project {
        &self.current.project
    }

    /// Current editing state.
    pub fn editing(&self) -> &EditingState {
        &self.current.editing
    }

    /// Block kinds this store accepts.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Resolve `id` to a live block.
    pub fn block(&self, id: NodeId) -> GraphResult<&Block> {
        self.current.project.block(id)
    }

    /// Resolve `id` to a live property.
    pub fn property(&self, id: NodeId) -> GraphResult<&Property> {
        self.current.project.property(id)
    }

    /// Every linked sink property in block display order.
    pub fn links(&self) -> Vec<NodeId> {
        self.current.project.links()
    }

    /// Persisted position plus the live drag offset, if any.
    pub fn effective_position(&self, block_id: NodeId) -> GraphResult<Point> {
        let block = self.block(block_id)?;
        Ok(block.position + self.current.editing.delta_for(block_id))
    }

    /// Receive every snapshot published after this call.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Apply `action` and publish the resulting snapshot.
    ///
    /// On error the current snapshot is left untouched and nothing is
    /// published.
    pub fn dispatch(&mut self, action: Action) -> GraphResult<Arc<Snapshot>> {
        let next = match action.apply(&self.current, &self.registry, &self.config) {
            Ok(next) => Arc::new(next),
            Err(err) => {
                debug!(action = action.name(), error = %err, "Action rejected");
                return Err(err);
            }
        };
        if action.touches_project() {
            debug!(
                action = action.name(),
                blocks = next.project.block_order.len(),
                nodes = next.project.nodes.len(),
                "Project updated"
            );
        } else {
            trace!(action = action.name(), dragging = ?next.editing.dragging, "Editing state updated");
        }
        self.current = next.clone();
        self.publisher.send_replace(next.clone());
        Ok(next)
    }

    /// Add a block of `kind` with its default properties. Returns the new block id.
    pub fn add_block(&mut self, kind: &str) -> GraphResult<NodeId> {
        let id = self.current.project.nodes.next_id();
        self.dispatch(Action::AddBlock {
            kind: kind.to_string(),
        })?;
        Ok(id)
    }

    /// Remove a block, its properties and every link that reads from it.
    pub fn remove_block(&mut self, block_id: NodeId) -> GraphResult<()> {
        self.dispatch(Action::RemoveBlock { block_id }).map(drop)
    }

    /// Drag session operations for block moves.
    pub fn move_block(&mut self) -> MoveBlock<'_> {
        MoveBlock { store: self }
    }

    /// Point `sink` at `source`, replacing any earlier link on `sink`.
    pub fn link_properties(&mut self, source: NodeId, sink: NodeId) -> GraphResult<()> {
        self.dispatch(Action::LinkProperties { source, sink }).map(drop)
    }

    /// Clear the link on `sink`. Idempotent.
    pub fn unlink_property(&mut self, sink: NodeId) -> GraphResult<()> {
        self.dispatch(Action::UnlinkProperty { sink }).map(drop)
    }

    /// Replace the value of a property. Numbers must be finite.
    pub fn set_property_value(&mut self, property_id: NodeId, value: TypedValue) -> GraphResult<()> {
        self.dispatch(Action::SetPropertyValue { property_id, value }).map(drop)
    }

    /// Encode the current project in the file format.
    pub fn dump_project(&self) -> GraphResult<Vec<u8>> {
        persistence::dump(&self.current.project)
    }

    /// Replace the project with the one encoded in `bytes`.
    ///
    /// The decoded project is validated first; on any error the store is
    /// unchanged. A successful load also clears the editing state.
    pub fn load_project(&mut self, bytes: &[u8]) -> GraphResult<()> {
        let project = persistence::decode(bytes)?;
        self.replace_project(project)
    }

    /// Replace the project with an already decoded one, after validation.
    pub fn replace_project(&mut self, project: Project) -> GraphResult<()> {
        self.dispatch(Action::LoadProject { project }).map(drop)
    }

    /// Reset to an empty project.
    pub fn new_project(&mut self) -> GraphResult<()> {
        self.dispatch(Action::NewProject).map(drop)
    }
}

/// Handle for the block drag session of a [`Store`].
///
/// Obtained from [`Store::move_block`].
pub struct MoveBlock<'a> {
    store: &'a mut Store,
}

impl MoveBlock<'_> {
    /// Start dragging `block_id` with a zero offset.
    pub fn start(self, block_id: NodeId) -> GraphResult<()> {
        self.store.dispatch(Action::DragStart { block_id }).map(drop)
    }

    /// Replace the live offset with `delta` (cumulative since start).
    pub fn update(self, delta: Point) -> GraphResult<()> {
        self.store.dispatch(Action::DragMove { delta }).map(drop)
    }

    /// Add the live offset to the block position and end the session.
    pub fn commit(self) -> GraphResult<()> {
        self.store.dispatch(Action::DragCommit).map(drop)
    }

    /// End the session without moving the block.
    pub fn cancel(self) -> GraphResult<()> {
        self.store.dispatch(Action::DragCancel).map(drop)
    }

    /// Whether a drag session is active.
    pub fn is_active(&self) -> bool {
        self.store.current.editing.dragging.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_action_publishes_nothing() {
        let mut store = Store::default();
        let rx = store.subscribe();
        let before = store.snapshot();

        assert!(store.add_block("divide").is_err());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_subscriber_sees_new_snapshot() {
        let mut store = Store::default();
        let mut rx = store.subscribe();

        let id = store.add_block("add").unwrap();
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.project.block_order, vec![id]);
    }

    #[test]
    fn test_effective_position_includes_drag() {
        let mut store = Store::default();
        let id = store.add_block("add").unwrap();
        store.move_block().start(id).unwrap();
        store.move_block().update(Point::new(10.0, 5.0)).unwrap();

        assert_eq!(store.effective_position(id).unwrap(), Point::new(110.0, 105.0));
        assert_eq!(store.block(id).unwrap().position, Point::new(100.0, 100.0));
        assert!(store.move_block().is_active());
    }

    #[test]
    fn test_drag_move_shares_project() {
        let mut store = Store::default();
        let id = store.add_block("add").unwrap();
        store.move_block().start(id).unwrap();
        let before = store.snapshot();

        store.move_block().update(Point::new(3.0, 4.0)).unwrap();
        assert!(Arc::ptr_eq(&before.project, &store.snapshot().project));

        store.move_block().commit().unwrap();
        assert!(!Arc::ptr_eq(&before.project, &store.snapshot().project));
        // the earlier snapshot still sees the old position
        assert_eq!(before.project.block(id).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_new_project_resets() {
        let mut store = Store::default();
        let id = store.add_block("add").unwrap();
        store.move_block().start(id).unwrap();
        store.new_project().unwrap();
        assert!(store.project().block_order.is_empty());
        assert!(store.editing().dragging.is_none());
    }
}
