//! Edit actions for the project store.
//!
//! Every graph edit is an [`Action`] value. Applying an action is a pure
//! function of the previous [`Snapshot`]: it copies the snapshot, mutates
//! the copy and returns it, or returns an error and leaves nothing behind.
//! The project sits behind an `Arc`, so drag-only actions share it with the
//! previous snapshot and only project edits copy the node table.
//! The store only publishes the copy once the whole action succeeded, so no
//! reader ever sees a half-applied edit.

use std::collections::HashSet;
use std::sync::Arc;

use crate::arena::NodeId;
use crate::config::EditorConfig;
use crate::error::{GraphError, GraphResult};
use crate::project::{validate_project, Block, Node, Point, Project, Property, TypedValue};
use crate::registry::{Direction, Registry};

use super::{DragState, EditingState, Snapshot};

/// Unified edit command for all store operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Append a block of a registered kind with default properties.
    AddBlock {
        /// Registry kind.
        kind: String,
    },
    /// Delete a block, its properties and links reading from them.
    RemoveBlock {
        /// Block to delete.
        block_id: NodeId,
    },
    /// Begin dragging a block.
    DragStart {
        /// Block to drag.
        block_id: NodeId,
    },
    /// Replace the live drag offset.
    DragMove {
        /// Displacement since the drag started.
        delta: Point,
    },
    /// Apply the live offset and end the drag.
    DragCommit,
    /// End the drag without moving the block.
    DragCancel,
    /// Make `sink` read from `source`.
    LinkProperties {
        /// Output property.
        source: NodeId,
        /// Input property.
        sink: NodeId,
    },
    /// Clear the link on `sink`.
    UnlinkProperty {
        /// Input property.
        sink: NodeId,
    },
    /// Write a property value.
    SetPropertyValue {
        /// Target property.
        property_id: NodeId,
        /// New value, of the property's kind.
        value: TypedValue,
    },
    /// Replace the project after validating it.
    LoadProject {
        /// Decoded project.
        project: Project,
    },
    /// Reset to an empty project.
    NewProject,
}

impl Action {
    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddBlock { .. } => "add_block",
            Action::RemoveBlock { .. } => "remove_block",
            Action::DragStart { .. } => "drag_start",
            Action::DragMove { .. } => "drag_move",
            Action::DragCommit => "drag_commit",
            Action::DragCancel => "drag_cancel",
            Action::LinkProperties { .. } => "link_properties",
            Action::UnlinkProperty { .. } => "unlink_property",
            Action::SetPropertyValue { .. } => "set_property_value",
            Action::LoadProject { .. } => "load_project",
            Action::NewProject => "new_project",
        }
    }

    /// Whether applying the action can change the persisted project.
    ///
    /// Drag start/move only touch the editing state.
    pub fn touches_project(&self) -> bool {
        !matches!(
            self,
            Action::DragStart { .. } | Action::DragMove { .. } | Action::DragCancel
        )
    }

    /// Compute the snapshot that follows `prev`.
    pub fn apply(
        &self,
        prev: &Snapshot,
        registry: &Registry,
        config: &EditorConfig,
    ) -> GraphResult<Snapshot> {
        let mut next = prev.clone();
        match self {
            Action::AddBlock { kind } => {
                add_block(Arc::make_mut(&mut next.project), registry, config, kind)?;
            }
            Action::RemoveBlock { block_id } => {
                remove_block(Arc::make_mut(&mut next.project), *block_id)?;
                if next.editing.dragged_block() == Some(*block_id) {
                    next.editing.dragging = None;
                }
            }
            Action::DragStart { block_id } => {
                next.project.block(*block_id)?;
                if let Some(active) = &prev.editing.dragging {
                    return Err(GraphError::DragInProgress(active.block_id));
                }
                next.editing.dragging = Some(DragState {
                    block_id: *block_id,
                    delta: Point::ZERO,
                });
            }
            Action::DragMove { delta } => {
                if !delta.is_finite() {
                    return Err(GraphError::NonFiniteValue {
                        what: "drag offset",
                        value: if delta.x.is_finite() { delta.y } else { delta.x },
                    });
                }
                let drag = next.editing.dragging.as_mut().ok_or(GraphError::NoActiveDrag)?;
                drag.delta = *delta;
            }
            Action::DragCommit => {
                let drag = next.editing.dragging.take().ok_or(GraphError::NoActiveDrag)?;
                let block = Arc::make_mut(&mut next.project).block_mut(drag.block_id)?;
                let position = block.position + drag.delta;
                if !position.is_finite() {
                    return Err(GraphError::NonFiniteValue {
                        what: "block position",
                        value: if position.x.is_finite() { position.y } else { position.x },
                    });
                }
                block.position = position;
            }
            Action::DragCancel => {
                next.editing.dragging.take().ok_or(GraphError::NoActiveDrag)?;
            }
            Action::LinkProperties { source, sink } => {
                link_properties(Arc::make_mut(&mut next.project), registry, config, *source, *sink)?;
            }
            Action::UnlinkProperty { sink } => {
                Arc::make_mut(&mut next.project).property_mut(*sink)?.link = None;
            }
            Action::SetPropertyValue { property_id, value } => {
                value.ensure_finite()?;
                let prop = Arc::make_mut(&mut next.project).property_mut(*property_id)?;
                if config.links.enforce_value_kind && !prop.value.same_kind(value) {
                    return Err(GraphError::ValueTypeMismatch {
                        id: *property_id,
                        expected: prop.value.kind_name(),
                        found: value.kind_name(),
                    });
                }
                prop.value = value.clone();
            }
            Action::LoadProject { project } => {
                validate_project(project, registry, &config.links)?;
                next = Snapshot {
                    project: Arc::new(project.clone()),
                    editing: EditingState::default(),
                };
            }
            Action::NewProject => {
                next = Snapshot::default();
            }
        }
        Ok(next)
    }
}

fn add_block(
    project: &mut Project,
    registry: &Registry,
    config: &EditorConfig,
    kind: &str,
) -> GraphResult<NodeId> {
    let def = registry.get(kind)?;

    let position = match project.block_order.last() {
        Some(last) => {
            let last = project.block(*last)?;
            Point::new(last.position.x + config.layout.spacing, last.position.y)
        }
        None => config.layout.origin,
    };

    let block_id = project.nodes.allocate(Node::Block(Block {
        kind: def.kind.clone(),
        position,
        properties: Vec::with_capacity(def.properties.len()),
    }));
    project.block_order.push(block_id);

    let mut property_ids = Vec::with_capacity(def.properties.len());
    for prop in &def.properties {
        property_ids.push(project.nodes.allocate(Node::Property(Property {
            block_id,
            key: prop.key.clone(),
            value: prop.default.clone(),
            link: None,
        })));
    }
    project.block_mut(block_id)?.properties = property_ids;

    Ok(block_id)
}

fn remove_block(project: &mut Project, block_id: NodeId) -> GraphResult<()> {
    if !project.block_order.contains(&block_id) {
        return Err(GraphError::InvalidBlockId(block_id));
    }
    let owned: HashSet<NodeId> = project.block(block_id)?.properties.iter().copied().collect();

    for (_, node) in project.nodes.iter_mut() {
        if let Node::Property(prop) = node {
            if prop.link.is_some_and(|source| owned.contains(&source)) {
                prop.link = None;
            }
        }
    }

    for prop_id in &owned {
        project.nodes.tombstone(*prop_id);
    }
    project.block_order.retain(|id| *id != block_id);
    project.nodes.tombstone(block_id);
    Ok(())
}

fn link_properties(
    project: &mut Project,
    registry: &Registry,
    config: &EditorConfig,
    source: NodeId,
    sink: NodeId,
) -> GraphResult<()> {
    let source_prop = project.property(source)?;
    let sink_prop = project.property(sink)?;
    let mismatch = |reason: String| GraphError::LinkTypeMismatch {
        from: source,
        to: sink,
        reason,
    };

    if source == sink {
        return Err(mismatch("a property cannot link to itself".to_string()));
    }
    if config.links.enforce_direction {
        let source_dir = project.direction_of(registry, source)?;
        let sink_dir = project.direction_of(registry, sink)?;
        if source_dir != Direction::Output || sink_dir != Direction::Input {
            return Err(mismatch(format!(
                "expected output -> input, got {} -> {}",
                source_dir.as_str(),
                sink_dir.as_str()
            )));
        }
    }
    if config.links.enforce_value_kind && !source_prop.value.same_kind(&sink_prop.value) {
        return Err(mismatch(format!(
            "value kinds differ ({} -> {})",
            source_prop.value.kind_name(),
            sink_prop.value.kind_name()
        )));
    }

    project.property_mut(sink)?.link = Some(source);
    Ok(())
}
