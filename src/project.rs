//! Persisted project model.
//!
//! A [`Project`] is the ordered list of top-level blocks plus the sparse
//! [`NodeTable`] holding every block and property. Blocks and their
//! properties are separate nodes so that links can name a single property by
//! id. The serde layout of these types is the on-disk file format:
//!
//! ```json
//! {
//!   "blockOrder": [0],
//!   "nodes": [
//!     { "kind": "block", "type": "add", "pos": { "x": 100.0, "y": 100.0 }, "properties": [1] },
//!     { "kind": "property", "blockId": 0, "key": "a",
//!       "value": { "kind": "number", "value": 1.0 }, "link": null }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::arena::{NodeId, NodeTable};
use crate::config::LinkRules;
use crate::error::{GraphError, GraphResult};
use crate::registry::{Direction, Registry};

/// 2-D position or displacement in canvas units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component, growing rightwards.
    pub x: f64,
    /// Vertical component, growing downwards.
    pub y: f64,
}

impl Point {
    /// Origin, and the empty displacement.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Point at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both components are finite. JSON has no encoding for NaN or
    /// infinity, so only finite points can be saved.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Round both components to whole units.
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Value held by a property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    /// Finite floating-point number.
    Number(f64),
    /// Free text.
    String(String),
}

impl TypedValue {
    /// Name of the value kind as written in the file format.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Number(_) => "number",
            TypedValue::String(_) => "string",
        }
    }

    /// Whether both values are of the same kind.
    pub fn same_kind(&self, other: &TypedValue) -> bool {
        self.kind_name() == other.kind_name()
    }

    /// Reject number values that cannot be written to a project file.
    pub fn ensure_finite(&self) -> GraphResult<()> {
        match self {
            TypedValue::Number(n) if !n.is_finite() => Err(GraphError::NonFiniteValue {
                what: "number value",
                value: *n,
            }),
            _ => Ok(()),
        }
    }

    /// The number, if this is a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            TypedValue::String(_) => None,
        }
    }
}

/// A block instance on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Registry kind of this block.
    #[serde(rename = "type")]
    pub kind: String,
    /// Top-left corner in canvas units.
    #[serde(rename = "pos")]
    pub position: Point,
    /// Owned property ids in display order.
    pub properties: Vec<NodeId>,
}

/// A named, typed slot on a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Owning block.
    #[serde(rename = "blockId")]
    pub block_id: NodeId,
    /// Key from the block kind's definition.
    pub key: String,
    /// Current value. Its kind is fixed by the definition.
    pub value: TypedValue,
    /// Source property this sink reads from.
    #[serde(default)]
    pub link: Option<NodeId>,
}

/// Entry of the node table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// A block on the canvas.
    Block(Block),
    /// A property of some block.
    Property(Property),
}

impl Node {
    /// The block, if this node is one.
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            Node::Property(_) => None,
        }
    }

    /// The property, if this node is one.
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Node::Property(prop) => Some(prop),
            Node::Block(_) => None,
        }
    }

    /// `"block"` or `"property"`.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Node::Block(_) => "block",
            Node::Property(_) => "property",
        }
    }
}

/// The persisted graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Top-level blocks in creation order.
    pub block_order: Vec<NodeId>,
    /// Every block and property, tombstones included.
    pub nodes: NodeTable<Node>,
}

impl Project {
    /// Empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `id` to a live block.
    pub fn block(&self, id: NodeId) -> GraphResult<&Block> {
        self.nodes
            .get(id)
            .and_then(Node::as_block)
            .ok_or(GraphError::InvalidBlockId(id))
    }

    pub(crate) fn block_mut(&mut self, id: NodeId) -> GraphResult<&mut Block> {
        match self.nodes.get_mut(id) {
            Some(Node::Block(block)) => Ok(block),
            _ => Err(GraphError::InvalidBlockId(id)),
        }
    }

    /// Resolve `id` to a live property.
    pub fn property(&self, id: NodeId) -> GraphResult<&Property> {
        self.nodes
            .get(id)
            .and_then(Node::as_property)
            .ok_or(GraphError::InvalidPropertyId(id))
    }

    pub(crate) fn property_mut(&mut self, id: NodeId) -> GraphResult<&mut Property> {
        match self.nodes.get_mut(id) {
            Some(Node::Property(prop)) => Ok(prop),
            _ => Err(GraphError::InvalidPropertyId(id)),
        }
    }

    /// The block owning property `id`, with the property's slot index.
    ///
    /// Fails with `InvalidNodeType` if the property's owner reference does
    /// not resolve to a block that lists it.
    pub fn owner_of(&self, id: NodeId) -> GraphResult<(NodeId, &Block, usize)> {
        let prop = self.property(id)?;
        let block = match self.nodes.get(prop.block_id) {
            Some(Node::Block(block)) => block,
            _ => {
                return Err(GraphError::InvalidNodeType {
                    id: prop.block_id,
                    expected: "block",
                })
            }
        };
        let index = block
            .properties
            .iter()
            .position(|p| *p == id)
            .ok_or(GraphError::InvalidNodeType {
                id,
                expected: "property of its owning block",
            })?;
        Ok((prop.block_id, block, index))
    }

    /// Top-level blocks in display order.
    ///
    /// Ids in `block_order` that fail to resolve are skipped; a committed
    /// project never contains any.
    pub fn blocks(&self) -> impl Iterator<Item = (NodeId, &Block)> {
        self.block_order
            .iter()
            .filter_map(|id| self.nodes.get(*id).and_then(Node::as_block).map(|b| (*id, b)))
    }

    /// Every linked sink property, walking blocks in display order.
    pub fn links(&self) -> Vec<NodeId> {
        self.blocks()
            .flat_map(|(_, block)| block.properties.iter().copied())
            .filter(|id| matches!(self.property(*id), Ok(prop) if prop.link.is_some()))
            .collect()
    }

    /// Direction of property `id` according to its block's definition.
    pub fn direction_of(&self, registry: &Registry, id: NodeId) -> GraphResult<Direction> {
        let prop = self.property(id)?;
        let block = self.block(prop.block_id).map_err(|_| GraphError::InvalidNodeType {
            id: prop.block_id,
            expected: "block",
        })?;
        let def = registry.get(&block.kind)?;
        def.property(&prop.key)
            .map(|p| p.direction)
            .ok_or_else(|| {
                GraphError::SchemaViolation(format!(
                    "property '{}' is not defined on block kind '{}'",
                    prop.key, block.kind
                ))
            })
    }
}

/// Check every structural invariant of a project.
///
/// Used after decoding a file so that an inconsistent project is rejected
/// with `SchemaViolation` before it reaches the store.
pub fn validate_project(project: &Project, registry: &Registry, rules: &LinkRules) -> GraphResult<()> {
    let violation = |msg: String| Err(GraphError::SchemaViolation(msg));

    let mut seen_blocks = HashSet::new();
    for id in &project.block_order {
        if !seen_blocks.insert(*id) {
            return violation(format!("block {id} appears twice in blockOrder"));
        }
        match project.nodes.get(*id) {
            Some(Node::Block(_)) => {}
            Some(other) => {
                return violation(format!(
                    "blockOrder entry {id} is a {}, not a block",
                    other.variant_name()
                ))
            }
            None => return violation(format!("blockOrder entry {id} does not resolve")),
        }
    }

    let mut owned = HashSet::new();
    for (id, node) in project.nodes.iter() {
        let Node::Block(block) = node else { continue };
        if !seen_blocks.contains(&id) {
            return violation(format!("block {id} is missing from blockOrder"));
        }
        let def = registry
            .lookup(&block.kind)
            .ok_or_else(|| GraphError::SchemaViolation(format!("block {id} has unknown type '{}'", block.kind)))?;

        if block.properties.len() != def.properties.len() {
            return violation(format!(
                "block {id} has {} properties, '{}' defines {}",
                block.properties.len(),
                block.kind,
                def.properties.len()
            ));
        }
        for (prop_id, prop_def) in block.properties.iter().zip(&def.properties) {
            let prop = match project.nodes.get(*prop_id) {
                Some(Node::Property(prop)) => prop,
                Some(_) => return violation(format!("block {id} lists non-property node {prop_id}")),
                None => return violation(format!("block {id} lists missing property {prop_id}")),
            };
            if prop.block_id != id {
                return violation(format!(
                    "property {prop_id} is listed by block {id} but owned by {}",
                    prop.block_id
                ));
            }
            if !owned.insert(*prop_id) {
                return violation(format!("property {prop_id} is listed more than once"));
            }
            if prop.key != prop_def.key {
                return violation(format!(
                    "property {prop_id} of block {id} has key '{}', expected '{}'",
                    prop.key, prop_def.key
                ));
            }
            if rules.enforce_value_kind && !prop.value.same_kind(&prop_def.default) {
                return violation(format!(
                    "property {prop_id} holds a {} value, '{}.{}' is {}",
                    prop.value.kind_name(),
                    block.kind,
                    prop.key,
                    prop_def.default.kind_name()
                ));
            }
        }
    }

    for (id, node) in project.nodes.iter() {
        let Node::Property(prop) = node else { continue };
        if !owned.contains(&id) {
            return violation(format!("property {id} is not listed by any block"));
        }
        let Some(source) = prop.link else { continue };
        let source_prop = match project.nodes.get(source) {
            Some(Node::Property(p)) => p,
            _ => return violation(format!("property {id} links to {source}, which is not a live property")),
        };
        if rules.enforce_direction {
            let sink_dir = project.direction_of(registry, id)?;
            let source_dir = project.direction_of(registry, source)?;
            if sink_dir != Direction::Input || source_dir != Direction::Output {
                return violation(format!(
                    "link {source} -> {id} connects {} to {}",
                    source_dir.as_str(),
                    sink_dir.as_str()
                ));
            }
        }
        if rules.enforce_value_kind && !source_prop.value.same_kind(&prop.value) {
            return violation(format!(
                "link {source} -> {id} connects {} to {}",
                source_prop.value.kind_name(),
                prop.value.kind_name()
            ));
        }
    }

    Ok(())
}
