//! Block type registry.
//!
//! The registry is the static catalog of block kinds. Each [`BlockDef`] lists
//! its properties in display order, and each [`PropertyDef`] fixes the key,
//! the link [`Direction`] and the default [`TypedValue`] a freshly added block
//! starts with. Definitions are immutable once a store has been built.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::project::TypedValue;

/// Role of a property in link topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Link sink. Stores the id of the property it reads from.
    Input,
    /// Link source. Other blocks' inputs point at it.
    Output,
}

impl Direction {
    /// Lowercase name, as in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Definition of one property slot on a block kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Name, unique within the block kind.
    pub key: String,
    /// Whether the property is a link source or sink.
    pub direction: Direction,
    /// Initial value; its kind is the property's value kind.
    pub default: TypedValue,
}

impl PropertyDef {
    /// Input property definition.
    pub fn input(key: &str, default: TypedValue) -> Self {
        Self {
            key: key.to_string(),
            direction: Direction::Input,
            default,
        }
    }

    /// Output property definition.
    pub fn output(key: &str, default: TypedValue) -> Self {
        Self {
            key: key.to_string(),
            direction: Direction::Output,
            default,
        }
    }
}

/// Definition of a block kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Kind name used in project files.
    pub kind: String,
    /// Property slots in display order.
    pub properties: Vec<PropertyDef>,
}

impl BlockDef {
    /// Block kind with the given properties.
    pub fn new(kind: &str, properties: Vec<PropertyDef>) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
        }
    }

    /// Look up a property definition by key.
    pub fn property(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|def| def.key == key)
    }
}

/// Catalog of known block kinds, in menu order.
#[derive(Clone, Debug, PartialEq)]
pub struct Registry {
    defs: Vec<BlockDef>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// The built-in arithmetic blocks plus `constant` and `note`.
    pub fn builtin() -> Self {
        let num = TypedValue::Number;
        Self {
            defs: vec![
                BlockDef::new(
                    "add",
                    vec![
                        PropertyDef::input("a", num(1.0)),
                        PropertyDef::input("b", num(2.0)),
                        PropertyDef::output("c", num(3.0)),
                    ],
                ),
                BlockDef::new(
                    "multiply",
                    vec![
                        PropertyDef::input("a", num(1.0)),
                        PropertyDef::input("b", num(1.0)),
                        PropertyDef::output("c", num(1.0)),
                    ],
                ),
                BlockDef::new(
                    "subtract",
                    vec![
                        PropertyDef::input("a", num(0.0)),
                        PropertyDef::input("b", num(0.0)),
                        PropertyDef::output("c", num(0.0)),
                    ],
                ),
                BlockDef::new("constant", vec![PropertyDef::output("value", num(0.0))]),
                BlockDef::new(
                    "note",
                    vec![PropertyDef::input("text", TypedValue::String(String::new()))],
                ),
            ],
        }
    }

    /// Add a block kind. Kinds must be unique and property keys unique
    /// within a kind.
    pub fn register(&mut self, def: BlockDef) -> GraphResult<()> {
        if self.lookup(&def.kind).is_some() {
            return Err(GraphError::SchemaViolation(format!(
                "duplicate block kind '{}'",
                def.kind
            )));
        }
        for (i, prop) in def.properties.iter().enumerate() {
            if def.properties[..i].iter().any(|p| p.key == prop.key) {
                return Err(GraphError::SchemaViolation(format!(
                    "duplicate property '{}' on block kind '{}'",
                    prop.key, def.kind
                )));
            }
        }
        self.defs.push(def);
        Ok(())
    }

    /// Builder form of [`register`](Self::register) for several kinds.
    pub fn with_defs(mut self, defs: impl IntoIterator<Item = BlockDef>) -> GraphResult<Self> {
        for def in defs {
            self.register(def)?;
        }
        Ok(self)
    }

    /// Definition of `kind`, if registered.
    pub fn lookup(&self, kind: &str) -> Option<&BlockDef> {
        self.defs.iter().find(|def| def.kind == kind)
    }

    /// Like [`lookup`](Self::lookup) but fails with `UnknownBlockType`.
    pub fn get(&self, kind: &str) -> GraphResult<&BlockDef> {
        self.lookup(kind)
            .ok_or_else(|| GraphError::UnknownBlockType(kind.to_string()))
    }

    /// Whether `kind` is registered.
    pub fn is_block_type(&self, kind: &str) -> bool {
        self.lookup(kind).is_some()
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter()
    }

    /// Registered kind names.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|def| def.kind.as_str())
    }
}
