//! Custom error types for the graph editor core.
//!
//! This module defines `GraphError`, the single error type returned by every
//! fallible operation in the crate. Using the `thiserror` crate, it keeps the
//! failure taxonomy of the editor in one place:
//!
//! - **Invariant violations** (`InvalidBlockId`, `InvalidPropertyId`,
//!   `InvalidNodeType`): an identifier did not resolve to a live node of the
//!   expected variant. The attempted action is aborted and nothing changes.
//! - **Domain validation** (`UnknownBlockType`, `LinkTypeMismatch`,
//!   `ValueTypeMismatch`, `NonFiniteValue`): the request is well-formed but
//!   not allowed by the type registry, the link rules or the file format.
//! - **Drag session misuse** (`NoActiveDrag`, `DragInProgress`).
//! - **I/O and decoding** (`Decode`, `SchemaViolation`, `Io`, `Config`): a
//!   load either fully replaces the project or fails without touching it.
//!
//! By using `#[from]`, `GraphError` can be created from the underlying
//! serde, I/O and figment errors with the `?` operator.

use thiserror::Error;

use crate::arena::NodeId;

/// Convenience alias for results using the crate error type.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Every failure the editor core can report.
#[derive(Error, Debug)]
pub enum GraphError {
    /// No block definition for this kind.
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    /// Id is not a live block.
    #[error("Invalid block id: {0}")]
    InvalidBlockId(NodeId),

    /// Id is not a live property.
    #[error("Invalid property id: {0}")]
    InvalidPropertyId(NodeId),

    /// An internal reference points at the wrong kind of node.
    #[error("Node {id} is not a {expected}")]
    InvalidNodeType {
        /// Offending node.
        id: NodeId,
        /// What the reference should have resolved to.
        expected: &'static str,
    },

    /// Drag update, commit or cancel without a session.
    #[error("No drag session is active")]
    NoActiveDrag,

    /// Drag start while another block is being dragged.
    #[error("A drag session is already active on block {0}")]
    DragInProgress(NodeId),

    /// The link rules forbid this link.
    #[error("Cannot link property {from} to property {to}: {reason}")]
    LinkTypeMismatch {
        /// Source (output) property.
        from: NodeId,
        /// Sink (input) property.
        to: NodeId,
        /// Which rule failed.
        reason: String,
    },

    /// A value of the wrong kind for the property.
    #[error("Property {id} holds a {expected} value, got {found}")]
    ValueTypeMismatch {
        /// Target property.
        id: NodeId,
        /// Kind the property holds.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },

    /// NaN or infinity where the file format needs a finite number.
    #[error("Invalid {what}: {value} is not a finite number")]
    NonFiniteValue {
        /// Which quantity was rejected.
        what: &'static str,
        /// The rejected number.
        value: f64,
    },

    /// Bytes are not a well-formed project document.
    #[error("Failed to decode project: {0}")]
    Decode(#[from] serde_json::Error),

    /// A decoded project breaks a structural invariant.
    #[error("Project violates schema: {0}")]
    SchemaViolation(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl GraphError {
    /// Whether the error signals an internal consistency failure rather than
    /// a rejected request or an I/O problem.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            GraphError::InvalidBlockId(_)
                | GraphError::InvalidPropertyId(_)
                | GraphError::InvalidNodeType { .. }
        )
    }
}
