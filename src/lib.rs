//! # Block Graph Core Library
//!
//! Data model and editing engine for a visual graph editor in which users
//! drag "block" nodes around a canvas and wire their typed input/output
//! "properties" together. Rendering is left to the host; this crate keeps the
//! graph consistent under every edit and turns pointer gestures into edits.
//!
//! ## Crate Structure
//!
//! - **`arena`**: append-only node table with never-reused [`arena::NodeId`]s.
//! - **`registry`**: catalog of block kinds and their property definitions.
//! - **`project`**: the persisted graph (blocks, properties, links) and its
//!   invariant checker.
//! - **`store`**: the mutation engine. Every edit is an `Action` reduced into
//!   a new immutable `Snapshot`, published to subscribers.
//! - **`interaction`**: pointer-event state machine for block drags, link
//!   drags and unlink clicks.
//! - **`geometry`**: link endpoint projection for the rendering layer.
//! - **`numeric_field`**: commit-on-blur editing of numeric property values.
//! - **`persistence`**: JSON encoding of projects, with validated loading.
//! - **`engine`**: contract types for an external tensor compute engine.
//! - **`config`**: layered configuration (defaults, TOML file, environment).
//! - **`tracing_setup`**: structured logging initialisation.
//! - **`error`**: the crate-wide `GraphError` enum.

pub mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod numeric_field;
pub mod persistence;
pub mod project;
pub mod registry;
pub mod store;
pub mod tracing_setup;

pub use arena::NodeId;
pub use error::{GraphError, GraphResult};
pub use store::Store;
