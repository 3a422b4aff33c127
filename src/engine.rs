//! Contract of the external tensor compute engine.
//!
//! The editor does not execute graphs. These types describe what an engine
//! consumes and returns so that a host application can plug one in; turning
//! a [`Project`](crate::project::Project) into an [`EngineGraph`] is left to
//! that host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dense tensor exchanged with the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// Extent of each dimension.
    pub shape: Vec<usize>,
    /// Elements in row-major order.
    pub data: Vec<f64>,
}

impl Tensor {
    /// Number of elements implied by `shape`.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether `data` holds exactly as many elements as `shape` requires.
    pub fn is_consistent(&self) -> bool {
        self.element_count() == self.data.len()
    }
}

/// One operation in an engine graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineNode {
    /// Unique node name.
    pub id: String,
    /// Operation the engine should perform.
    pub op: String,
    /// Names of the values this node reads.
    pub inputs: Vec<String>,
    /// Name of the value this node produces.
    pub output: String,
    /// Operation-specific parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<serde_json::Value>,
}

/// Graph submitted to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineGraph {
    /// Operations in evaluation order.
    pub nodes: Vec<EngineNode>,
    /// Value names to return from a run.
    pub outputs: Vec<String>,
}

/// An engine able to evaluate an [`EngineGraph`].
pub trait ComputeEngine {
    /// Run `graph` against the named `inputs`, returning each requested output.
    fn run(
        &self,
        graph: &EngineGraph,
        inputs: &HashMap<String, Tensor>,
    ) -> anyhow::Result<HashMap<String, Tensor>>;
}
