//! JSON serialization for saving and loading projects.
//!
//! The on-disk form is the serde layout of [`Project`] verbatim. Decoding
//! only checks that the bytes are well-formed JSON of the right shape;
//! [`load`] additionally runs [`validate_project`] so that a file which
//! decodes but breaks the project invariants is rejected with
//! `SchemaViolation` instead of reaching the store.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use crate::config::LinkRules;
use crate::error::GraphResult;
use crate::project::{validate_project, Project};
use crate::registry::Registry;
use crate::store::Store;

/// File extension for saved projects.
pub const PROJECT_FILE_EXTENSION: &str = "blockgraph";

/// Encode a project as pretty-printed JSON.
pub fn dump(project: &Project) -> GraphResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(project)?)
}

/// Decode a project without checking its invariants.
pub fn decode(bytes: &[u8]) -> GraphResult<Project> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a project and check every invariant.
pub fn load(bytes: &[u8], registry: &Registry, rules: &LinkRules) -> GraphResult<Project> {
    let project = decode(bytes)?;
    validate_project(&project, registry, rules)?;
    Ok(project)
}

/// Save project to JSON file.
pub fn save_to_path(path: &Path, project: &Project) -> GraphResult<()> {
    let bytes = dump(project)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), blocks = project.block_order.len(), "Saved project");
    Ok(())
}

/// Load project from JSON file.
pub fn load_from_path(path: &Path, registry: &Registry, rules: &LinkRules) -> GraphResult<Project> {
    let bytes = std::fs::read(path)?;
    let project = load(&bytes, registry, rules)?;
    info!(path = %path.display(), blocks = project.block_order.len(), "Loaded project");
    Ok(project)
}

/// Read `reader` to the end, then load the bytes into `store`.
///
/// The store is only touched once the whole stream has arrived and decoded;
/// dropping the future before that leaves it unchanged.
pub async fn load_into<R>(store: &mut Store, mut reader: R) -> GraphResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    store.load_project(&bytes)?;
    info!(bytes = bytes.len(), blocks = store.project().block_order.len(), "Loaded project from stream");
    Ok(())
}
