//! Core trait for pipeline stages.
//!
//! A stage is one step of the batch job: it reads upstream artifacts from the
//! store, derives new tables and writes them back. Stages declare their
//! inputs and outputs so the [`StagePipeline`](crate::StagePipeline) can
//! check the dependency graph before anything runs.

use crate::artifacts::{Artifact, ArtifactStore};
use anyhow::Result;

/// One step of the preparation pipeline.
///
/// ## Design Note
/// - `Send + Sync` lets a built pipeline be shared with worker threads
/// - Stages never hold tables themselves; all data flows through the store
pub trait Stage: Send + Sync {
    /// Returns the name of this stage (for logging/debugging)
    fn name(&self) -> &str;

    /// Artifacts that must exist before this stage runs
    fn requires(&self) -> &[Artifact];

    /// Artifacts this stage writes
    fn produces(&self) -> &[Artifact];

    /// Run the stage against the store.
    ///
    /// # Returns
    /// * `Ok(())` - every artifact in `produces()` has been written
    /// * `Err` - an input could not be read or an output could not be written
    fn run(&self, store: &mut ArtifactStore) -> Result<()>;
}
