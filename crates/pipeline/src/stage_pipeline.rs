//! The StagePipeline orchestrates the preparation stages.
//!
//! Stages are chained with the builder pattern and run in insertion order.
//! Before the first stage starts, every declared input is checked against
//! the outputs of earlier stages and the artifacts already on disk.

use crate::artifacts::{Artifact, ArtifactStore};
use crate::traits::Stage;
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing;

/// Chains stages into a dependency-checked batch job.
///
/// ## Usage
/// ```ignore
/// let pipeline = StagePipeline::new()
///     .add_stage(MovieStage::new(ctx.clone()))
///     .add_stage(DirectorScoreStage::new(ctx.clone()))
///     .add_stage(ActorScoreStage::new(ctx.clone()));
///
/// let runs = pipeline.run(&mut store)?;
/// ```
pub struct StagePipeline {
    stages: Vec<Box<dyn Stage>>,
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageRun {
    pub stage: String,
    pub elapsed: Duration,
    /// Row count of each produced artifact
    pub outputs: Vec<(Artifact, usize)>,
}

impl StagePipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage to the pipeline (builder pattern).
    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check that every required artifact is produced upstream or on disk
    pub fn validate(&self, store: &ArtifactStore) -> Result<()> {
        let mut produced: BTreeSet<Artifact> = BTreeSet::new();
        for stage in &self.stages {
            for required in stage.requires() {
                if !produced.contains(required) && !store.available(*required) {
                    bail!(
                        "Stage '{}' requires {} but no earlier stage produces it and it is not in the output directory",
                        stage.name(),
                        required
                    );
                }
            }
            produced.extend(stage.produces().iter().copied());
        }
        Ok(())
    }

    /// Run all stages in order.
    ///
    /// ## Algorithm
    /// 1. Validate the dependency graph
    /// 2. For each stage: log, run, confirm its outputs exist, record row counts
    pub fn run(&self, store: &mut ArtifactStore) -> Result<Vec<StageRun>> {
        self.validate(store)?;

        let mut runs = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            tracing::info!("Running stage: {}", stage.name());
            let start = Instant::now();
            stage
                .run(store)
                .with_context(|| format!("Stage '{}' failed", stage.name()))?;

            let mut outputs = Vec::new();
            for artifact in stage.produces() {
                let rows = store
                    .get(*artifact)
                    .with_context(|| format!("Stage '{}' did not produce {}", stage.name(), artifact))?
                    .len();
                outputs.push((*artifact, rows));
            }
            let elapsed = start.elapsed();
            tracing::info!(
                "Stage finished: {} in {:.2?} ({:?})",
                stage.name(),
                elapsed,
                outputs
            );
            runs.push(StageRun {
                stage: stage.name().to_string(),
                elapsed,
                outputs,
            });
        }
        Ok(runs)
    }
}

impl Default for StagePipeline {
    fn default() -> Self {
        Self::new()
    }
}
