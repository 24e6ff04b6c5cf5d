//! Stage implementations for the preparation pipeline.
//!
//! Movies are prepared first; director and actor scores are then attached
//! one column at a time, each stage writing a superset of its input table.

pub mod actor_scores;
pub mod director_scores;
pub mod movies;

// Re-export for convenience
pub use actor_scores::ActorScoreStage;
pub use director_scores::DirectorScoreStage;
pub use movies::MovieStage;

use crate::config::PipelineConfig;
use crate::stage_pipeline::StagePipeline;
use data_loader::parser::parse_person;
use data_loader::types::columns;
use data_loader::{ChunkedTableReader, Fields, ImdbFiles, ReadOptions, Result, Table};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Inputs shared by every stage of one run
#[derive(Debug, Clone)]
pub struct StageContext {
    pub config: PipelineConfig,
    pub files: ImdbFiles,
}

impl StageContext {
    pub fn new(config: PipelineConfig, files: ImdbFiles) -> Arc<Self> {
        Arc::new(Self { config, files })
    }
}

/// Movies, then director scores, then actor scores
pub fn standard_pipeline(ctx: &Arc<StageContext>) -> StagePipeline {
    StagePipeline::new()
        .add_stage(MovieStage::new(ctx.clone()))
        .add_stage(DirectorScoreStage::new(ctx.clone()))
        .add_stage(ActorScoreStage::new(ctx.clone()))
}

/// Stream `name.basics`, keeping only the people in `ids`
pub(crate) fn read_names(path: &Path, ids: &HashSet<String>, chunk_rows: usize) -> Result<Table> {
    if ids.is_empty() {
        debug!("No credited people; skipping {}", path.display());
        return Ok(Table::new([columns::NCONST, columns::PRIMARY_NAME]));
    }
    let options = ReadOptions::tsv([columns::NCONST, columns::PRIMARY_NAME]).with_chunk_rows(chunk_rows);
    ChunkedTableReader::open(path, options, |row| {
        row.field(columns::NCONST).is_some_and(|id| ids.contains(id)) && parse_person(row).is_ok()
    })?
    .collect_table()
}

/// A copy of `movies` with `column` set to null on every row
pub(crate) fn with_null_column(movies: &Table, column: &str) -> Result<Table> {
    let mut out = movies.clone();
    out.set_column(column, vec![None; movies.len()])?;
    Ok(out)
}
