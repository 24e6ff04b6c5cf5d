//! Pipeline for joining, scoring and encoding the movie dataset.
//!
//! This crate provides:
//! - Hash joins between tables and streamed files (`join`)
//! - Best-row-per-key reduction of regional titles (`dedup`)
//! - Grouped means and director/actor scoring (`aggregate`)
//! - Frozen categorical vocabularies with explicit fallbacks (`encoder`)
//! - The canonical feature contract shared with serving (`features`)
//! - Stage trait, artifact store and StagePipeline for the batch job
//!
//! ## Architecture
//! The preparation job runs in stages:
//! 1. MovieStage joins basics, ratings, crew and regional languages
//! 2. DirectorScoreStage attaches `director_score`
//! 3. ActorScoreStage attaches `actor_score`
//!
//! Each stage writes a CSV superset of its input table, which training then
//! turns into encoded feature vectors.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{ArtifactStore, PipelineConfig, StageContext, standard_pipeline};
//! use data_loader::ImdbFiles;
//!
//! let config = PipelineConfig::load(Path::new("marquee.toml"))?;
//! let files = ImdbFiles::locate(&config.data_dir)?;
//! let mut store = ArtifactStore::new(&config.out_dir);
//!
//! let ctx = StageContext::new(config, files);
//! standard_pipeline(&ctx).run(&mut store)?;
//! ```

pub mod aggregate;
pub mod artifacts;
pub mod config;
pub mod dedup;
pub mod encoder;
pub mod features;
pub mod join;
pub mod stage_pipeline;
pub mod stages;
pub mod traits;

// Re-export main types
pub use aggregate::{PersonScores, ScoreMap, ScoreSummary, aggregate_mean, attach_score, impute, score_people};
pub use artifacts::{Artifact, ArtifactStore};
pub use config::{ImputeStrategy, PipelineConfig};
pub use dedup::{AkaRank, KeyedReducer, LanguageSource};
pub use encoder::{EncodeError, Encoded, FallbackBucket, FallbackPolicy, UNKNOWN_CATEGORY, Vocabulary};
pub use features::{FEATURE_COUNT, FEATURE_ORDER, FEATURE_SCHEMA_VERSION, FeatureSpace, FeatureVector, TrainingSet};
pub use join::{JoinKey, JoinKind, inner_join, left_join, stream_join};
pub use stage_pipeline::{StagePipeline, StageRun};
pub use stages::{StageContext, standard_pipeline};
pub use traits::Stage;
