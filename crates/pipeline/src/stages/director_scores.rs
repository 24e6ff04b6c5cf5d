//! Stage that attaches a director score to every movie.
//!
//! The crew lists already sit on the movie table, so the credits come from
//! exploding the `directors` column; only the names need streaming.

use crate::aggregate::{attach_score, score_people, score_table};
use crate::artifacts::{Artifact, ArtifactStore};
use crate::join::key_set;
use crate::stages::{StageContext, read_names, with_null_column};
use crate::traits::Stage;
use anyhow::{Context, Result};
use data_loader::types::columns;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DirectorScoreStage {
    ctx: Arc<StageContext>,
}

impl DirectorScoreStage {
    pub fn new(ctx: Arc<StageContext>) -> Self {
        Self { ctx }
    }
}

impl Stage for DirectorScoreStage {
    fn name(&self) -> &str {
        "DirectorScoreStage"
    }

    fn requires(&self) -> &[Artifact] {
        &[Artifact::Movies]
    }

    fn produces(&self) -> &[Artifact] {
        &[Artifact::MoviesWithDirectorScores, Artifact::DirectorScores]
    }

    fn run(&self, store: &mut ArtifactStore) -> Result<()> {
        let movies = store.get(Artifact::Movies)?.clone();

        let credits = if movies.has_column(columns::DIRECTORS) {
            let mut credits = movies
                .select(&[columns::TCONST, columns::DIRECTORS])?
                .explode(columns::DIRECTORS)?;
            credits.rename_column(columns::DIRECTORS, columns::NCONST)?;
            Some(credits)
        } else {
            None
        };

        let (scored, scores) = match (credits, &self.ctx.files.names) {
            (Some(credits), Some(names_path)) => {
                let ids = key_set(&credits, columns::NCONST)?;
                let names = read_names(names_path, &ids, self.ctx.config.chunk_rows)
                    .context("Failed to read names")?;
                let scores = score_people(&movies, &credits, &names)?;
                info!(
                    "Director scores for {} people over {} movies",
                    scores.by_person.len(),
                    scores.by_title.len()
                );
                let scored = attach_score(&movies, &scores.by_title, columns::TCONST, columns::DIRECTOR_SCORE)?;
                (scored, scores.by_person)
            }
            _ => {
                warn!("No crew lists or names available; director scores left empty");
                (
                    with_null_column(&movies, columns::DIRECTOR_SCORE)?,
                    Default::default(),
                )
            }
        };

        store.put(Artifact::MoviesWithDirectorScores, scored)?;
        store.put(
            Artifact::DirectorScores,
            score_table(&scores, columns::PRIMARY_NAME, columns::DIRECTOR_SCORE)?,
        )?;
        Ok(())
    }
}
